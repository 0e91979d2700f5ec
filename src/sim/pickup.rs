//! Pick-ups collected by the player on contact

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use super::entity::{Entity, EntityType, IdSource, Kind};
use super::player::Player;
use super::strategy::{BehaviorStrategy, CollisionStrategy};
use crate::consts::PICK_UP_ROTATION;

/// Name of a pick-up category, used as the player's counter key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickUpKind(&'static str);

impl PickUpKind {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PickUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// What happens when the player collects a pick-up
pub type PickUpEffect = Rc<dyn Fn(&PickUp, &Player)>;

pub(crate) struct PickUpData {
    kind: PickUpKind,
    life_timer: Cell<i32>,
    effect: Option<PickUpEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PickUp(Entity);

impl PickUp {
    /// A pick-up that adds one to the player's count for `kind`
    pub fn new(ids: &IdSource, kind: PickUpKind) -> Self {
        Self::build(ids, kind, None)
    }

    /// A pick-up with a custom effect instead of the counter increment
    pub fn with_effect(
        ids: &IdSource,
        kind: PickUpKind,
        effect: impl Fn(&PickUp, &Player) + 'static,
    ) -> Self {
        Self::build(ids, kind, Some(Rc::new(effect)))
    }

    fn build(ids: &IdSource, kind: PickUpKind, effect: Option<PickUpEffect>) -> Self {
        let data = PickUpData {
            kind,
            life_timer: Cell::new(-1),
            effect,
        };
        let entity = Entity::with_kind(ids, Kind::PickUp(data));
        entity.set_rotation(PICK_UP_ROTATION);
        entity.add_collision_strategy(PlayerPickUp);
        entity.add_behavior_strategy(PickUpLifeTimer);
        Self(entity)
    }

    pub fn into_entity(self) -> Entity {
        self.0
    }

    fn data(&self) -> &PickUpData {
        match self.0.kind() {
            Kind::PickUp(data) => data,
            _ => unreachable!("pick-up view over a non-pick-up entity"),
        }
    }

    pub fn kind(&self) -> PickUpKind {
        self.data().kind
    }

    pub fn life_timer(&self) -> i32 {
        self.data().life_timer.get()
    }

    /// Negative keeps the pick-up around forever
    pub fn set_life_timer(&self, ticks: i32) {
        self.data().life_timer.set(ticks);
    }

    /// Apply the effect of this pick-up to `player`
    pub fn apply_to(&self, player: &Player) {
        match &self.data().effect {
            Some(effect) => effect(self, player),
            None => player.add_pick_up(self.kind()),
        }
    }
}

impl EntityType for PickUp {
    fn from_entity(entity: &Entity) -> Option<Self> {
        matches!(entity.kind(), Kind::PickUp(_)).then(|| Self(entity.clone()))
    }

    fn as_entity(&self) -> &Entity {
        &self.0
    }
}

impl fmt::Display for PickUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Deref for PickUp {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.0
    }
}

/// Collected by the player: apply the effect, then dispose
#[derive(Debug, Default, Clone, Copy)]
pub struct PlayerPickUp;

impl CollisionStrategy for PlayerPickUp {
    fn on_collision_with(&self, host: &Entity, other: &Entity) {
        let (Some(pick_up), Some(player)) = (PickUp::from_entity(host), Player::from_entity(other))
        else {
            return;
        };
        if pick_up.is_disposed() || player.is_disposed() {
            return;
        }
        log::debug!("{} collected {} ({})", player.as_entity(), pick_up.as_entity(), pick_up.kind());
        pick_up.apply_to(&player);
        pick_up.dispose();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PickUpLifeTimer;

impl BehaviorStrategy for PickUpLifeTimer {
    fn act(&self, host: &Entity) {
        let Some(pick_up) = PickUp::from_entity(host) else {
            return;
        };
        let timer = pick_up.life_timer();
        if timer > 0 {
            pick_up.set_life_timer(timer - 1);
        } else if timer == 0 {
            pick_up.dispose();
        }
    }
}
