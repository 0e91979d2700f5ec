//! The player ship
//!
//! A [`Player`] is a target that also owns a laser chain, pick-up counters and
//! a score. Its movement and firing are default behaviour strategies driven by
//! the game's pressed keys.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use super::actions::{MovePlayerAction, ShootLaserAction};
use super::bullet::Bullet;
use super::entity::{Entity, EntityType, IdSource, Kind};
use super::group::Group;
use super::handle::Handle;
use super::laser::{Laser, LaserChain, LaserUpgrade, Upgrade};
use super::pickup::PickUpKind;
use super::target::{Target, TargetData};
use crate::error::CoreError;
use crate::settings::GameConfig;

/// Player notifications. All methods default to no-ops.
pub trait PlayerObserver {
    fn on_laser_upgrade_added(&self, _player: &Player, _upgrade: &Upgrade) {}
    fn on_laser_upgrade_removed(&self, _player: &Player, _upgrade: &Upgrade) {}
    /// `delta` is positive for added and negative for removed pick-ups
    fn on_pick_up_count_changed(&self, _player: &Player, _kind: PickUpKind, _delta: i64) {}
    fn on_score_changed(&self, _player: &Player, _delta: i64) {}
    fn on_player_hit_target(&self, _player: &Player, _target: &Target) {}
    fn on_player_killed_target(&self, _player: &Player, _target: &Target) {}
    fn on_laser_fired(&self, _player: &Player, _bullets: &[Bullet]) {}
}

pub type PlayerObserverRef = Handle<dyn PlayerObserver>;

pub(crate) struct PlayerData {
    pub(crate) target: TargetData,
    pick_ups: RefCell<HashMap<PickUpKind, u32>>,
    laser: RefCell<Laser>,
    score: Cell<i64>,
    has_move_input: Cell<bool>,
    observers: Group<PlayerObserverRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Player(Target);

impl Player {
    /// A player configured from `config`, with its movement and firing
    /// behaviours installed
    pub fn new(ids: &IdSource, config: &GameConfig) -> Result<Self, CoreError> {
        let data = PlayerData {
            target: TargetData::new(),
            pick_ups: RefCell::new(HashMap::new()),
            laser: RefCell::new(Laser::new(config.laser)),
            score: Cell::new(0),
            has_move_input: Cell::new(false),
            observers: Group::new(),
        };
        let player = Self(Target::from_kind(ids, Kind::Player(Box::new(data))));

        let settings = &config.player;
        player.set_size(settings.size)?;
        player.set_position(settings.start_x, settings.start_y);
        player.set_max_hitpoints(settings.max_hitpoints)?;
        player.set_hitpoints(settings.hitpoints);

        player.add_behavior_strategy(ShootLaserAction::new(
            config.controls.shoot,
            settings.score_per_kill,
        ));
        player.add_behavior_strategy(MovePlayerAction::new(settings, &config.controls));
        Ok(player)
    }

    pub fn as_target(&self) -> &Target {
        &self.0
    }

    pub fn into_entity(self) -> Entity {
        self.0.into_entity()
    }

    fn data(&self) -> &PlayerData {
        match self.0.as_entity().kind() {
            Kind::Player(data) => data,
            _ => unreachable!("player view over a non-player entity"),
        }
    }

    fn notify(&self, event: impl Fn(&dyn PlayerObserver, &Player)) {
        self.data().observers.for_each(|observer| event(&**observer, self));
    }

    // --- Pick-ups ---

    pub fn pick_up_count(&self, kind: PickUpKind) -> u32 {
        self.data().pick_ups.borrow().get(&kind).copied().unwrap_or(0)
    }

    pub fn add_pick_up(&self, kind: PickUpKind) {
        self.change_pick_ups(kind, 1);
    }

    pub fn add_pick_ups(&self, kind: PickUpKind, times: u32) -> Result<(), CoreError> {
        if times < 1 {
            return Err(CoreError::InvalidPickUpCount { times });
        }
        self.change_pick_ups(kind, i64::from(times));
        Ok(())
    }

    pub fn remove_pick_up(&self, kind: PickUpKind) -> Result<(), CoreError> {
        self.remove_pick_ups(kind, 1)
    }

    pub fn remove_pick_ups(&self, kind: PickUpKind, times: u32) -> Result<(), CoreError> {
        if times < 1 {
            return Err(CoreError::InvalidPickUpCount { times });
        }
        let owned = self.pick_up_count(kind);
        if owned < times {
            return Err(CoreError::NotEnoughPickUps {
                kind: kind.name(),
                owned,
                requested: times,
            });
        }
        self.change_pick_ups(kind, -i64::from(times));
        Ok(())
    }

    fn change_pick_ups(&self, kind: PickUpKind, delta: i64) {
        {
            let mut pick_ups = self.data().pick_ups.borrow_mut();
            let count = pick_ups.entry(kind).or_insert(0);
            let updated = i64::from(*count) + delta;
            *count = u32::try_from(updated.max(0)).unwrap_or(u32::MAX);
            if *count == 0 {
                pick_ups.remove(&kind);
            }
        }
        self.notify(|observer, player| observer.on_pick_up_count_changed(player, kind, delta));
    }

    // --- Laser ---

    /// Read-only snapshot of the current laser chain
    pub fn laser(&self) -> LaserChain {
        self.data().laser.borrow().snapshot()
    }

    pub fn has_laser_upgrade(&self, upgrade: &Upgrade) -> bool {
        self.data().laser.borrow().contains(upgrade)
    }

    pub fn has_laser_upgrade_of<T: LaserUpgrade>(&self) -> bool {
        self.data().laser.borrow().contains_type::<T>()
    }

    pub fn add_laser_upgrade(&self, upgrade: Upgrade) -> Result<(), CoreError> {
        self.data().laser.borrow_mut().push(upgrade.clone())?;
        log::debug!("{} gained a laser upgrade", self.as_entity());
        self.notify(|observer, player| observer.on_laser_upgrade_added(player, &upgrade));
        Ok(())
    }

    pub fn remove_laser_upgrade(&self, upgrade: &Upgrade) -> Result<(), CoreError> {
        self.data().laser.borrow_mut().remove(upgrade)?;
        self.notify(|observer, player| observer.on_laser_upgrade_removed(player, upgrade));
        Ok(())
    }

    // --- Score and movement ---

    pub fn score(&self) -> i64 {
        self.data().score.get()
    }

    pub fn add_score(&self, delta: i64) {
        if delta == 0 {
            return;
        }
        let data = self.data();
        data.score.set(data.score.get().saturating_add(delta));
        self.notify(|observer, player| observer.on_score_changed(player, delta));
    }

    /// Whether the player accelerated during the last tick
    pub fn has_move_input(&self) -> bool {
        self.data().has_move_input.get()
    }

    pub fn set_has_move_input(&self, value: bool) {
        self.data().has_move_input.set(value);
    }

    // --- Observers ---

    pub fn add_player_observer(&self, observer: impl PlayerObserver + 'static) -> PlayerObserverRef {
        let observer: Rc<dyn PlayerObserver> = Rc::new(observer);
        let handle = Handle::from_rc(observer);
        self.data().observers.add(handle.clone());
        handle
    }

    pub fn install_player_observer(&self, observer: PlayerObserverRef) {
        self.data().observers.add(observer);
    }

    pub fn remove_player_observer(&self, observer: &PlayerObserverRef) {
        self.data().observers.remove(observer);
    }

    pub fn fire_hit_target(&self, target: &Target) {
        self.notify(|observer, player| observer.on_player_hit_target(player, target));
    }

    pub fn fire_killed_target(&self, target: &Target) {
        log::debug!("{} killed {}", self.as_entity(), target.as_entity());
        self.notify(|observer, player| observer.on_player_killed_target(player, target));
    }

    pub fn fire_laser_fired(&self, bullets: &[Bullet]) {
        self.notify(|observer, player| observer.on_laser_fired(player, bullets));
    }
}

impl EntityType for Player {
    fn from_entity(entity: &Entity) -> Option<Self> {
        match entity.kind() {
            Kind::Player(_) => Target::from_entity(entity).map(Self),
            _ => None,
        }
    }

    fn as_entity(&self) -> &Entity {
        self.0.as_entity()
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.as_entity(), f)
    }
}

impl Deref for Player {
    type Target = Target;

    fn deref(&self) -> &Target {
        &self.0
    }
}
