//! Bullets: projectiles fired by a source entity
//!
//! A new bullet carries three default strategies: hitting targets it collides
//! with, counting down its life timer, and dealing damage on hit. Weapons
//! install further hit strategies (self-destruct, score keeping).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use super::entity::{Entity, EntityType, Kind};
use super::group::Group;
use super::handle::Handle;
use super::strategy::{BehaviorStrategy, CollisionStrategy, HitRef, HitStrategy};
use super::target::Target;
use crate::polar_offset;

/// Predicate restricting which targets a bullet may hit
pub type TargetFilter = Rc<dyn Fn(&Target) -> bool>;

pub(crate) struct BulletData {
    source: Entity,
    damage: Cell<i32>,
    life_timer: Cell<i32>,
    armed: Cell<bool>,
    only_hit_alive: Cell<bool>,
    target_filter: RefCell<Option<TargetFilter>>,
    hit_strategies: Group<HitRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bullet(Entity);

impl Bullet {
    /// Spawn a bullet in front of `source`, moving and facing like it
    pub fn new(source: &Entity) -> Self {
        let data = BulletData {
            source: source.clone(),
            damage: Cell::new(1),
            life_timer: Cell::new(-1),
            armed: Cell::new(true),
            only_hit_alive: Cell::new(true),
            target_filter: RefCell::new(None),
            hit_strategies: Group::new(),
        };
        let entity = Entity::with_kind(source.id_source(), Kind::Bullet(data));
        entity.add_collision_strategy(HitOnCollision);
        entity.add_behavior_strategy(BulletLifeTimer);

        let bullet = Self(entity);
        bullet.add_hit_strategy(DamageOnHit);

        let offset = polar_offset(source.rotation(), f64::from(source.size()));
        bullet.set_position_vec(source.position() + offset);
        bullet.set_velocity_of(source);
        bullet.set_rotation_of(source);
        bullet
    }

    pub fn into_entity(self) -> Entity {
        self.0
    }

    fn data(&self) -> &BulletData {
        match self.0.kind() {
            Kind::Bullet(data) => data,
            _ => unreachable!("bullet view over a non-bullet entity"),
        }
    }

    /// The entity that fired this bullet
    pub fn source(&self) -> &Entity {
        &self.data().source
    }

    pub fn damage(&self) -> i32 {
        self.data().damage.get()
    }

    /// Negative damage heals
    pub fn set_damage(&self, damage: i32) {
        self.data().damage.set(damage);
    }

    pub fn life_timer(&self) -> i32 {
        self.data().life_timer.get()
    }

    /// Negative disables the timer; zero disposes on the next tick
    pub fn set_life_timer(&self, ticks: i32) {
        self.data().life_timer.set(ticks);
    }

    pub fn is_armed(&self) -> bool {
        self.data().armed.get()
    }

    pub fn set_armed(&self, armed: bool) {
        self.data().armed.set(armed);
    }

    pub fn is_only_hit_alive(&self) -> bool {
        self.data().only_hit_alive.get()
    }

    pub fn set_only_hit_alive(&self, only_hit_alive: bool) {
        self.data().only_hit_alive.set(only_hit_alive);
    }

    pub fn set_target_filter(&self, filter: impl Fn(&Target) -> bool + 'static) {
        *self.data().target_filter.borrow_mut() = Some(Rc::new(filter));
    }

    pub fn clear_target_filter(&self) {
        *self.data().target_filter.borrow_mut() = None;
    }

    /// Whether the target filter (if any) lets `target` be hit
    pub fn accepts(&self, target: &Target) -> bool {
        let filter = self.data().target_filter.borrow().clone();
        filter.is_none_or(|filter| filter(target))
    }

    pub fn add_hit_strategy(&self, strategy: impl HitStrategy) -> HitRef {
        let strategy: Rc<dyn HitStrategy> = Rc::new(strategy);
        let handle = Handle::from_rc(strategy);
        self.data().hit_strategies.add(handle.clone());
        handle
    }

    pub fn install_hit_strategy(&self, strategy: HitRef) {
        self.data().hit_strategies.add(strategy);
    }

    pub fn remove_hit_strategy(&self, strategy: &HitRef) {
        self.data().hit_strategies.remove(strategy);
    }

    pub fn has_hit_strategy(&self, strategy: &HitRef) -> bool {
        self.data().hit_strategies.contains(strategy)
    }

    /// First installed hit strategy of type `T`
    pub fn hit_strategy<T: HitStrategy>(&self) -> Option<Rc<T>> {
        self.data()
            .hit_strategies
            .get_first_match(|s| s.is::<T>())
            .and_then(|s| s.downcast::<T>())
    }

    /// Run every hit strategy against `target`
    pub fn fire_on_hit(&self, target: &Target) {
        self.data()
            .hit_strategies
            .for_each(|strategy| strategy.on_hit(self, target));
    }
}

impl EntityType for Bullet {
    fn from_entity(entity: &Entity) -> Option<Self> {
        matches!(entity.kind(), Kind::Bullet(_)).then(|| Self(entity.clone()))
    }

    fn as_entity(&self) -> &Entity {
        &self.0
    }
}

impl fmt::Display for Bullet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Deref for Bullet {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.0
    }
}

/// Hit an overlapping target: armed, not the source, alive if required,
/// not disposed and accepted by the target filter.
#[derive(Debug, Default, Clone, Copy)]
pub struct HitOnCollision;

impl CollisionStrategy for HitOnCollision {
    fn on_collision_with(&self, host: &Entity, other: &Entity) {
        let Some(bullet) = Bullet::from_entity(host) else {
            return;
        };
        if !bullet.is_armed() || other == bullet.source() {
            return;
        }
        let Some(target) = Target::from_entity(other) else {
            return;
        };
        if (bullet.is_only_hit_alive() && target.is_dead()) || target.is_disposed() {
            return;
        }
        if bullet.accepts(&target) {
            bullet.fire_on_hit(&target);
        }
    }
}

/// Counts the life timer down and disposes the bullet at zero
#[derive(Debug, Default, Clone, Copy)]
pub struct BulletLifeTimer;

impl BehaviorStrategy for BulletLifeTimer {
    fn act(&self, host: &Entity) {
        let Some(bullet) = Bullet::from_entity(host) else {
            return;
        };
        let timer = bullet.life_timer();
        if timer > 0 {
            bullet.set_life_timer(timer - 1);
        } else if timer == 0 {
            bullet.dispose();
        }
    }
}

/// Subtracts the bullet's damage from the target's hitpoints
#[derive(Debug, Default, Clone, Copy)]
pub struct DamageOnHit;

impl HitStrategy for DamageOnHit {
    fn on_hit(&self, bullet: &Bullet, target: &Target) {
        target.add_hitpoints(bullet.damage().saturating_neg());
    }
}

/// Disposes the bullet after its first hit
#[derive(Debug, Default, Clone, Copy)]
pub struct SelfDestructOnHit;

impl HitStrategy for SelfDestructOnHit {
    fn on_hit(&self, bullet: &Bullet, _target: &Target) {
        bullet.dispose();
    }
}
