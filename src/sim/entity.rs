//! Simulation entities
//!
//! An [`Entity`] is a shared handle to a positioned, rotatable, sized object
//! with a unique identity. Cloning the handle does not copy the entity; two
//! handles are equal when they point at the same entity.
//!
//! Specialised entities (targets, bullets, pick-ups, the player) carry their
//! extra state in the entity's [`Kind`] and are accessed through typed views
//! such as [`Target`](super::Target) that implement [`EntityType`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::bullet::BulletData;
use super::game::{Game, GameInner};
use super::group::Group;
use super::handle::Handle;
use super::pickup::PickUpData;
use super::player::PlayerData;
use super::strategy::{BehaviorRef, BehaviorStrategy, CollisionRef, CollisionStrategy};
use super::target::TargetData;
use crate::consts::DEFAULT_ENTITY_SIZE;
use crate::error::CoreError;
use crate::{angle_delta, bearing_degrees, normalize_degrees, polar_offset};

/// Unique entity identity within one [`IdSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared id registry. Ids are handed out once and never reused.
#[derive(Debug, Clone, Default)]
pub struct IdSource {
    next: Rc<Cell<u64>>,
}

impl IdSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> EntityId {
        let id = self.next.get();
        self.next.set(id + 1);
        EntityId(id)
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u64 {
        self.next.get()
    }

    /// Whether both handles draw from the same counter
    pub fn shares_counter(&self, other: &IdSource) -> bool {
        Rc::ptr_eq(&self.next, &other.next)
    }
}

/// Notifications about an entity's state. All methods default to no-ops.
pub trait EntityObserver {
    fn on_position_changed(&self, _host: &Entity) {}
    fn on_size_changed(&self, _host: &Entity) {}
    fn on_rotation_changed(&self, _host: &Entity) {}
    fn on_velocity_changed(&self, _host: &Entity) {}
    fn on_added_to_game(&self, _game: &Game, _host: &Entity) {}
    fn on_removed_from_game(&self, _game: &Game, _host: &Entity) {}
}

pub type EntityObserverRef = Handle<dyn EntityObserver>;

/// Specialisation data of an entity
pub(crate) enum Kind {
    Plain,
    Target(TargetData),
    Player(Box<PlayerData>),
    Bullet(BulletData),
    PickUp(PickUpData),
}

impl Kind {
    fn name(&self) -> &'static str {
        match self {
            Kind::Plain => "Entity",
            Kind::Target(_) => "Target",
            Kind::Player(_) => "Player",
            Kind::Bullet(_) => "Bullet",
            Kind::PickUp(_) => "PickUp",
        }
    }
}

pub(crate) struct EntityData {
    id: EntityId,
    ids: IdSource,
    position: Cell<DVec2>,
    velocity: Cell<DVec2>,
    rotation: Cell<f64>,
    size: Cell<u32>,
    disposed: Cell<bool>,
    game: RefCell<Weak<GameInner>>,
    observers: Group<EntityObserverRef>,
    behaviors: Group<BehaviorRef>,
    collisions: Group<CollisionRef>,
    kind: Kind,
}

#[derive(Clone)]
pub struct Entity(Rc<EntityData>);

/// Typed view over an entity
pub trait EntityType: Clone + Eq + Hash + 'static {
    /// The view for `entity`, if it is of this type
    fn from_entity(entity: &Entity) -> Option<Self>;

    fn as_entity(&self) -> &Entity;
}

impl EntityType for Entity {
    fn from_entity(entity: &Entity) -> Option<Self> {
        Some(entity.clone())
    }

    fn as_entity(&self) -> &Entity {
        self
    }
}

impl Entity {
    /// Create a plain entity at the origin with the default size
    pub fn new(ids: &IdSource) -> Self {
        Self::with_kind(ids, Kind::Plain)
    }

    pub(crate) fn with_kind(ids: &IdSource, kind: Kind) -> Self {
        Self(Rc::new(EntityData {
            id: ids.next_id(),
            ids: ids.clone(),
            position: Cell::new(DVec2::ZERO),
            velocity: Cell::new(DVec2::ZERO),
            rotation: Cell::new(0.0),
            size: Cell::new(DEFAULT_ENTITY_SIZE),
            disposed: Cell::new(false),
            game: RefCell::new(Weak::new()),
            observers: Group::new(),
            behaviors: Group::new(),
            collisions: Group::new(),
            kind,
        }))
    }

    pub(crate) fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn id(&self) -> EntityId {
        self.0.id
    }

    /// Registry this entity's id was drawn from
    pub fn id_source(&self) -> &IdSource {
        &self.0.ids
    }

    /// Short type name, e.g. `Bullet`
    pub fn kind_name(&self) -> &'static str {
        self.0.kind.name()
    }

    fn notify(&self, event: impl Fn(&dyn EntityObserver, &Entity)) {
        self.0.observers.for_each(|observer| event(&**observer, self));
    }

    // --- Position ---

    pub fn position(&self) -> DVec2 {
        self.0.position.get()
    }

    pub fn x(&self) -> f64 {
        self.position().x
    }

    pub fn y(&self) -> f64 {
        self.position().y
    }

    pub fn set_position(&self, x: f64, y: f64) {
        self.set_position_vec(DVec2::new(x, y));
    }

    pub fn set_position_vec(&self, position: DVec2) {
        if self.0.position.get() == position {
            return;
        }
        self.0.position.set(position);
        self.notify(|observer, host| observer.on_position_changed(host));
    }

    pub fn set_position_of(&self, other: &Entity) {
        self.set_position_vec(other.position());
    }

    // --- Velocity ---

    pub fn velocity(&self) -> DVec2 {
        self.0.velocity.get()
    }

    pub fn velocity_x(&self) -> f64 {
        self.velocity().x
    }

    pub fn velocity_y(&self) -> f64 {
        self.velocity().y
    }

    pub fn set_velocity(&self, x: f64, y: f64) {
        self.set_velocity_vec(DVec2::new(x, y));
    }

    pub fn set_velocity_vec(&self, velocity: DVec2) {
        if self.0.velocity.get() == velocity {
            return;
        }
        self.0.velocity.set(velocity);
        self.notify(|observer, host| observer.on_velocity_changed(host));
    }

    pub fn set_velocity_of(&self, other: &Entity) {
        self.set_velocity_vec(other.velocity());
    }

    pub fn add_velocity(&self, x: f64, y: f64) {
        self.set_velocity_vec(self.velocity() + DVec2::new(x, y));
    }

    pub fn multiply_velocity(&self, factor: f64) {
        self.set_velocity_vec(self.velocity() * factor);
    }

    /// Length of the velocity vector
    pub fn speed(&self) -> f64 {
        self.velocity().length()
    }

    pub fn is_moving(&self) -> bool {
        self.velocity() != DVec2::ZERO
    }

    /// Bearing of the velocity in degrees, `None` when standing still
    pub fn move_direction(&self) -> Option<f64> {
        self.is_moving()
            .then(|| bearing_degrees(DVec2::ZERO, self.velocity()))
    }

    pub fn set_speed_directional(&self, angle: f64, speed: f64) {
        self.set_velocity_vec(polar_offset(angle, speed));
    }

    pub fn set_speed_forward(&self, speed: f64) {
        self.set_speed_directional(self.rotation(), speed);
    }

    pub fn set_speed_backwards(&self, speed: f64) {
        self.set_speed_directional(self.rotation() + 180.0, speed);
    }

    pub fn add_speed_directional(&self, angle: f64, speed: f64) {
        self.set_velocity_vec(self.velocity() + polar_offset(angle, speed));
    }

    pub fn add_speed_forward(&self, speed: f64) {
        self.add_speed_directional(self.rotation(), speed);
    }

    pub fn add_speed_backwards(&self, speed: f64) {
        self.add_speed_directional(self.rotation() + 180.0, speed);
    }

    // --- Rotation ---

    /// Rotation in degrees, always in [0, 360)
    pub fn rotation(&self) -> f64 {
        self.0.rotation.get()
    }

    pub fn set_rotation(&self, degrees: f64) {
        let degrees = normalize_degrees(degrees);
        if self.0.rotation.get() == degrees {
            return;
        }
        self.0.rotation.set(degrees);
        self.notify(|observer, host| observer.on_rotation_changed(host));
    }

    pub fn set_rotation_of(&self, other: &Entity) {
        self.set_rotation(other.rotation());
    }

    pub fn rotate_towards(&self, x: f64, y: f64) {
        self.set_rotation(self.angle_to(x, y));
    }

    pub fn rotate_towards_entity(&self, other: &Entity) {
        self.set_rotation(self.angle_to_entity(other));
    }

    /// Turn towards `target_angle` by at most `max_turn` degrees, taking the
    /// shorter way round. Snaps onto the target when it is within reach.
    pub fn turn_towards(&self, target_angle: f64, max_turn: f64) {
        let max_turn = max_turn.abs();
        let delta = angle_delta(self.rotation(), target_angle);
        if delta.abs() <= max_turn {
            self.set_rotation(target_angle);
        } else {
            self.set_rotation(self.rotation() + max_turn.copysign(delta));
        }
    }

    pub fn turn_towards_point(&self, x: f64, y: f64, max_turn: f64) {
        self.turn_towards(self.angle_to(x, y), max_turn);
    }

    pub fn turn_towards_entity(&self, other: &Entity, max_turn: f64) {
        self.turn_towards(self.angle_to_entity(other), max_turn);
    }

    // --- Size ---

    /// Diameter, always at least 1
    pub fn size(&self) -> u32 {
        self.0.size.get()
    }

    pub fn set_size(&self, size: u32) -> Result<(), CoreError> {
        if size < 1 {
            return Err(CoreError::InvalidSize { value: size });
        }
        self.store_size(size);
        Ok(())
    }

    pub fn set_size_of(&self, other: &Entity) {
        self.store_size(other.size());
    }

    /// Set the size, raising values below 1 to 1
    pub(crate) fn store_size(&self, size: u32) {
        let size = size.max(1);
        if self.0.size.get() == size {
            return;
        }
        self.0.size.set(size);
        self.notify(|observer, host| observer.on_size_changed(host));
    }

    // --- Geometry ---

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        self.position().distance(DVec2::new(x, y))
    }

    pub fn distance_to_entity(&self, other: &Entity) -> f64 {
        self.position().distance(other.position())
    }

    /// Bearing in degrees towards a point, in [0, 360)
    pub fn angle_to(&self, x: f64, y: f64) -> f64 {
        bearing_degrees(self.position(), DVec2::new(x, y))
    }

    pub fn angle_to_entity(&self, other: &Entity) -> f64 {
        bearing_degrees(self.position(), other.position())
    }

    /// Head towards a point at `speed` per tick
    pub fn move_towards(&self, x: f64, y: f64, speed: f64) {
        self.set_speed_directional(self.angle_to(x, y), speed);
    }

    pub fn move_towards_entity(&self, other: &Entity, speed: f64) {
        self.set_speed_directional(self.angle_to_entity(other), speed);
    }

    // --- Lifecycle ---

    /// Mark for removal at the game's next opportunity. Idempotent.
    pub fn dispose(&self) {
        self.0.disposed.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.0.disposed.get()
    }

    pub fn current_game(&self) -> Option<Game> {
        self.0.game.borrow().upgrade().map(Game::from_inner)
    }

    pub fn is_in_game(&self, game: &Game) -> bool {
        self.current_game().is_some_and(|current| current == *game)
    }

    /// Link to (or unlink from) a game and tell the observers
    pub(crate) fn set_current_game(&self, game: Option<&Game>) {
        let old = self.current_game();
        *self.0.game.borrow_mut() = game.map(Game::downgrade).unwrap_or_default();
        if let Some(old) = old {
            self.notify(|observer, host| observer.on_removed_from_game(&old, host));
        }
        if let Some(game) = game {
            self.notify(|observer, host| observer.on_added_to_game(game, host));
        }
    }

    fn is_active(&self) -> bool {
        !self.is_disposed() && self.current_game().is_some()
    }

    // --- Observers ---

    pub fn add_observer(&self, observer: impl EntityObserver + 'static) -> EntityObserverRef {
        let observer: Rc<dyn EntityObserver> = Rc::new(observer);
        let handle = Handle::from_rc(observer);
        self.0.observers.add(handle.clone());
        handle
    }

    pub fn install_observer(&self, observer: EntityObserverRef) {
        self.0.observers.add(observer);
    }

    pub fn remove_observer(&self, observer: &EntityObserverRef) {
        self.0.observers.remove(observer);
    }

    // --- Behaviour strategies ---

    pub fn add_behavior_strategy(&self, strategy: impl BehaviorStrategy) -> BehaviorRef {
        let strategy: Rc<dyn BehaviorStrategy> = Rc::new(strategy);
        let handle = Handle::from_rc(strategy);
        self.0.behaviors.add(handle.clone());
        handle
    }

    pub fn install_behavior_strategy(&self, strategy: BehaviorRef) {
        self.0.behaviors.add(strategy);
    }

    pub fn remove_behavior_strategy(&self, strategy: &BehaviorRef) {
        self.0.behaviors.remove(strategy);
    }

    pub fn has_behavior_strategies(&self) -> bool {
        !self.0.behaviors.is_empty()
    }

    pub fn has_behavior_strategy(&self, strategy: &BehaviorRef) -> bool {
        self.0.behaviors.contains(strategy)
    }

    /// First installed behaviour strategy of type `T`
    pub fn behavior_strategy<T: BehaviorStrategy>(&self) -> Option<Rc<T>> {
        self.0
            .behaviors
            .get_first_match(|s| s.is::<T>())
            .and_then(|s| s.downcast::<T>())
    }

    /// Remove the first behaviour strategy of type `T`, if any
    pub fn remove_behavior_strategy_of<T: BehaviorStrategy>(&self) -> bool {
        match self.0.behaviors.get_first_match(|s| s.is::<T>()) {
            Some(strategy) => {
                self.0.behaviors.remove(&strategy);
                true
            }
            None => false,
        }
    }

    // --- Collision strategies ---

    pub fn add_collision_strategy(&self, strategy: impl CollisionStrategy) -> CollisionRef {
        let strategy: Rc<dyn CollisionStrategy> = Rc::new(strategy);
        let handle = Handle::from_rc(strategy);
        self.0.collisions.add(handle.clone());
        handle
    }

    pub fn install_collision_strategy(&self, strategy: CollisionRef) {
        self.0.collisions.add(strategy);
    }

    pub fn remove_collision_strategy(&self, strategy: &CollisionRef) {
        self.0.collisions.remove(strategy);
    }

    pub fn has_collision_strategies(&self) -> bool {
        !self.0.collisions.is_empty()
    }

    pub fn has_collision_strategy(&self, strategy: &CollisionRef) -> bool {
        self.0.collisions.contains(strategy)
    }

    /// First installed collision strategy of type `T`
    pub fn collision_strategy<T: CollisionStrategy>(&self) -> Option<Rc<T>> {
        self.0
            .collisions
            .get_first_match(|s| s.is::<T>())
            .and_then(|s| s.downcast::<T>())
    }

    pub fn remove_collision_strategy_of<T: CollisionStrategy>(&self) -> bool {
        match self.0.collisions.get_first_match(|s| s.is::<T>()) {
            Some(strategy) => {
                self.0.collisions.remove(&strategy);
                true
            }
            None => false,
        }
    }

    // --- Tick hooks ---

    pub(crate) fn update_position_by_velocity(&self) {
        let velocity = self.velocity();
        if velocity == DVec2::ZERO {
            return;
        }
        self.0.position.set(self.position() + velocity);
        self.notify(|observer, host| observer.on_position_changed(host));
    }

    /// Run every behaviour strategy once, stopping after disposal
    pub(crate) fn update_behaviors(&self) {
        self.0.behaviors.for_each(|strategy| {
            if self.is_active() {
                strategy.act(self);
            }
        });
    }

    pub(crate) fn on_collision(&self, other: &Entity) {
        self.0.collisions.for_each(|strategy| {
            if self.is_active() {
                strategy.on_collision_with(self, other);
            }
        });
    }
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Entity {}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind_name(), self.0.id.0)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.kind_name())
            .field("id", &self.0.id.0)
            .field("position", &self.position())
            .field("size", &self.size())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
