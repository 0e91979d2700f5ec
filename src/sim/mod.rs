//! Entity simulation module
//!
//! All gameplay logic lives here. The rules this module keeps:
//! - Single-threaded, one `Game::update` per tick
//! - Structural changes during iteration are buffered and replayed in order
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod actions;
pub mod bullet;
pub mod collision;
pub mod entity;
pub mod game;
pub mod group;
pub mod handle;
pub mod laser;
pub mod pickup;
pub mod player;
pub mod script;
pub mod strategy;
pub mod stream;
pub mod target;
pub mod tick;

pub use actions::{BulletScoreOnHit, MovePlayerAction, ShootLaserAction, TurnDirection};
pub use bullet::{
    Bullet, BulletLifeTimer, DamageOnHit, HitOnCollision, SelfDestructOnHit, TargetFilter,
};
pub use collision::are_overlapping;
pub use entity::{Entity, EntityId, EntityObserver, EntityObserverRef, EntityType, IdSource};
pub use game::{Game, GameKey, GameObserver, GameObserverRef};
pub use group::Group;
pub use handle::{AsAny, Handle};
pub use laser::{
    BasicLaser, DamageUpgrade, Laser, LaserChain, LaserUpgrade, LaserView, SizeAndSpeedUpgrade,
    Upgrade,
};
pub use pickup::{PickUp, PickUpEffect, PickUpKind, PickUpLifeTimer, PlayerPickUp};
pub use player::{Player, PlayerObserver, PlayerObserverRef};
pub use script::{SpawnConfig, SpawnScript};
pub use strategy::{
    BehaviorRef, BehaviorStrategy, CollisionRef, CollisionStrategy, GameScript, HitRef,
    HitStrategy, ScriptRef,
};
pub use stream::EntityStream;
pub use target::{DisposeOnDeath, Target, TargetObserver, TargetObserverRef};
