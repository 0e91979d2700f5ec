//! Installable strategies
//!
//! Behaviour is attached to entities as small strategy values rather than
//! through subclassing. Each trait is implemented for matching closures, so
//! `entity.add_behavior_strategy(|host: &Entity| ...)` works as well as a
//! named unit struct that can later be found again by type.

use super::bullet::Bullet;
use super::entity::Entity;
use super::game::Game;
use super::handle::{AsAny, Handle};
use super::target::Target;

/// Per-tick action performed by an entity
pub trait BehaviorStrategy: AsAny {
    fn act(&self, host: &Entity);
}

impl<F> BehaviorStrategy for F
where
    F: Fn(&Entity) + 'static,
{
    fn act(&self, host: &Entity) {
        self(host)
    }
}

/// Reaction of `host` to overlapping with `other`
pub trait CollisionStrategy: AsAny {
    fn on_collision_with(&self, host: &Entity, other: &Entity);
}

impl<F> CollisionStrategy for F
where
    F: Fn(&Entity, &Entity) + 'static,
{
    fn on_collision_with(&self, host: &Entity, other: &Entity) {
        self(host, other)
    }
}

/// Reaction of a bullet hitting a target
pub trait HitStrategy: AsAny {
    fn on_hit(&self, bullet: &Bullet, target: &Target);
}

impl<F> HitStrategy for F
where
    F: Fn(&Bullet, &Target) + 'static,
{
    fn on_hit(&self, bullet: &Bullet, target: &Target) {
        self(bullet, target)
    }
}

/// Global per-tick action, run before collisions
pub trait GameScript: AsAny {
    fn on_update(&self, game: &Game);

    /// A finished script is removed by the game after its update.
    fn is_finished(&self) -> bool {
        false
    }
}

impl<F> GameScript for F
where
    F: Fn(&Game) + 'static,
{
    fn on_update(&self, game: &Game) {
        self(game)
    }
}

pub type BehaviorRef = Handle<dyn BehaviorStrategy>;
pub type CollisionRef = Handle<dyn CollisionStrategy>;
pub type HitRef = Handle<dyn HitStrategy>;
pub type ScriptRef = Handle<dyn GameScript>;
