//! Player weapon as a decorator chain
//!
//! A [`Laser`] is a [`BasicLaser`] with a stack of [`Upgrade`]s on top. Every
//! property resolves from the outermost upgrade inwards: an upgrade overrides
//! what it cares about and asks the rest of the chain (a [`LaserView`]) for
//! everything else.

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::bullet::{Bullet, SelfDestructOnHit};
use super::entity::Entity;
use super::handle::AsAny;
use crate::consts::{MAX_UPGRADED_BULLET_SIZE, MIN_UPGRADED_BULLET_SPEED};
use crate::error::CoreError;

/// Innermost link of every laser chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasicLaser {
    pub damage: i32,
    /// Ticks a bullet lives
    pub bullet_life_time: i32,
    pub bullet_size: i32,
    /// Distance per tick added along the bullet's rotation
    pub bullet_speed: f64,
    /// Ticks between two shots
    pub cooldown_time: i32,
}

impl Default for BasicLaser {
    fn default() -> Self {
        Self {
            damage: 1,
            bullet_life_time: 100,
            bullet_size: 8,
            bullet_speed: 6.0,
            cooldown_time: 10,
        }
    }
}

impl BasicLaser {
    /// One self-destructing bullet in front of `source`
    pub fn create_bullets(&self, source: &Entity) -> Vec<Bullet> {
        let bullet = Bullet::new(source);
        bullet.add_hit_strategy(SelfDestructOnHit);
        vec![bullet]
    }
}

/// Decorator over the rest of a laser chain. Every method defaults to the
/// decorated value.
pub trait LaserUpgrade: AsAny {
    fn damage(&self, inner: &LaserView<'_>) -> i32 {
        inner.damage()
    }

    fn bullet_life_time(&self, inner: &LaserView<'_>) -> i32 {
        inner.bullet_life_time()
    }

    fn bullet_size(&self, inner: &LaserView<'_>) -> i32 {
        inner.bullet_size()
    }

    fn bullet_speed(&self, inner: &LaserView<'_>) -> f64 {
        inner.bullet_speed()
    }

    fn cooldown_time(&self, inner: &LaserView<'_>) -> i32 {
        inner.cooldown_time()
    }

    fn create_bullets(&self, source: &Entity, inner: &LaserView<'_>) -> Vec<Bullet> {
        inner.create_bullets(source)
    }

    /// Adjust freshly created bullets after the shooter configured them
    fn initialize_bullets(&self, bullets: &[Bullet], inner: &LaserView<'_>) {
        inner.initialize_bullets(bullets)
    }
}

struct UpgradeNode {
    upgrade: Box<dyn LaserUpgrade>,
    installed: Cell<bool>,
}

/// Shared handle to one decorator, compared by identity
#[derive(Clone)]
pub struct Upgrade(Rc<UpgradeNode>);

impl Upgrade {
    pub fn new(upgrade: impl LaserUpgrade) -> Self {
        Self(Rc::new(UpgradeNode {
            upgrade: Box::new(upgrade),
            installed: Cell::new(false),
        }))
    }

    /// Whether this upgrade currently decorates a laser
    pub fn is_installed(&self) -> bool {
        self.0.installed.get()
    }

    pub fn is<T: LaserUpgrade>(&self) -> bool {
        AsAny::as_any(&*self.0.upgrade).is::<T>()
    }

    pub fn downcast_ref<T: LaserUpgrade>(&self) -> Option<&T> {
        AsAny::as_any(&*self.0.upgrade).downcast_ref::<T>()
    }

    fn decorator(&self) -> &dyn LaserUpgrade {
        &*self.0.upgrade
    }
}

impl PartialEq for Upgrade {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Upgrade {}

impl fmt::Debug for Upgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Upgrade({:p})", Rc::as_ptr(&self.0))
    }
}

/// A chain suffix: the terminal plus the upgrades up to some depth
#[derive(Clone, Copy)]
pub struct LaserView<'a> {
    terminal: &'a BasicLaser,
    /// Innermost first
    upgrades: &'a [Upgrade],
}

impl<'a> LaserView<'a> {
    fn resolve<R>(
        &self,
        at_terminal: impl FnOnce(&BasicLaser) -> R,
        at_upgrade: impl FnOnce(&dyn LaserUpgrade, &LaserView<'a>) -> R,
    ) -> R {
        match self.upgrades.split_last() {
            Some((outer, rest)) => {
                let inner = LaserView {
                    terminal: self.terminal,
                    upgrades: rest,
                };
                at_upgrade(outer.decorator(), &inner)
            }
            None => at_terminal(self.terminal),
        }
    }

    pub fn damage(&self) -> i32 {
        self.resolve(|t| t.damage, |u, inner| u.damage(inner))
    }

    pub fn bullet_life_time(&self) -> i32 {
        self.resolve(|t| t.bullet_life_time, |u, inner| u.bullet_life_time(inner))
    }

    pub fn bullet_size(&self) -> i32 {
        self.resolve(|t| t.bullet_size, |u, inner| u.bullet_size(inner))
    }

    pub fn bullet_speed(&self) -> f64 {
        self.resolve(|t| t.bullet_speed, |u, inner| u.bullet_speed(inner))
    }

    pub fn cooldown_time(&self) -> i32 {
        self.resolve(|t| t.cooldown_time, |u, inner| u.cooldown_time(inner))
    }

    pub fn create_bullets(&self, source: &Entity) -> Vec<Bullet> {
        self.resolve(
            |t| t.create_bullets(source),
            |u, inner| u.create_bullets(source, inner),
        )
    }

    pub fn initialize_bullets(&self, bullets: &[Bullet]) {
        self.resolve(|_| (), |u, inner| u.initialize_bullets(bullets, inner))
    }
}

/// Read-only copy of a laser chain.
///
/// Shares its [`Upgrade`]s with the laser it was taken from but cannot add or
/// remove links, so installation state stays with the owning [`Laser`].
#[derive(Debug, Clone, Default)]
pub struct LaserChain {
    terminal: BasicLaser,
    /// Innermost first; the last entry is the outermost decorator
    upgrades: Vec<Upgrade>,
}

impl LaserChain {
    pub fn terminal(&self) -> &BasicLaser {
        &self.terminal
    }

    pub fn view(&self) -> LaserView<'_> {
        LaserView {
            terminal: &self.terminal,
            upgrades: &self.upgrades,
        }
    }

    pub fn outermost(&self) -> Option<&Upgrade> {
        self.upgrades.last()
    }

    /// Upgrades from the outermost inwards
    pub fn upgrades(&self) -> impl Iterator<Item = &Upgrade> {
        self.upgrades.iter().rev()
    }

    /// Number of upgrades on top of the basic laser
    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    pub fn contains(&self, upgrade: &Upgrade) -> bool {
        self.upgrades.contains(upgrade)
    }

    pub fn contains_type<T: LaserUpgrade>(&self) -> bool {
        self.upgrades.iter().any(Upgrade::is::<T>)
    }

    pub fn count_type<T: LaserUpgrade>(&self) -> usize {
        self.upgrades.iter().filter(|u| u.is::<T>()).count()
    }

    pub fn damage(&self) -> i32 {
        self.view().damage()
    }

    pub fn bullet_life_time(&self) -> i32 {
        self.view().bullet_life_time()
    }

    pub fn bullet_size(&self) -> i32 {
        self.view().bullet_size()
    }

    pub fn bullet_speed(&self) -> f64 {
        self.view().bullet_speed()
    }

    pub fn cooldown_time(&self) -> i32 {
        self.view().cooldown_time()
    }

    pub fn create_bullets(&self, source: &Entity) -> Vec<Bullet> {
        self.view().create_bullets(source)
    }

    pub fn initialize_bullets(&self, bullets: &[Bullet]) {
        self.view().initialize_bullets(bullets)
    }
}

/// A basic laser decorated by zero or more upgrades.
///
/// The only owner allowed to install and remove links. Not `Clone`: copies
/// go out as [`LaserChain`]s.
#[derive(Debug, Default)]
pub struct Laser {
    chain: LaserChain,
}

impl Laser {
    pub fn new(terminal: BasicLaser) -> Self {
        Self {
            chain: LaserChain {
                terminal,
                upgrades: Vec::new(),
            },
        }
    }

    /// Read-only copy of the current chain
    pub fn snapshot(&self) -> LaserChain {
        self.chain.clone()
    }

    /// Decorate the chain with `upgrade` as the new outermost link
    pub fn push(&mut self, upgrade: Upgrade) -> Result<(), CoreError> {
        if upgrade.is_installed() {
            return Err(CoreError::UpgradeAlreadyInstalled);
        }
        upgrade.0.installed.set(true);
        self.chain.upgrades.push(upgrade);
        Ok(())
    }

    /// Splice `upgrade` out, keeping the order of the remaining links
    pub fn remove(&mut self, upgrade: &Upgrade) -> Result<Upgrade, CoreError> {
        let index = self
            .chain
            .upgrades
            .iter()
            .position(|u| u == upgrade)
            .ok_or(CoreError::UpgradeNotInstalled)?;
        let removed = self.chain.upgrades.remove(index);
        removed.0.installed.set(false);
        Ok(removed)
    }
}

impl Deref for Laser {
    type Target = LaserChain;

    fn deref(&self) -> &LaserChain {
        &self.chain
    }
}

/// One more point of damage
#[derive(Debug, Default, Clone, Copy)]
pub struct DamageUpgrade;

impl LaserUpgrade for DamageUpgrade {
    fn damage(&self, inner: &LaserView<'_>) -> i32 {
        inner.damage().saturating_add(1)
    }
}

/// Bigger but slower bullets
#[derive(Debug, Default, Clone, Copy)]
pub struct SizeAndSpeedUpgrade;

impl LaserUpgrade for SizeAndSpeedUpgrade {
    fn bullet_size(&self, inner: &LaserView<'_>) -> i32 {
        (inner.bullet_size() + 2).min(MAX_UPGRADED_BULLET_SIZE)
    }

    fn bullet_speed(&self, inner: &LaserView<'_>) -> f64 {
        (inner.bullet_speed() - 1.0).max(MIN_UPGRADED_BULLET_SPEED)
    }
}
