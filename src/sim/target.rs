//! Targets: entities with hitpoints that die at zero

use std::cell::Cell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use super::entity::{Entity, EntityType, IdSource, Kind};
use super::group::Group;
use super::handle::Handle;
use super::strategy::BehaviorStrategy;
use crate::error::CoreError;

/// Hitpoint notifications. `delta` is the requested change before clamping.
pub trait TargetObserver {
    fn on_before_hitpoints_changed(&self, _target: &Target, _delta: i32) {}
    fn on_after_hitpoints_changed(&self, _target: &Target, _delta: i32) {}
    fn on_death(&self, _target: &Target) {}
}

pub type TargetObserverRef = Handle<dyn TargetObserver>;

pub(crate) struct TargetData {
    hitpoints: Cell<i32>,
    max_hitpoints: Cell<i32>,
    read_only: Cell<bool>,
    observers: Group<TargetObserverRef>,
}

impl TargetData {
    pub(crate) fn new() -> Self {
        Self {
            hitpoints: Cell::new(1),
            max_hitpoints: Cell::new(i32::MAX),
            read_only: Cell::new(false),
            observers: Group::new(),
        }
    }
}

/// Entity with hitpoints clamped into `0..=max_hitpoints`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(Entity);

impl Target {
    /// A target with 1 hitpoint and no practical maximum
    pub fn new(ids: &IdSource) -> Self {
        Self::from_kind(ids, Kind::Target(TargetData::new()))
    }

    pub fn with_hitpoints(ids: &IdSource, hitpoints: i32, max_hitpoints: i32) -> Result<Self, CoreError> {
        let target = Self::new(ids);
        target.set_max_hitpoints(max_hitpoints)?;
        target.set_hitpoints(hitpoints);
        Ok(target)
    }

    pub(crate) fn from_kind(ids: &IdSource, kind: Kind) -> Self {
        let entity = Entity::with_kind(ids, kind);
        entity.add_behavior_strategy(DisposeOnDeath);
        Self(entity)
    }

    pub fn into_entity(self) -> Entity {
        self.0
    }

    fn data(&self) -> &TargetData {
        match self.0.kind() {
            Kind::Target(data) => data,
            Kind::Player(player) => &player.target,
            _ => unreachable!("target view over a non-target entity"),
        }
    }

    fn notify(&self, event: impl Fn(&dyn TargetObserver, &Target)) {
        self.data().observers.for_each(|observer| event(&**observer, self));
    }

    pub fn hitpoints(&self) -> i32 {
        self.data().hitpoints.get()
    }

    pub fn max_hitpoints(&self) -> i32 {
        self.data().max_hitpoints.get()
    }

    pub fn is_dead(&self) -> bool {
        self.hitpoints() <= 0
    }

    pub fn is_alive(&self) -> bool {
        !self.is_dead()
    }

    pub fn is_hitpoints_read_only(&self) -> bool {
        self.data().read_only.get()
    }

    /// While read-only, hitpoint changes are announced but not applied
    pub fn set_hitpoints_read_only(&self, read_only: bool) {
        self.data().read_only.set(read_only);
    }

    /// Set hitpoints, clamped into `0..=max`. Fires the death event when a
    /// living target reaches zero.
    pub fn set_hitpoints(&self, value: i32) {
        let delta = value.saturating_sub(self.hitpoints());
        self.notify(|observer, target| observer.on_before_hitpoints_changed(target, delta));
        if self.is_hitpoints_read_only() {
            return;
        }
        let was_alive = self.is_alive();
        self.data()
            .hitpoints
            .set(value.clamp(0, self.max_hitpoints()));
        self.notify(|observer, target| observer.on_after_hitpoints_changed(target, delta));
        if was_alive && self.is_dead() {
            log::debug!("{} died", self.0);
            self.notify(|observer, target| observer.on_death(target));
        }
    }

    /// Change hitpoints by `amount`. Ignored once dead.
    pub fn add_hitpoints(&self, amount: i32) {
        if self.is_dead() {
            return;
        }
        self.set_hitpoints(self.hitpoints().saturating_add(amount));
    }

    /// Drop to zero hitpoints, even while read-only
    pub fn destroy(&self) {
        let read_only = self.is_hitpoints_read_only();
        self.set_hitpoints_read_only(false);
        self.set_hitpoints(0);
        self.set_hitpoints_read_only(read_only);
    }

    pub fn set_max_hitpoints(&self, value: i32) -> Result<(), CoreError> {
        if value < 1 {
            return Err(CoreError::InvalidMaxHitpoints { value });
        }
        self.data().max_hitpoints.set(value);
        if self.hitpoints() > value {
            self.set_hitpoints(value);
        }
        Ok(())
    }

    pub fn add_target_observer(&self, observer: impl TargetObserver + 'static) -> TargetObserverRef {
        let observer: Rc<dyn TargetObserver> = Rc::new(observer);
        let handle = Handle::from_rc(observer);
        self.data().observers.add(handle.clone());
        handle
    }

    pub fn install_target_observer(&self, observer: TargetObserverRef) {
        self.data().observers.add(observer);
    }

    pub fn remove_target_observer(&self, observer: &TargetObserverRef) {
        self.data().observers.remove(observer);
    }
}

impl EntityType for Target {
    fn from_entity(entity: &Entity) -> Option<Self> {
        match entity.kind() {
            Kind::Target(_) | Kind::Player(_) => Some(Self(entity.clone())),
            _ => None,
        }
    }

    fn as_entity(&self) -> &Entity {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Deref for Target {
    type Target = Entity;

    fn deref(&self) -> &Entity {
        &self.0
    }
}

/// Disposes a dead target. Installed on every target.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisposeOnDeath;

impl BehaviorStrategy for DisposeOnDeath {
    fn act(&self, host: &Entity) {
        let Some(target) = Target::from_entity(host) else {
            return;
        };
        if target.is_dead() && !target.is_disposed() {
            target.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Log(RefCell<Vec<String>>);

    struct Recorder(Rc<Log>);

    impl TargetObserver for Recorder {
        fn on_before_hitpoints_changed(&self, _target: &Target, delta: i32) {
            self.0.0.borrow_mut().push(format!("before {delta}"));
        }
        fn on_after_hitpoints_changed(&self, target: &Target, delta: i32) {
            self.0
                .0
                .borrow_mut()
                .push(format!("after {delta} -> {}", target.hitpoints()));
        }
        fn on_death(&self, _target: &Target) {
            self.0.0.borrow_mut().push("death".to_string());
        }
    }

    fn recorded(hitpoints: i32, max: i32) -> (Target, Rc<Log>) {
        let target = Target::with_hitpoints(&IdSource::new(), hitpoints, max).unwrap();
        let log = Rc::new(Log::default());
        target.add_target_observer(Recorder(Rc::clone(&log)));
        (target, log)
    }

    #[test]
    fn test_defaults() {
        let target = Target::new(&IdSource::new());
        assert_eq!(target.hitpoints(), 1);
        assert_eq!(target.max_hitpoints(), i32::MAX);
        assert!(target.is_alive());
        assert!(target.behavior_strategy::<DisposeOnDeath>().is_some());
        assert_eq!(target.to_string(), "Target[0]");
    }

    #[test]
    fn test_hitpoints_clamped_and_death_fired_once() {
        let (target, log) = recorded(5, 10);
        target.set_hitpoints(50);
        assert_eq!(target.hitpoints(), 10);
        target.add_hitpoints(-25);
        assert_eq!(target.hitpoints(), 0);
        assert!(target.is_dead());
        target.add_hitpoints(-1);

        assert_eq!(
            *log.0.borrow(),
            vec!["before 45", "after 45 -> 10", "before -25", "after -25 -> 0", "death"]
        );
    }

    #[test]
    fn test_read_only_announces_without_applying() {
        let (target, log) = recorded(5, 10);
        target.set_hitpoints_read_only(true);
        target.add_hitpoints(-3);
        assert_eq!(target.hitpoints(), 5);
        assert_eq!(*log.0.borrow(), vec!["before -3"]);

        target.destroy();
        assert!(target.is_dead());
        assert!(target.is_hitpoints_read_only());
    }

    #[test]
    fn test_max_hitpoints_validation() {
        let target = Target::with_hitpoints(&IdSource::new(), 8, 10).unwrap();
        assert_eq!(
            target.set_max_hitpoints(0),
            Err(CoreError::InvalidMaxHitpoints { value: 0 })
        );
        assert!(target.set_max_hitpoints(3).is_ok());
        assert_eq!(target.hitpoints(), 3);
    }

    #[test]
    fn test_dispose_on_death() {
        let target = Target::new(&IdSource::new());
        DisposeOnDeath.act(&target);
        assert!(!target.is_disposed());
        target.set_hitpoints(0);
        DisposeOnDeath.act(&target);
        assert!(target.is_disposed());
    }

    #[test]
    fn test_typed_view_rejects_plain_entities() {
        let ids = IdSource::new();
        assert!(Target::from_entity(&Entity::new(&ids)).is_none());
        let target = Target::new(&ids);
        let entity = target.clone().into_entity();
        assert_eq!(Target::from_entity(&entity), Some(target));
    }
}
