//! Spawner script: drops entities around the player over time
//!
//! Spawn positions are drawn from a seeded `Pcg32`, so two games built from the
//! same [`SpawnConfig`] see the same waves.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityObserver};
use super::game::Game;
use super::strategy::GameScript;
use crate::error::CoreError;

/// Spawner tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Entities spawned over the script's lifetime
    pub total: u32,
    /// Upper bound on spawned entities alive at once
    pub max_alive: u32,
    /// Ticks between two spawns
    pub interval: u32,
    /// Per-axis distance from the player, inclusive range
    pub min_distance: f64,
    pub max_distance: f64,
    pub seed: u64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            total: 20,
            max_alive: 5,
            interval: 40,
            min_distance: 300.0,
            max_distance: 900.0,
            seed: 0x5747_5f53_7461_7246,
        }
    }
}

impl SpawnConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.max_alive == 0 {
            return Err(CoreError::InvalidSpawnConfig {
                reason: "max_alive must be at least 1",
            });
        }
        if !self.min_distance.is_finite() || self.min_distance < 0.0 {
            return Err(CoreError::InvalidSpawnConfig {
                reason: "min_distance must be a finite, non-negative number",
            });
        }
        if !self.max_distance.is_finite() || self.max_distance < self.min_distance {
            return Err(CoreError::InvalidSpawnConfig {
                reason: "max_distance must be finite and not below min_distance",
            });
        }
        Ok(())
    }
}

type Factory = Box<dyn Fn(&Game) -> Entity>;
type Callback = Box<dyn Fn(&Game)>;

/// Counts spawned entities back down as they leave the game
struct AliveTracker(Rc<Cell<u32>>);

impl EntityObserver for AliveTracker {
    fn on_removed_from_game(&self, _game: &Game, _host: &Entity) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// Spawns entities from a factory near the player until `total` is reached,
/// then finishes once every spawned entity has left the game.
pub struct SpawnScript {
    config: SpawnConfig,
    factory: Factory,
    on_all_removed: Option<Callback>,
    rng: RefCell<Pcg32>,
    remaining: Cell<u32>,
    alive: Rc<Cell<u32>>,
    timer: Cell<u32>,
    finished: Cell<bool>,
}

impl SpawnScript {
    pub fn new(
        config: SpawnConfig,
        factory: impl Fn(&Game) -> Entity + 'static,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config,
            factory: Box::new(factory),
            on_all_removed: None,
            rng: RefCell::new(Pcg32::seed_from_u64(config.seed)),
            remaining: Cell::new(config.total),
            alive: Rc::new(Cell::new(0)),
            timer: Cell::new(0),
            finished: Cell::new(false),
        })
    }

    /// Run `callback` once, when the last spawned entity has been removed
    pub fn on_all_removed(mut self, callback: impl Fn(&Game) + 'static) -> Self {
        self.on_all_removed = Some(Box::new(callback));
        self
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Entities still to be spawned
    pub fn remaining(&self) -> u32 {
        self.remaining.get()
    }

    /// Spawned entities currently in the game
    pub fn alive(&self) -> u32 {
        self.alive.get()
    }

    fn random_offset(&self) -> DVec2 {
        let mut rng = self.rng.borrow_mut();
        let mut axis = || {
            let distance = rng.random_range(self.config.min_distance..=self.config.max_distance);
            if rng.random_bool(0.5) { -distance } else { distance }
        };
        let dx = axis();
        let dy = axis();
        DVec2::new(dx, dy)
    }

    fn spawn(&self, game: &Game) {
        let entity = (self.factory)(game);
        entity.set_position_vec(game.player().position() + self.random_offset());
        entity.add_observer(AliveTracker(Rc::clone(&self.alive)));

        self.remaining.set(self.remaining.get() - 1);
        self.alive.set(self.alive.get() + 1);
        match game.add_entity(&entity) {
            Ok(()) => log::debug!(
                "Spawned {} at ({:.0}, {:.0}), {} left",
                entity,
                entity.x(),
                entity.y(),
                self.remaining.get()
            ),
            Err(err) => {
                self.alive.set(self.alive.get().saturating_sub(1));
                log::warn!("Spawner could not add {}: {}", entity, err);
            }
        }
    }
}

impl GameScript for SpawnScript {
    fn on_update(&self, game: &Game) {
        if self.finished.get() {
            return;
        }
        if self.remaining.get() == 0 {
            if self.alive.get() == 0 {
                self.finished.set(true);
                log::debug!("Spawner done after {} entities", self.config.total);
                if let Some(callback) = &self.on_all_removed {
                    callback(game);
                }
            }
            return;
        }

        // the interval only runs down while there is room for another spawn
        if self.alive.get() >= self.config.max_alive {
            return;
        }
        let timer = self.timer.get();
        if timer > 0 {
            self.timer.set(timer - 1);
            if timer > 1 {
                return;
            }
        }
        self.spawn(game);
        self.timer.set(self.config.interval);
    }

    fn is_finished(&self) -> bool {
        self.finished.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;

    fn game() -> Game {
        Game::new(GameConfig::default()).unwrap()
    }

    fn config(total: u32, max_alive: u32, interval: u32) -> SpawnConfig {
        SpawnConfig {
            total,
            max_alive,
            interval,
            min_distance: 100.0,
            max_distance: 200.0,
            seed: 7,
        }
    }

    /// Factory of plain entities that also records what it built
    fn recording_factory(spawned: &Rc<RefCell<Vec<Entity>>>) -> impl Fn(&Game) -> Entity + 'static {
        let spawned = Rc::clone(spawned);
        move |game: &Game| {
            let entity = Entity::new(game.ids());
            spawned.borrow_mut().push(entity.clone());
            entity
        }
    }

    #[test]
    fn test_validate() {
        assert!(SpawnConfig::default().validate().is_ok());
        let bad = SpawnConfig {
            max_alive: 0,
            ..SpawnConfig::default()
        };
        assert!(matches!(
            bad.validate(),
            Err(CoreError::InvalidSpawnConfig { .. })
        ));
        let inverted = SpawnConfig {
            min_distance: 10.0,
            max_distance: 5.0,
            ..SpawnConfig::default()
        };
        assert!(inverted.validate().is_err());
        assert!(SpawnScript::new(bad, |game: &Game| Entity::new(game.ids())).is_err());
    }

    #[test]
    fn test_respects_max_alive() {
        let game = game();
        let spawned = Rc::new(RefCell::new(Vec::new()));
        let script = SpawnScript::new(config(3, 2, 0), recording_factory(&spawned)).unwrap();
        let handle = game.add_script(script);

        game.update();
        game.update();
        game.update();
        assert_eq!(spawned.borrow().len(), 2);
        assert_eq!(game.entity_count(), 3);

        // the freed slot is noticed when the entity is unlinked, after scripts ran
        spawned.borrow()[0].dispose();
        game.update();
        assert_eq!(spawned.borrow().len(), 2);
        game.update();
        assert_eq!(spawned.borrow().len(), 3);

        let spawner = handle.downcast::<SpawnScript>().unwrap();
        assert_eq!(spawner.remaining(), 0);
        assert_eq!(spawner.alive(), 2);
    }

    #[test]
    fn test_interval_between_spawns() {
        let game = game();
        let spawned = Rc::new(RefCell::new(Vec::new()));
        game.add_script(SpawnScript::new(config(10, 10, 2), recording_factory(&spawned)).unwrap());

        let mut counts = Vec::new();
        for _ in 0..5 {
            game.update();
            counts.push(spawned.borrow().len());
        }
        assert_eq!(counts, vec![1, 1, 2, 2, 3]);
    }

    #[test]
    fn test_interval_waits_for_a_free_slot() {
        let game = game();
        let spawned = Rc::new(RefCell::new(Vec::new()));
        game.add_script(SpawnScript::new(config(3, 1, 3), recording_factory(&spawned)).unwrap());

        for _ in 0..6 {
            game.update();
        }
        assert_eq!(spawned.borrow().len(), 1);

        spawned.borrow()[0].dispose();
        game.update();
        game.update();
        game.update();
        assert_eq!(spawned.borrow().len(), 1);
        game.update();
        assert_eq!(spawned.borrow().len(), 2);
    }

    #[test]
    fn test_spawns_within_distance_band() {
        let game = game();
        let spawned = Rc::new(RefCell::new(Vec::new()));
        game.add_script(SpawnScript::new(config(5, 5, 0), recording_factory(&spawned)).unwrap());
        for _ in 0..5 {
            game.update();
        }
        let player = game.player().position();
        for entity in spawned.borrow().iter() {
            let offset = (entity.position() - player).abs();
            assert!((100.0..=200.0).contains(&offset.x), "{offset}");
            assert!((100.0..=200.0).contains(&offset.y), "{offset}");
        }
    }

    #[test]
    fn test_same_seed_same_positions() {
        let positions = || {
            let game = game();
            let spawned = Rc::new(RefCell::new(Vec::new()));
            game.add_script(
                SpawnScript::new(config(4, 4, 0), recording_factory(&spawned)).unwrap(),
            );
            for _ in 0..4 {
                game.update();
            }
            spawned
                .borrow()
                .iter()
                .map(|entity| entity.position())
                .collect::<Vec<_>>()
        };
        assert_eq!(positions(), positions());
    }

    #[test]
    fn test_finishes_after_last_removal() {
        let game = game();
        let spawned = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::new(Cell::new(0));
        let done_in_callback = Rc::clone(&done);
        let script = SpawnScript::new(config(2, 2, 0), recording_factory(&spawned))
            .unwrap()
            .on_all_removed(move |_| done_in_callback.set(done_in_callback.get() + 1));
        let handle = game.add_script(script);

        game.update();
        game.update();
        for entity in spawned.borrow().iter() {
            entity.dispose();
        }
        game.update();
        assert_eq!(done.get(), 0);
        assert!(game.has_script(&handle));

        game.update();
        assert_eq!(done.get(), 1);
        assert!(!game.has_script(&handle));

        game.update();
        assert_eq!(done.get(), 1);
        assert_eq!(game.entity_count(), 1);
    }
}
