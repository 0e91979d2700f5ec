//! Simulation tick
//!
//! One call to [`Game::update`] runs, in order:
//! 1. every script
//! 2. the pairwise collision pass
//! 3. movement and behaviour of every tracked entity
//! 4. the reset of this tick's pressed keys
//!
//! Entities disposed along the way are unlinked as soon as their phase
//! notices; structural changes to the entity and script groups made while a
//! phase iterates become visible from the next phase on.

use super::game::Game;

impl Game {
    /// Advance the game by one tick
    pub fn update(&self) {
        let tick = self.0.ticks.get() + 1;
        self.0.ticks.set(tick);

        self.run_scripts();
        self.run_collisions();
        self.run_movement();
        self.clear_pressed_keys();

        log::trace!("Tick {} done: {} entities", tick, self.entity_count());
    }

    fn run_scripts(&self) {
        self.0.scripts.for_each(|script| {
            script.on_update(self);
            if script.is_finished() {
                log::debug!("Script finished after tick {}", self.ticks());
                self.0.scripts.remove(script);
            }
        });
    }

    fn run_movement(&self) {
        self.0.entities.for_each(|entity| {
            entity.update_position_by_velocity();
            entity.update_behaviors();
            if entity.is_disposed() {
                self.unlink(entity);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::GameConfig;
    use crate::error::CoreError;
    use crate::sim::{
        Bullet, Entity, EntityObserver, EntityObserverRef, EntityType, GameKey, GameObserver,
        GameScript, Handle, Target,
    };

    use super::*;

    fn game() -> Game {
        Game::new(GameConfig::default()).unwrap()
    }

    /// Entity parked far away from the player
    fn parked(game: &Game, x: f64, y: f64) -> Entity {
        let entity = Entity::new(game.ids());
        entity.set_position(x, y);
        entity
    }

    #[derive(Default)]
    struct Journal(RefCell<Vec<String>>);

    impl Journal {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.borrow_mut())
        }
    }

    struct GameRecorder(Rc<Journal>);

    impl GameObserver for GameRecorder {
        fn on_entity_added(&self, _game: &Game, entity: &Entity) {
            self.0.0.borrow_mut().push(format!("added {entity}"));
        }
        fn on_entity_removed(&self, _game: &Game, entity: &Entity) {
            self.0.0.borrow_mut().push(format!("removed {entity}"));
        }
    }

    fn recorded() -> (Game, Rc<Journal>) {
        let game = game();
        let journal = Rc::new(Journal::default());
        game.add_observer(GameRecorder(Rc::clone(&journal)));
        (game, journal)
    }

    #[test]
    fn test_collision_is_symmetric() {
        let game = game();
        let a = parked(&game, 1000.0, 1000.0);
        let b = parked(&game, 1005.0, 1000.0);
        a.set_size(10).unwrap();
        b.set_size(10).unwrap();

        let calls = Rc::new(RefCell::new(Vec::new()));
        for entity in [&a, &b] {
            let calls = Rc::clone(&calls);
            entity.add_collision_strategy(move |host: &Entity, other: &Entity| {
                calls.borrow_mut().push((host.id(), other.id()));
            });
            game.add_entity(entity).unwrap();
        }

        game.update();
        assert_eq!(*calls.borrow(), vec![(a.id(), b.id()), (b.id(), a.id())]);
    }

    #[test]
    fn test_target_killed_in_collision_removed_same_tick() {
        let (game, journal) = recorded();
        let target = Target::new(game.ids());
        target.set_position(1000.0, 1000.0);
        let hammer = parked(&game, 1000.0, 1000.0);
        hammer.add_collision_strategy(|_: &Entity, other: &Entity| {
            if let Some(target) = Target::from_entity(other) {
                target.add_hitpoints(-1);
            }
        });
        game.add_entity(&target).unwrap();
        game.add_entity(&hammer).unwrap();
        journal.take();

        game.update();
        assert!(target.is_disposed());
        assert!(target.current_game().is_none());
        assert_eq!(game.all_entities().count(), 2);
        assert_eq!(journal.take(), vec![format!("removed {target}")]);
    }

    #[test]
    fn test_dispose_twice_removes_once() {
        let (game, journal) = recorded();
        let entity = parked(&game, 1000.0, 1000.0);
        game.add_entity(&entity).unwrap();
        journal.take();

        entity.dispose();
        entity.dispose();
        game.update();
        game.update();
        assert_eq!(journal.take(), vec![format!("removed {entity}")]);
        assert_eq!(game.entity_count(), 1);
    }

    #[test]
    fn test_disposed_entity_is_added_then_removed() {
        let (game, journal) = recorded();
        let entity = parked(&game, 1000.0, 1000.0);
        entity.dispose();
        game.add_entity(&entity).unwrap();

        assert_eq!(
            journal.take(),
            vec![format!("added {entity}"), format!("removed {entity}")]
        );
        assert!(entity.current_game().is_none());
        assert!(!game.all_entities().create_list().contains(&entity));
    }

    #[test]
    fn test_double_add_fails() {
        let game = game();
        let entity = parked(&game, 0.0, 0.0);
        game.add_entity(&entity).unwrap();
        assert_eq!(
            game.add_entity(&entity),
            Err(CoreError::AlreadyInGame { entity: entity.id() })
        );

        let other = Game::new(GameConfig::default()).unwrap();
        assert!(other.add_entity(&entity).is_err());
    }

    #[test]
    fn test_entity_from_another_game_is_rejected() {
        let game = game();
        let other = Game::new(GameConfig::default()).unwrap();
        let stranger = Entity::new(other.ids());
        assert_eq!(
            game.add_entity(&stranger),
            Err(CoreError::ForeignEntity {
                entity: stranger.id()
            })
        );
        assert!(stranger.current_game().is_none());
        assert_eq!(game.entity_count(), 1);
        assert!(other.add_entity(&stranger).is_ok());
    }

    #[test]
    fn test_scripts_run_first_and_can_add_entities() {
        let game = game();
        let seen = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&seen);
        let script = game.add_script(move |game: &Game| {
            counter.set(game.all_entities().count());
            let _ = game.add_entity(&Entity::new(game.ids()));
        });
        game.update();
        assert_eq!(seen.get(), 1);
        game.update();
        assert_eq!(seen.get(), 2);

        assert_eq!(game.install_script(script.clone()), Err(CoreError::ScriptAlreadyAdded));
        game.remove_script(&script).unwrap();
        assert_eq!(game.remove_script(&script), Err(CoreError::ScriptNotAdded));
        game.update();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_script_installed_mid_update_counts_as_added() {
        let game = game();
        let runs = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&runs);
        let worker: Rc<dyn GameScript> = Rc::new(move |_: &Game| counter.set(counter.get() + 1));
        let worker = Handle::from_rc(worker);

        let results = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&results);
        let pending = worker.clone();
        let installer = game.add_script(move |game: &Game| {
            let mut log = log.borrow_mut();
            log.push(game.install_script(pending.clone()));
            log.push(game.install_script(pending.clone()));
            log.push(game.remove_script(&pending));
            log.push(game.install_script(pending.clone()));
        });
        game.update();
        assert_eq!(
            *results.borrow(),
            vec![Ok(()), Err(CoreError::ScriptAlreadyAdded), Ok(()), Ok(())]
        );
        game.remove_script(&installer).unwrap();

        assert!(game.has_script(&worker));
        game.update();
        assert_eq!(runs.get(), 1);
        game.remove_script(&worker).unwrap();
        assert!(!game.has_script(&worker));
    }

    struct Countdown(Cell<u32>);

    impl GameScript for Countdown {
        fn on_update(&self, _game: &Game) {
            self.0.set(self.0.get().saturating_sub(1));
        }

        fn is_finished(&self) -> bool {
            self.0.get() == 0
        }
    }

    #[test]
    fn test_finished_script_is_removed() {
        let game = game();
        let script = game.add_script(Countdown(Cell::new(2)));
        game.update();
        assert!(game.has_script(&script));
        game.update();
        assert!(!game.has_script(&script));
    }

    #[test]
    fn test_keys_cleared_after_tick() {
        let game = game();
        game.buffer_key(GameKey::Space);
        assert!(game.is_pressed(GameKey::Space));
        game.update();
        assert!(!game.is_pressed(GameKey::Space));
    }

    #[test]
    fn test_movement_applies_velocity() {
        let game = game();
        let entity = parked(&game, 10.0, 10.0);
        entity.set_velocity(2.0, -1.0);
        game.add_entity(&entity).unwrap();
        game.update();
        game.update();
        assert_eq!((entity.x(), entity.y()), (14.0, 8.0));
        assert_eq!(game.ticks(), 2);
    }

    #[test]
    fn test_disposed_entity_never_offered_as_collision_partner() {
        let game = game();
        let hits = Rc::new(Cell::new(0));
        let sensor = parked(&game, 1000.0, 1000.0);
        let counter = Rc::clone(&hits);
        sensor.add_collision_strategy(move |_: &Entity, _: &Entity| counter.set(counter.get() + 1));
        let ghost = parked(&game, 1000.0, 1000.0);
        game.add_entity(&sensor).unwrap();
        game.add_entity(&ghost).unwrap();

        // disposed by a script before the collision phase
        let doomed = ghost.clone();
        game.add_script(move |_: &Game| doomed.dispose());
        game.update();
        assert_eq!(hits.get(), 0);
        assert!(ghost.current_game().is_none());
    }

    #[test]
    fn test_self_disposal_mid_pair_still_notifies_partner() {
        let game = game();
        let bomb = parked(&game, 1000.0, 1000.0);
        bomb.add_collision_strategy(|host: &Entity, _: &Entity| host.dispose());
        let wall = parked(&game, 1000.0, 1000.0);
        let touched = Rc::new(Cell::new(false));
        let flag = Rc::clone(&touched);
        wall.add_collision_strategy(move |_: &Entity, other: &Entity| {
            flag.set(other.is_disposed());
        });
        game.add_entity(&bomb).unwrap();
        game.add_entity(&wall).unwrap();

        game.update();
        assert!(touched.get());
        assert!(bomb.current_game().is_none());
        assert!(wall.is_in_game(&game));
    }

    #[test]
    fn test_bullet_hits_target_and_player_scores() {
        let game = game();
        let player = game.player().clone();
        player.set_rotation(0.0);
        let target = Target::new(game.ids());
        target.set_position(player.x() + 60.0, player.y());
        game.add_entity(&target).unwrap();

        let mut fired = false;
        for _ in 0..20 {
            if !fired {
                game.buffer_key(GameKey::Space);
                fired = true;
            }
            game.update();
        }
        assert!(target.is_disposed());
        assert_eq!(player.score(), 50);
        assert_eq!(game.all_entities().of_type::<Bullet>().count(), 0);
    }

    struct OneShot {
        moves: Rc<Cell<u32>>,
        me: RefCell<Option<EntityObserverRef>>,
    }

    impl EntityObserver for OneShot {
        fn on_position_changed(&self, host: &Entity) {
            self.moves.set(self.moves.get() + 1);
            if let Some(me) = self.me.borrow().as_ref() {
                host.remove_observer(me);
            }
        }
    }

    #[test]
    fn test_observer_may_remove_itself() {
        let game = game();
        let entity = parked(&game, 0.0, 0.0);
        entity.set_velocity(1.0, 0.0);
        let moves = Rc::new(Cell::new(0));
        let observer = Rc::new(OneShot {
            moves: Rc::clone(&moves),
            me: RefCell::new(None),
        });
        let shared: Rc<dyn EntityObserver> = observer.clone();
        let handle = Handle::from_rc(shared);
        entity.install_observer(handle.clone());
        *observer.me.borrow_mut() = Some(handle);
        game.add_entity(&entity).unwrap();

        game.update();
        game.update();
        assert_eq!(moves.get(), 1);
        assert_eq!(entity.x(), 2.0);
    }
}
