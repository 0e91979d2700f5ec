//! Game state: tracked entities, scripts, observers and input
//!
//! A [`Game`] is a cheap, clonable handle. Entities keep a weak reference back
//! to the game they are linked to, so dropping the last handle frees the game
//! and unlinks everything in it.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, IdSource};
use super::group::Group;
use super::handle::Handle;
use super::player::Player;
use super::strategy::{GameScript, ScriptRef};
use super::stream::EntityStream;
use crate::error::CoreError;
use crate::settings::GameConfig;

/// Keys and mouse buttons the core understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKey {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,
    Escape,
    Space,
    Enter,
    Ctrl,
    Shift,
    Alt,
    Delete,
    Backspace,
    Left,
    Right,
    Up,
    Down,
    MouseLeft,
    MouseRight,
}

/// Entity lifecycle notifications. All methods default to no-ops.
pub trait GameObserver {
    fn on_entity_added(&self, _game: &Game, _entity: &Entity) {}
    fn on_entity_removed(&self, _game: &Game, _entity: &Entity) {}
}

pub type GameObserverRef = Handle<dyn GameObserver>;

pub(crate) struct GameInner {
    pub(crate) entities: Group<Entity>,
    pub(crate) scripts: Group<ScriptRef>,
    observers: Group<GameObserverRef>,
    pressed_keys: RefCell<HashSet<GameKey>>,
    mouse: Cell<DVec2>,
    player: Player,
    ids: IdSource,
    config: GameConfig,
    pub(crate) ticks: Cell<u64>,
}

#[derive(Clone)]
pub struct Game(pub(crate) Rc<GameInner>);

impl Game {
    /// A game with a player built from `config`
    pub fn new(config: GameConfig) -> Result<Self, CoreError> {
        Self::with_player(config, Player::new)
    }

    /// A game whose player comes from `make_player`
    pub fn with_player(
        config: GameConfig,
        make_player: impl FnOnce(&IdSource, &GameConfig) -> Result<Player, CoreError>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let ids = IdSource::new();
        let player = make_player(&ids, &config)?;
        let game = Self(Rc::new(GameInner {
            entities: Group::new(),
            scripts: Group::new(),
            observers: Group::new(),
            pressed_keys: RefCell::new(HashSet::new()),
            mouse: Cell::new(DVec2::ZERO),
            player,
            ids,
            config,
            ticks: Cell::new(0),
        }));
        game.add_entity(game.player())?;
        log::info!("Game created with player {}", game.player().id());
        Ok(game)
    }

    pub(crate) fn from_inner(inner: Rc<GameInner>) -> Self {
        Self(inner)
    }

    pub(crate) fn downgrade(&self) -> Weak<GameInner> {
        Rc::downgrade(&self.0)
    }

    pub fn player(&self) -> &Player {
        &self.0.player
    }

    /// Registry to create new entities for this game from
    pub fn ids(&self) -> &IdSource {
        &self.0.ids
    }

    pub fn config(&self) -> &GameConfig {
        &self.0.config
    }

    /// Number of completed updates
    pub fn ticks(&self) -> u64 {
        self.0.ticks.get()
    }

    // --- Entities ---

    /// Link `entity` to this game and start tracking it.
    ///
    /// The entity must have been created from [`Game::ids`], so ids stay
    /// unique among tracked entities. An entity that is already disposed is
    /// announced as added and removed right away and never tracked.
    pub fn add_entity(&self, entity: &Entity) -> Result<(), CoreError> {
        if entity.current_game().is_some() {
            return Err(CoreError::AlreadyInGame { entity: entity.id() });
        }
        if !entity.id_source().shares_counter(self.ids()) {
            return Err(CoreError::ForeignEntity { entity: entity.id() });
        }
        entity.set_current_game(Some(self));
        if entity.is_disposed() {
            log::debug!("{} was disposed before it could join", entity);
            self.fire_entity_added(entity);
            entity.set_current_game(None);
            self.fire_entity_removed(entity);
        } else {
            self.0.entities.add(entity.clone());
            log::debug!("{} added", entity);
            self.fire_entity_added(entity);
        }
        Ok(())
    }

    /// Stop tracking a disposed entity, clear its game link and announce it
    pub(crate) fn unlink(&self, entity: &Entity) {
        if !entity.is_in_game(self) {
            return;
        }
        self.0.entities.remove(entity);
        entity.set_current_game(None);
        log::debug!("{} removed", entity);
        self.fire_entity_removed(entity);
    }

    /// Query over every tracked entity that is not disposed
    pub fn all_entities(&self) -> EntityStream<'static> {
        let game = self.clone();
        EntityStream::new(move |action| {
            game.0.entities.for_each(|entity| {
                if !entity.is_disposed() {
                    action(entity);
                }
            })
        })
    }

    /// Number of tracked entities, disposed ones not yet removed included
    pub fn entity_count(&self) -> usize {
        self.0.entities.len()
    }

    // --- Scripts ---

    pub fn add_script(&self, script: impl GameScript) -> ScriptRef {
        let script: Rc<dyn GameScript> = Rc::new(script);
        let handle = Handle::from_rc(script);
        self.0.scripts.add(handle.clone());
        log::debug!("Script added ({} total)", self.0.scripts.len());
        handle
    }

    pub fn install_script(&self, script: ScriptRef) -> Result<(), CoreError> {
        if self.0.scripts.will_contain(&script) {
            return Err(CoreError::ScriptAlreadyAdded);
        }
        self.0.scripts.add(script);
        Ok(())
    }

    pub fn remove_script(&self, script: &ScriptRef) -> Result<(), CoreError> {
        if !self.0.scripts.will_contain(script) {
            return Err(CoreError::ScriptNotAdded);
        }
        self.0.scripts.remove(script);
        log::debug!("Script removed");
        Ok(())
    }

    pub fn has_script(&self, script: &ScriptRef) -> bool {
        self.0.scripts.contains(script)
    }

    // --- Input ---

    /// Mark `key` as pressed for the current tick
    pub fn buffer_key(&self, key: GameKey) {
        self.0.pressed_keys.borrow_mut().insert(key);
    }

    pub fn is_pressed(&self, key: GameKey) -> bool {
        self.0.pressed_keys.borrow().contains(&key)
    }

    pub(crate) fn clear_pressed_keys(&self) {
        self.0.pressed_keys.borrow_mut().clear();
    }

    pub fn set_mouse_position(&self, x: f64, y: f64) {
        self.0.mouse.set(DVec2::new(x, y));
    }

    pub fn mouse_position(&self) -> DVec2 {
        self.0.mouse.get()
    }

    pub fn mouse_x(&self) -> f64 {
        self.0.mouse.get().x
    }

    pub fn mouse_y(&self) -> f64 {
        self.0.mouse.get().y
    }

    // --- Observers ---

    pub fn add_observer(&self, observer: impl GameObserver + 'static) -> GameObserverRef {
        let observer: Rc<dyn GameObserver> = Rc::new(observer);
        let handle = Handle::from_rc(observer);
        self.0.observers.add(handle.clone());
        handle
    }

    pub fn install_observer(&self, observer: GameObserverRef) {
        self.0.observers.add(observer);
    }

    pub fn remove_observer(&self, observer: &GameObserverRef) {
        self.0.observers.remove(observer);
    }

    pub(crate) fn fire_entity_added(&self, entity: &Entity) {
        self.0
            .observers
            .for_each(|observer| observer.on_entity_added(self, entity));
    }

    pub(crate) fn fire_entity_removed(&self, entity: &Entity) {
        self.0
            .observers
            .for_each(|observer| observer.on_entity_removed(self, entity));
    }
}

impl PartialEq for Game {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Game {}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("ticks", &self.ticks())
            .field("entities", &self.entity_count())
            .field("scripts", &self.0.scripts.len())
            .finish()
    }
}
