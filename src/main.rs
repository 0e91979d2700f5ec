//! Starfighter entry point
//!
//! Runs a headless, scripted game: drones spawn around the player and chase
//! it while an autopilot steers towards the nearest drone and fires.
//!
//! Usage: `starfighter [config.json]`

use std::cell::Cell;
use std::rc::Rc;

use starfighter_core::sim::{
    Entity, EntityType, Game, GameKey, MovePlayerAction, Player, PlayerObserver, SpawnScript,
    Target,
};
use starfighter_core::{CoreError, GameConfig, angle_delta};

const DEMO_TICKS: u64 = 3_000;
const DRONE_HITPOINTS: i32 = 2;
const DRONE_SPEED: f64 = 1.5;
const DRONE_TURN_SPEED: f64 = 3.0;
/// Half-width of the cone the autopilot fires into, in degrees
const FIRE_CONE: f64 = 8.0;
const CRUISE_DISTANCE: f64 = 250.0;

/// A drone that chases the player and rams it
fn spawn_drone(game: &Game) -> Entity {
    let drone = Target::new(game.ids());
    drone.set_hitpoints(DRONE_HITPOINTS);
    drone.add_behavior_strategy(|host: &Entity| {
        if let Some(game) = host.current_game() {
            host.turn_towards_entity(game.player(), DRONE_TURN_SPEED);
            host.set_speed_forward(DRONE_SPEED);
        }
    });
    drone.add_collision_strategy(|host: &Entity, other: &Entity| {
        if let (Some(drone), Some(player)) = (Target::from_entity(host), Player::from_entity(other))
            && drone.is_alive()
        {
            player.add_hitpoints(-1);
            drone.destroy();
        }
    });
    drone.into_entity()
}

/// Steer towards the nearest target and shoot once lined up
fn autopilot(game: &Game) {
    let player = game.player();
    let nearest = game
        .all_entities()
        .of_type::<Target>()
        .without(player)
        .fold(None, |nearest: Option<(f64, Target)>, target| {
            let distance = player.distance_to_entity(target);
            match nearest {
                Some((best, _)) if best <= distance => nearest,
                _ => Some((distance, target.clone())),
            }
        });
    let (Some((distance, target)), Some(movement)) =
        (nearest, player.behavior_strategy::<MovePlayerAction>())
    else {
        return;
    };

    let bearing = player.angle_to_entity(&target);
    movement.turn_player(movement.turn_direction_to(player, bearing, FIRE_CONE / 2.0));
    if distance > CRUISE_DISTANCE {
        movement.move_player_forward();
    } else {
        movement.slow_player_down();
    }
    if angle_delta(player.rotation(), bearing).abs() < FIRE_CONE {
        game.buffer_key(GameKey::Space);
    }
}

struct KillCounter(Rc<Cell<u32>>);

impl PlayerObserver for KillCounter {
    fn on_player_killed_target(&self, player: &Player, target: &Target) {
        self.0.set(self.0.get() + 1);
        log::info!("{} destroyed {} (score {})", player, target, player.score());
    }
}

fn main() -> Result<(), CoreError> {
    env_logger::init();
    log::info!("Starfighter (headless) starting...");

    let config = match std::env::args().nth(1) {
        Some(path) => GameConfig::load(path),
        None => GameConfig::default(),
    };
    let spawn = config.spawn;
    let game = Game::new(config)?;

    let kills = Rc::new(Cell::new(0));
    game.player().add_player_observer(KillCounter(Rc::clone(&kills)));

    let wave_cleared = Rc::new(Cell::new(false));
    let cleared = Rc::clone(&wave_cleared);
    game.add_script(autopilot);
    game.add_script(
        SpawnScript::new(spawn, spawn_drone)?.on_all_removed(move |game: &Game| {
            log::info!("Wave cleared after {} ticks", game.ticks());
            cleared.set(true);
        }),
    );

    while game.ticks() < DEMO_TICKS && !wave_cleared.get() {
        game.update();
        if game.player().is_disposed() {
            log::warn!("Player destroyed at tick {}", game.ticks());
            break;
        }
    }

    let player = game.player();
    log::info!(
        "Finished after {} ticks: {} kills, score {}, hitpoints {}/{}",
        game.ticks(),
        kills.get(),
        player.score(),
        player.hitpoints(),
        player.max_hitpoints()
    );
    Ok(())
}
