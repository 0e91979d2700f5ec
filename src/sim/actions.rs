//! Player behaviours: firing the laser and flying the ship

use std::cell::Cell;

use super::bullet::Bullet;
use super::entity::{Entity, EntityType};
use super::game::GameKey;
use super::player::Player;
use super::strategy::{BehaviorStrategy, HitStrategy};
use super::target::Target;
use crate::angle_delta;
use crate::settings::{Controls, PlayerConfig};

/// Fires the player's laser while the shoot key is held, once per cooldown
#[derive(Debug)]
pub struct ShootLaserAction {
    cooldown: Cell<i32>,
    shoot_key: GameKey,
    score_per_kill: i64,
}

impl ShootLaserAction {
    pub fn new(shoot_key: GameKey, score_per_kill: i64) -> Self {
        Self {
            cooldown: Cell::new(0),
            shoot_key,
            score_per_kill,
        }
    }

    pub fn cooldown_remaining(&self) -> i32 {
        self.cooldown.get()
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown.get() <= 0
    }

    /// Fire one volley regardless of input and restart the cooldown.
    ///
    /// Bullets are added to the player's game when it has one.
    pub fn fire_laser(&self, player: &Player) -> Vec<Bullet> {
        let laser = player.laser();
        self.cooldown.set(laser.cooldown_time());

        let life_time = laser.bullet_life_time().max(1);
        let size = laser.bullet_size().max(1).unsigned_abs();
        let damage = laser.damage().max(0);
        let speed = laser.bullet_speed().max(0.0);

        let game = player.current_game();
        let bullets = laser.create_bullets(player);
        for bullet in &bullets {
            bullet.set_life_timer(life_time);
            bullet.store_size(size);
            bullet.set_damage(damage);
            bullet.add_hit_strategy(BulletScoreOnHit::new(self.score_per_kill));
            bullet.add_speed_directional(bullet.rotation(), speed);
            if let Some(game) = &game
                && let Err(err) = game.add_entity(bullet)
            {
                log::warn!("Laser bullet {} rejected: {}", bullet.as_entity(), err);
            }
        }
        laser.initialize_bullets(&bullets);
        player.fire_laser_fired(&bullets);
        bullets
    }
}

impl BehaviorStrategy for ShootLaserAction {
    fn act(&self, host: &Entity) {
        let Some(player) = Player::from_entity(host) else {
            return;
        };
        let cooldown = self.cooldown.get();
        if cooldown > 0 {
            self.cooldown.set(cooldown - 1);
            return;
        }
        let pressed = host
            .current_game()
            .is_some_and(|game| game.is_pressed(self.shoot_key));
        if pressed {
            self.fire_laser(&player);
        }
    }
}

/// Credits the shooting player: a kill scores, anything else counts as a hit
#[derive(Debug, Clone, Copy)]
pub struct BulletScoreOnHit {
    score: i64,
}

impl BulletScoreOnHit {
    pub fn new(score: i64) -> Self {
        Self { score }
    }

    pub fn score(&self) -> i64 {
        self.score
    }
}

impl HitStrategy for BulletScoreOnHit {
    fn on_hit(&self, bullet: &Bullet, target: &Target) {
        let Some(player) = Player::from_entity(bullet.source()) else {
            return;
        };
        if target.is_dead() {
            player.add_score(self.score);
            player.fire_killed_target(target);
        } else {
            player.fire_hit_target(target);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnDirection {
    #[default]
    None,
    Clockwise,
    CounterClockwise,
}

/// Turning, acceleration and drag of the player ship
#[derive(Debug)]
pub struct MovePlayerAction {
    turn_speed: Cell<f64>,
    max_speed: Cell<f64>,
    speed_gain: Cell<f64>,
    regular_speed_loss: Cell<f64>,
    slow_down_speed_loss: Cell<f64>,
    controls: Controls,
    move_forward: Cell<bool>,
    slow_down: Cell<bool>,
    turn: Cell<TurnDirection>,
}

impl MovePlayerAction {
    pub fn new(settings: &PlayerConfig, controls: &Controls) -> Self {
        Self {
            turn_speed: Cell::new(settings.turn_speed),
            max_speed: Cell::new(settings.max_speed),
            speed_gain: Cell::new(settings.speed_gain),
            regular_speed_loss: Cell::new(settings.regular_speed_loss),
            slow_down_speed_loss: Cell::new(settings.slow_down_speed_loss),
            controls: *controls,
            move_forward: Cell::new(false),
            slow_down: Cell::new(false),
            turn: Cell::new(TurnDirection::None),
        }
    }

    pub fn turn_speed(&self) -> f64 {
        self.turn_speed.get()
    }

    pub fn set_turn_speed(&self, degrees: f64) {
        self.turn_speed.set(degrees);
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed.get()
    }

    pub fn set_max_speed(&self, speed: f64) {
        self.max_speed.set(speed);
    }

    pub fn set_speed_gain(&self, gain: f64) {
        self.speed_gain.set(gain);
    }

    pub fn set_regular_speed_loss(&self, loss: f64) {
        self.regular_speed_loss.set(loss);
    }

    pub fn set_slow_down_speed_loss(&self, loss: f64) {
        self.slow_down_speed_loss.set(loss);
    }

    // Programmatic input, consumed by the next tick

    pub fn move_player_forward(&self) {
        self.move_forward.set(true);
    }

    pub fn slow_player_down(&self) {
        self.slow_down.set(true);
    }

    pub fn turn_player(&self, direction: TurnDirection) {
        self.turn.set(direction);
    }

    /// Which way to turn from the player's rotation towards `target_angle`.
    /// `None` once within `epsilon` degrees.
    pub fn turn_direction_to(&self, player: &Player, target_angle: f64, epsilon: f64) -> TurnDirection {
        let delta = angle_delta(player.rotation(), target_angle);
        if delta.abs() < epsilon {
            TurnDirection::None
        } else if delta > 0.0 {
            TurnDirection::Clockwise
        } else {
            TurnDirection::CounterClockwise
        }
    }

    /// Turn by at most the turn speed; true once facing `angle`
    pub fn turn_player_to_angle(&self, player: &Player, angle: f64) -> bool {
        player.turn_towards(angle, self.turn_speed());
        angle_delta(player.rotation(), angle).abs() < 0.1
    }

    /// Accelerate along the player's rotation, capped at the max speed
    pub fn speed_player_up_by(&self, player: &Player, gain: f64) {
        player.add_speed_forward(gain);
        let speed = player.speed();
        let max_speed = self.max_speed();
        if speed > max_speed {
            player.multiply_velocity(max_speed / speed);
        }
        player.set_has_move_input(true);
    }

    /// Lose `loss` speed, stopping rather than reversing
    pub fn slow_player_down_by(&self, player: &Player, loss: f64) {
        let speed = player.speed();
        if speed <= 0.0 {
            return;
        }
        let factor = (speed - loss) / speed;
        if factor < 0.0 {
            player.set_velocity(0.0, 0.0);
        } else {
            player.multiply_velocity(factor);
        }
        player.set_has_move_input(false);
    }
}

impl BehaviorStrategy for MovePlayerAction {
    fn act(&self, host: &Entity) {
        let Some(player) = Player::from_entity(host) else {
            return;
        };
        let pressed = |key: GameKey| {
            host.current_game()
                .is_some_and(|game| game.is_pressed(key))
        };
        let controls = &self.controls;

        let turn = match self.turn.get() {
            TurnDirection::None if pressed(controls.turn_right) => TurnDirection::Clockwise,
            TurnDirection::None if pressed(controls.turn_left) => TurnDirection::CounterClockwise,
            direction => direction,
        };
        match turn {
            TurnDirection::Clockwise => player.set_rotation(player.rotation() + self.turn_speed()),
            TurnDirection::CounterClockwise => {
                player.set_rotation(player.rotation() - self.turn_speed())
            }
            TurnDirection::None => {}
        }

        if self.move_forward.get() || pressed(controls.forward) {
            self.speed_player_up_by(&player, self.speed_gain.get());
        } else if self.slow_down.get() || pressed(controls.slow_down) {
            self.slow_player_down_by(&player, self.slow_down_speed_loss.get());
        } else {
            self.slow_player_down_by(&player, self.regular_speed_loss.get());
        }

        self.move_forward.set(false);
        self.slow_down.set(false);
        self.turn.set(TurnDirection::None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameConfig;
    use crate::sim::{Game, IdSource};

    fn game() -> Game {
        Game::new(GameConfig::default()).unwrap()
    }

    fn mover(player: &Player) -> std::rc::Rc<MovePlayerAction> {
        player.behavior_strategy::<MovePlayerAction>().unwrap()
    }

    #[test]
    fn test_shoot_key_fires_and_starts_cooldown() {
        let game = game();
        let player = game.player().clone();
        let shooter = player.behavior_strategy::<ShootLaserAction>().unwrap();

        game.buffer_key(GameKey::Space);
        shooter.act(&player);
        assert_eq!(shooter.cooldown_remaining(), 10);
        assert_eq!(game.all_entities().of_type::<Bullet>().count(), 1);

        shooter.act(&player);
        assert_eq!(shooter.cooldown_remaining(), 9);
        assert_eq!(game.all_entities().of_type::<Bullet>().count(), 1);
    }

    #[test]
    fn test_fired_bullet_is_configured_from_laser() {
        let game = game();
        let player = game.player().clone();
        player.set_rotation(0.0);
        let shooter = player.behavior_strategy::<ShootLaserAction>().unwrap();

        let bullets = shooter.fire_laser(&player);
        assert_eq!(bullets.len(), 1);
        let bullet = &bullets[0];
        assert_eq!(bullet.life_timer(), 100);
        assert_eq!(bullet.size(), 8);
        assert_eq!(bullet.damage(), 1);
        assert!((bullet.velocity_x() - 6.0).abs() < 1e-9);
        assert!(bullet.hit_strategy::<BulletScoreOnHit>().is_some());
        assert!(bullet.is_in_game(&game));
    }

    #[test]
    fn test_kill_scores_and_hit_does_not() {
        let ids = IdSource::new();
        let player = Player::new(&ids, &GameConfig::default()).unwrap();
        let bullet = Bullet::new(&player);
        let target = Target::with_hitpoints(&ids, 2, 2).unwrap();

        let scorer = BulletScoreOnHit::new(50);
        scorer.on_hit(&bullet, &target);
        assert_eq!(player.score(), 0);
        target.set_hitpoints(0);
        scorer.on_hit(&bullet, &target);
        assert_eq!(player.score(), 50);
    }

    #[test]
    fn test_acceleration_is_capped() {
        let game = game();
        let player = game.player().clone();
        let mover = mover(&player);
        player.set_rotation(0.0);
        for _ in 0..200 {
            mover.move_player_forward();
            mover.act(&player);
        }
        assert!((player.speed() - 6.0).abs() < 1e-9);
        assert!(player.has_move_input());
    }

    #[test]
    fn test_drag_stops_instead_of_reversing() {
        let game = game();
        let player = game.player().clone();
        let mover = mover(&player);
        player.set_velocity(0.05, 0.0);
        mover.slow_player_down();
        mover.act(&player);
        assert_eq!(player.speed(), 0.0);
        assert!(!player.has_move_input());

        player.set_velocity(1.0, 0.0);
        mover.act(&player);
        assert!((player.speed() - 0.98).abs() < 1e-9);
    }

    #[test]
    fn test_turn_keys_and_flags() {
        let game = game();
        let player = game.player().clone();
        let mover = mover(&player);
        player.set_rotation(0.0);

        game.buffer_key(GameKey::Right);
        mover.act(&player);
        assert_eq!(player.rotation(), 7.0);

        // an explicit turn request wins over the held key
        mover.turn_player(TurnDirection::CounterClockwise);
        mover.act(&player);
        assert_eq!(player.rotation(), 0.0);
    }

    #[test]
    fn test_turn_direction_helper() {
        let game = game();
        let player = game.player().clone();
        let mover = mover(&player);
        player.set_rotation(350.0);
        assert_eq!(mover.turn_direction_to(&player, 10.0, 1.0), TurnDirection::Clockwise);
        assert_eq!(
            mover.turn_direction_to(&player, 300.0, 1.0),
            TurnDirection::CounterClockwise
        );
        assert_eq!(mover.turn_direction_to(&player, 350.5, 1.0), TurnDirection::None);

        player.set_rotation(0.0);
        assert!(!mover.turn_player_to_angle(&player, 10.0));
        assert!(mover.turn_player_to_angle(&player, 10.0));
    }
}
