//! Scrolling shooter: player, enemies, bullets, AABB collisions and lives.

use crate::config::ShooterConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

const PLAYER_SIZE: f32 = 50.0;
const PLAYER_SPEED: f32 = 5.0;
/// Player spawns this far above the bottom edge.
const PLAYER_BOTTOM_OFFSET: f32 = 100.0;
pub const START_LIVES: u32 = 10;

const ENEMY_SIZE: f32 = 40.0;
const ENEMY_SPEED: f32 = 2.0;
const ENEMY_SPAWN_CHANCE: f64 = 0.02;
const ENEMY_FIRE_CHANCE: f64 = 0.005;

const BULLET_WIDTH: f32 = 5.0;
const BULLET_HEIGHT: f32 = 10.0;
const PLAYER_BULLET_SPEED: f32 = 10.0;
const ENEMY_BULLET_SPEED: f32 = 5.0;
const SHOT_COOLDOWN: Duration = Duration::from_millis(200);

pub const POINTS_PER_ENEMY: u32 = 100;
const BACKDROP_SPEED: f32 = 2.0;

/// Axis-aligned box; (x, y) is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Body {
    /// Strict overlap; touching edges do not count.
    pub fn intersects(&self, other: &Self) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub body: Body,
    pub lives: u32,
}

/// Enemies and bullets: a body moving vertically at a fixed speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mover {
    pub body: Body,
    pub speed: f32,
}

/// Held controls for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShooterInput {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub shoot: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShooterPhase {
    Idle,
    Running,
    GameOver,
}

#[derive(Debug)]
pub struct ShooterEngine {
    config: ShooterConfig,
    rng: StdRng,
    phase: ShooterPhase,
    player: Player,
    enemies: Vec<Mover>,
    player_bullets: Vec<Mover>,
    enemy_bullets: Vec<Mover>,
    score: u32,
    last_shot: Option<Instant>,
    backdrop_offset: f32,
}

impl ShooterEngine {
    pub fn new(config: ShooterConfig) -> Self {
        let rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        let player = spawn_player(&config);
        Self {
            config,
            rng,
            phase: ShooterPhase::Idle,
            player,
            enemies: Vec::new(),
            player_bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            score: 0,
            last_shot: None,
            backdrop_offset: 0.0,
        }
    }

    pub fn phase(&self) -> ShooterPhase {
        self.phase
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn enemies(&self) -> &[Mover] {
        &self.enemies
    }

    pub fn player_bullets(&self) -> &[Mover] {
        &self.player_bullets
    }

    pub fn enemy_bullets(&self) -> &[Mover] {
        &self.enemy_bullets
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn backdrop_offset(&self) -> f32 {
        self.backdrop_offset
    }

    pub fn field(&self) -> (f32, f32) {
        (self.config.field_width, self.config.field_height)
    }

    pub fn start(&mut self) {
        self.player = spawn_player(&self.config);
        self.enemies.clear();
        self.player_bullets.clear();
        self.enemy_bullets.clear();
        self.score = 0;
        self.last_shot = None;
        self.backdrop_offset = 0.0;
        self.phase = ShooterPhase::Running;
        log::info!(
            "shooter started on {}x{} field",
            self.config.field_width,
            self.config.field_height
        );
    }

    /// One frame: spawn, move, cull, collide, then apply the player's input.
    pub fn step(&mut self, input: &ShooterInput, now: Instant) {
        if self.phase != ShooterPhase::Running {
            return;
        }
        self.spawn_enemy();
        self.move_enemies();
        self.move_bullets();
        self.resolve_collisions();
        if self.phase != ShooterPhase::Running {
            return;
        }
        self.apply_input(input, now);
        if self.config.auto_fire {
            self.try_shoot(now);
        }
        self.backdrop_offset += BACKDROP_SPEED;
        if self.backdrop_offset >= self.config.field_height {
            self.backdrop_offset = 0.0;
        }
    }

    /// Pointer drag: move the player by the pointer delta.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        if self.phase != ShooterPhase::Running {
            return;
        }
        self.player.body.x += dx;
        self.player.body.y += dy;
        self.clamp_player();
    }

    /// Fires unless the last shot was within the cooldown. Returns whether a bullet spawned.
    pub fn try_shoot(&mut self, now: Instant) -> bool {
        if self.phase != ShooterPhase::Running {
            return false;
        }
        if self
            .last_shot
            .is_some_and(|t| now.saturating_duration_since(t) <= SHOT_COOLDOWN)
        {
            return false;
        }
        let p = self.player.body;
        self.player_bullets.push(Mover {
            body: Body {
                x: p.x + p.w / 2.0,
                y: p.y,
                w: BULLET_WIDTH,
                h: BULLET_HEIGHT,
            },
            speed: PLAYER_BULLET_SPEED,
        });
        self.last_shot = Some(now);
        true
    }

    fn spawn_enemy(&mut self) {
        if !self.rng.random_bool(ENEMY_SPAWN_CHANCE) {
            return;
        }
        let x = self.rng.random::<f32>() * (self.config.field_width - ENEMY_SIZE);
        self.enemies.push(Mover {
            body: Body {
                x,
                y: -ENEMY_SIZE,
                w: ENEMY_SIZE,
                h: ENEMY_SIZE,
            },
            speed: ENEMY_SPEED,
        });
    }

    fn move_enemies(&mut self) {
        for enemy in &mut self.enemies {
            enemy.body.y += enemy.speed;
            if self.rng.random_bool(ENEMY_FIRE_CHANCE) {
                let e = enemy.body;
                self.enemy_bullets.push(Mover {
                    body: Body {
                        x: e.x + e.w / 2.0,
                        y: e.y + e.h,
                        w: BULLET_WIDTH,
                        h: BULLET_HEIGHT,
                    },
                    speed: ENEMY_BULLET_SPEED,
                });
            }
        }
        let height = self.config.field_height;
        self.enemies.retain(|e| e.body.y < height);
    }

    fn move_bullets(&mut self) {
        for b in &mut self.player_bullets {
            b.body.y -= b.speed;
        }
        for b in &mut self.enemy_bullets {
            b.body.y += b.speed;
        }
        let height = self.config.field_height;
        self.player_bullets.retain(|b| b.body.y > 0.0);
        self.enemy_bullets.retain(|b| b.body.y < height);
    }

    fn resolve_collisions(&mut self) {
        // each player bullet takes out at most one enemy
        let mut spent = Vec::new();
        for (bi, bullet) in self.player_bullets.iter().enumerate() {
            if let Some(ei) = self
                .enemies
                .iter()
                .position(|e| bullet.body.intersects(&e.body))
            {
                self.enemies.remove(ei);
                spent.push(bi);
                self.score += POINTS_PER_ENEMY;
                log::debug!("enemy destroyed, score {}", self.score);
            }
        }
        for bi in spent.into_iter().rev() {
            self.player_bullets.remove(bi);
        }

        let player = self.player.body;
        let before = self.enemy_bullets.len() + self.enemies.len();
        self.enemy_bullets.retain(|b| !b.body.intersects(&player));
        self.enemies.retain(|e| !e.body.intersects(&player));
        let hits = before - (self.enemy_bullets.len() + self.enemies.len());
        if hits > 0 {
            self.player.lives = self.player.lives.saturating_sub(hits as u32);
            log::debug!("player hit {} time(s), {} lives left", hits, self.player.lives);
            if self.player.lives == 0 {
                self.phase = ShooterPhase::GameOver;
                log::info!("shooter over, final score {}", self.score);
            }
        }
    }

    fn apply_input(&mut self, input: &ShooterInput, now: Instant) {
        let body = &mut self.player.body;
        if input.left {
            body.x -= PLAYER_SPEED;
        }
        if input.right {
            body.x += PLAYER_SPEED;
        }
        if input.up {
            body.y -= PLAYER_SPEED;
        }
        if input.down {
            body.y += PLAYER_SPEED;
        }
        self.clamp_player();
        if input.shoot {
            self.try_shoot(now);
        }
    }

    fn clamp_player(&mut self) {
        let body = &mut self.player.body;
        body.x = body.x.clamp(0.0, self.config.field_width - body.w);
        body.y = body.y.clamp(0.0, self.config.field_height - body.h);
    }
}

fn spawn_player(config: &ShooterConfig) -> Player {
    Player {
        body: Body {
            x: (config.field_width - PLAYER_SIZE) / 2.0,
            y: config.field_height - PLAYER_BOTTOM_OFFSET,
            w: PLAYER_SIZE,
            h: PLAYER_SIZE,
        },
        lives: START_LIVES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> ShooterEngine {
        let config = ShooterConfig {
            seed: Some(9),
            ..ShooterConfig::default()
        };
        let mut s = ShooterEngine::new(config);
        s.start();
        s
    }

    fn enemy_at(x: f32, y: f32) -> Mover {
        Mover {
            body: Body {
                x,
                y,
                w: ENEMY_SIZE,
                h: ENEMY_SIZE,
            },
            speed: ENEMY_SPEED,
        }
    }

    fn bullet_at(x: f32, y: f32, speed: f32) -> Mover {
        Mover {
            body: Body {
                x,
                y,
                w: BULLET_WIDTH,
                h: BULLET_HEIGHT,
            },
            speed,
        }
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let a = Body { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
        let b = Body { x: 10.0, y: 0.0, w: 10.0, h: 10.0 };
        let c = Body { x: 9.0, y: 9.0, w: 10.0, h: 10.0 };
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
    }

    #[test]
    fn test_idle_engine_does_not_step() {
        let mut s = ShooterEngine::new(ShooterConfig::default());
        s.step(&ShooterInput { shoot: true, ..Default::default() }, Instant::now());
        assert!(s.player_bullets().is_empty());
        assert_eq!(s.phase(), ShooterPhase::Idle);
    }

    #[test]
    fn test_player_starts_centred_near_bottom() {
        let s = running();
        let p = s.player();
        assert_eq!(p.body.x, 215.0);
        assert_eq!(p.body.y, 540.0);
        assert_eq!(p.lives, START_LIVES);
    }

    #[test]
    fn test_player_clamped_to_field() {
        let mut s = running();
        let now = Instant::now();
        let left = ShooterInput { left: true, up: true, ..Default::default() };
        for _ in 0..500 {
            s.apply_input(&left, now);
        }
        assert_eq!((s.player.body.x, s.player.body.y), (0.0, 0.0));
        s.drag(10_000.0, 10_000.0);
        assert_eq!((s.player.body.x, s.player.body.y), (430.0, 590.0));
    }

    #[test]
    fn test_shot_cooldown() {
        let mut s = running();
        let now = Instant::now();
        assert!(s.try_shoot(now));
        assert!(!s.try_shoot(now + Duration::from_millis(150)));
        assert!(!s.try_shoot(now + Duration::from_millis(200)));
        assert!(s.try_shoot(now + Duration::from_millis(201)));
        assert_eq!(s.player_bullets().len(), 2);
    }

    #[test]
    fn test_bullet_fired_from_player_top_centre() {
        let mut s = running();
        s.try_shoot(Instant::now());
        let b = s.player_bullets()[0].body;
        assert_eq!((b.x, b.y), (240.0, 540.0));
    }

    #[test]
    fn test_bullet_destroys_enemy_and_scores() {
        let mut s = running();
        s.enemies.push(enemy_at(100.0, 100.0));
        s.enemies.push(enemy_at(300.0, 100.0));
        s.player_bullets.push(bullet_at(110.0, 120.0, PLAYER_BULLET_SPEED));
        s.resolve_collisions();
        assert_eq!(s.score(), POINTS_PER_ENEMY);
        assert_eq!(s.enemies().len(), 1);
        assert!(s.player_bullets().is_empty());
    }

    #[test]
    fn test_one_bullet_one_enemy() {
        let mut s = running();
        s.enemies.push(enemy_at(100.0, 100.0));
        s.enemies.push(enemy_at(102.0, 102.0));
        s.player_bullets.push(bullet_at(110.0, 120.0, PLAYER_BULLET_SPEED));
        s.resolve_collisions();
        assert_eq!(s.enemies().len(), 1);
        assert_eq!(s.score(), POINTS_PER_ENEMY);
    }

    #[test]
    fn test_enemy_bullet_costs_a_life() {
        let mut s = running();
        let p = s.player.body;
        s.enemy_bullets.push(bullet_at(p.x + 5.0, p.y + 5.0, ENEMY_BULLET_SPEED));
        s.resolve_collisions();
        assert_eq!(s.player().lives, START_LIVES - 1);
        assert!(s.enemy_bullets().is_empty());
    }

    #[test]
    fn test_ramming_enemy_costs_a_life() {
        let mut s = running();
        let p = s.player.body;
        s.enemies.push(enemy_at(p.x, p.y));
        s.resolve_collisions();
        assert_eq!(s.player().lives, START_LIVES - 1);
        assert!(s.enemies().is_empty());
        assert_eq!(s.score(), 0);
    }

    #[test]
    fn test_last_life_ends_game() {
        let mut s = running();
        s.player.lives = 1;
        let p = s.player.body;
        s.enemies.push(enemy_at(p.x, p.y));
        s.enemy_bullets.push(bullet_at(p.x, p.y, ENEMY_BULLET_SPEED));
        s.resolve_collisions();
        assert_eq!(s.player().lives, 0);
        assert_eq!(s.phase(), ShooterPhase::GameOver);
        let score = s.score();
        s.step(&ShooterInput::default(), Instant::now());
        assert_eq!(s.score(), score);
        assert!(!s.try_shoot(Instant::now()));
    }

    #[test]
    fn test_offscreen_entities_are_culled() {
        let mut s = running();
        s.enemies.push(enemy_at(0.0, 639.0));
        s.player_bullets.push(bullet_at(0.0, 5.0, PLAYER_BULLET_SPEED));
        s.enemy_bullets.push(bullet_at(0.0, 638.0, ENEMY_BULLET_SPEED));
        s.move_enemies();
        s.move_bullets();
        assert!(s.enemies().is_empty());
        assert!(s.player_bullets().is_empty());
        assert!(s.enemy_bullets().is_empty());
    }

    #[test]
    fn test_enemies_eventually_spawn_above_field() {
        let mut s = running();
        for _ in 0..2000 {
            s.spawn_enemy();
        }
        assert!(!s.enemies().is_empty());
        for e in s.enemies() {
            assert_eq!(e.body.y, -ENEMY_SIZE);
            assert!(e.body.x >= 0.0 && e.body.x <= 480.0 - ENEMY_SIZE);
        }
    }

    #[test]
    fn test_backdrop_wraps() {
        let mut s = running();
        s.player.lives = u32::MAX;
        let now = Instant::now();
        for _ in 0..320 {
            s.step(&ShooterInput::default(), now);
        }
        assert_eq!(s.backdrop_offset(), 0.0);
    }

    #[test]
    fn test_auto_fire_shoots_without_key() {
        let config = ShooterConfig {
            auto_fire: true,
            seed: Some(3),
            ..ShooterConfig::default()
        };
        let mut s = ShooterEngine::new(config);
        s.start();
        s.step(&ShooterInput::default(), Instant::now());
        assert_eq!(s.player_bullets().len(), 1);
    }
}
