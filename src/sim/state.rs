//! Game state and core simulation types
//!
//! Positions are 24.8 fixed point in arena pixels (origin top-left, y down),
//! velocities 16.16 in pixels per tick, paddle rotation 8.24 degrees.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::fixed::{Fixed8_24, Fixed16_16, Fixed24_8, vec2};
use crate::matrix::SpriteMatrix;
use crate::settings::Settings;

/// Playfield bounds. Balls collide with the left, right and bottom edges;
/// the top is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arena {
    pub width: Fixed24_8,
    pub height: Fixed24_8,
}

impl Arena {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width: Fixed24_8::from_int(width),
            height: Fixed24_8::from_int(height),
        }
    }
}

/// A ball entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ball {
    pub x: Fixed24_8,
    pub y: Fixed24_8,
    pub vx: Fixed16_16,
    pub vy: Fixed16_16,
}

impl Ball {
    /// Ball at rest at `(x, y)`
    pub fn new(x: Fixed24_8, y: Fixed24_8) -> Self {
        Self {
            x,
            y,
            vx: Fixed16_16::default(),
            vy: Fixed16_16::default(),
        }
    }

    pub fn with_velocity(mut self, vx: Fixed16_16, vy: Fixed16_16) -> Self {
        self.vx = vx;
        self.vy = vy;
        self
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    #[inline]
    pub fn vel(&self) -> Vec2 {
        vec2(self.vx, self.vy)
    }

    /// Store a float position (truncates to 1/256 px)
    pub fn set_pos(&mut self, pos: Vec2) {
        self.x = Fixed24_8::from_f32(pos.x);
        self.y = Fixed24_8::from_f32(pos.y);
    }

    /// Store a float velocity (truncates to 1/65536 px/tick)
    pub fn set_vel(&mut self, vel: Vec2) {
        self.vx = Fixed16_16::from_f32(vel.x);
        self.vy = Fixed16_16::from_f32(vel.y);
    }

    /// Add gravity to the velocity, then move by it
    pub fn integrate(&mut self) {
        self.vy += GRAVITY;
        self.x += self.vx.convert();
        self.y += self.vy.convert();
    }
}

/// The player's paddle: a capsule between two spheres at ±`PADDLE_HALF_SPAN`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paddle {
    pub x: Fixed24_8,
    pub y: Fixed24_8,
    /// Degrees, positive turns clockwise on screen
    pub rotation: Fixed8_24,
}

impl Paddle {
    /// Level paddle centred horizontally near the arena floor
    pub fn new(arena: &Arena) -> Self {
        let half_width = Fixed24_8::from_raw(arena.width.raw() / 2);
        Self {
            x: half_width,
            y: arena.height - Fixed24_8::from_int(PADDLE_FLOOR_OFFSET),
            rotation: Fixed8_24::default(),
        }
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        vec2(self.x, self.y)
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation.to_f32()
    }

    /// Current orientation as a sprite matrix
    pub fn matrix(&self) -> SpriteMatrix {
        SpriteMatrix::from_rotation(self.rotation_degrees())
    }

    /// End-sphere centres relative to the paddle centre
    pub fn sphere_offsets(&self) -> (Vec2, Vec2) {
        let m = self.matrix();
        (
            m.transform(Vec2::new(-PADDLE_HALF_SPAN, 0.0)),
            m.transform(Vec2::new(PADDLE_HALF_SPAN, 0.0)),
        )
    }
}

/// Complete simulation state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    pub arena: Arena,
    pub paddle: Paddle,
    /// Insertion order is render order only
    pub balls: Vec<Ball>,
    /// Ticks until the next spawn
    pub spawn_timer: u32,
    pub spawn_interval: u32,
    /// Spawns are skipped at this many balls
    pub max_balls: usize,
    /// Simulation tick counter
    pub time_ticks: u64,
    rng: Pcg32,
}

impl GameState {
    /// Build the starting state: paddle plus `settings.initial_balls` balls
    /// with random positions in the upper half and random velocities.
    pub fn new(settings: &Settings) -> Self {
        let mut state = Self::empty(settings.width as i32, settings.height as i32, settings.seed);
        state.spawn_interval = settings.spawn_interval.max(1);
        state.spawn_timer = state.spawn_interval;
        state.max_balls = settings.max_balls as usize;

        for _ in 0..settings.initial_balls {
            let ball = state.random_ball();
            state.balls.push(ball);
        }

        log::info!(
            "Game state: {}x{} arena, {} balls, seed {:#x}",
            settings.width,
            settings.height,
            state.balls.len(),
            settings.seed
        );

        state
    }

    /// Arena with a level paddle and no balls
    pub fn empty(width: i32, height: i32, seed: u64) -> Self {
        let arena = Arena::new(width, height);
        Self {
            arena,
            paddle: Paddle::new(&arena),
            balls: Vec::new(),
            spawn_timer: SPAWN_INTERVAL,
            spawn_interval: SPAWN_INTERVAL,
            max_balls: usize::MAX,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Append a resting ball at a random x in the spawn band near the top.
    /// Returns false when the ball cap is reached.
    pub fn spawn_ball(&mut self) -> bool {
        if self.balls.len() >= self.max_balls {
            log::debug!("Spawn skipped: {} balls at cap", self.balls.len());
            return false;
        }
        let x = self.random_spawn_x();
        let ball = Ball::new(x, Fixed24_8::from_int(SPAWN_Y));
        log::debug!("Spawned ball {} at x={}", self.balls.len(), x);
        self.balls.push(ball);
        true
    }

    fn random_spawn_x(&mut self) -> Fixed24_8 {
        let lo = Fixed24_8::from_int(SPAWN_MARGIN).raw();
        let hi = (self.arena.width - Fixed24_8::from_int(SPAWN_MARGIN)).raw();
        Fixed24_8::from_raw(self.rng.random_range(lo..hi.max(lo + 1)))
    }

    fn random_ball(&mut self) -> Ball {
        let x = self.random_spawn_x();

        let top = Fixed24_8::from_int(SPAWN_Y).raw();
        let middle = self.arena.height.raw() / 2;
        let y = Fixed24_8::from_raw(self.rng.random_range(top..middle.max(top + 1)));

        let speed = Fixed16_16::from_int(INITIAL_SPEED).raw();
        let vx = Fixed16_16::from_raw(self.rng.random_range(-speed..speed));
        let vy = Fixed16_16::from_raw(self.rng.random_range(-speed..speed));

        Ball::new(x, y).with_velocity(vx, vy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_from_settings() {
        let settings = Settings {
            initial_balls: 5,
            ..Default::default()
        };
        let state = GameState::new(&settings);
        assert_eq!(state.balls.len(), 5);
        assert_eq!(state.spawn_timer, settings.spawn_interval);

        let r = BALL_RADIUS;
        for ball in &state.balls {
            assert!(ball.x - r >= Fixed24_8::default());
            assert!(ball.x + r <= state.arena.width);
            assert!(ball.y < Fixed24_8::from_raw(state.arena.height.raw() / 2));
        }
    }

    #[test]
    fn test_same_seed_same_balls() {
        let settings = Settings::default();
        let a = GameState::new(&settings);
        let b = GameState::new(&settings);
        assert_eq!(a.balls, b.balls);

        let other = GameState::new(&Settings {
            seed: settings.seed + 1,
            ..settings
        });
        assert_ne!(a.balls, other.balls);
    }

    #[test]
    fn test_spawn_ball_at_rest_near_top() {
        let mut state = GameState::empty(320, 240, 7);
        assert!(state.spawn_ball());
        let ball = state.balls[0];
        assert_eq!(ball.y, Fixed24_8::from_int(SPAWN_Y));
        assert_eq!(ball.vel(), Vec2::ZERO);
        assert!(ball.x >= Fixed24_8::from_int(SPAWN_MARGIN));
        assert!(ball.x < Fixed24_8::from_int(320 - SPAWN_MARGIN));
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut state = GameState::empty(320, 240, 7);
        state.max_balls = 1;
        assert!(state.spawn_ball());
        assert!(!state.spawn_ball());
        assert_eq!(state.balls.len(), 1);
    }

    #[test]
    fn test_ball_integrate() {
        let mut ball = Ball::new(Fixed24_8::from_int(10), Fixed24_8::from_int(10))
            .with_velocity(Fixed16_16::from_int(1), Fixed16_16::default());
        ball.integrate();
        assert_eq!(ball.vy, GRAVITY);
        assert_eq!(ball.x, Fixed24_8::from_int(11));
        // 1/8 px in 24.8 is raw 32
        assert_eq!(ball.y.raw(), (10 << 8) + 32);
    }

    #[test]
    fn test_paddle_spheres_follow_rotation() {
        let mut paddle = Paddle::new(&Arena::new(320, 240));
        assert_eq!(paddle.x, Fixed24_8::from_int(160));
        assert_eq!(paddle.y, Fixed24_8::from_int(240 - PADDLE_FLOOR_OFFSET));

        let (left, right) = paddle.sphere_offsets();
        assert_eq!(left, Vec2::new(-PADDLE_HALF_SPAN, 0.0));
        assert_eq!(right, Vec2::new(PADDLE_HALF_SPAN, 0.0));

        paddle.rotation = Fixed8_24::from_int(90);
        let (_, right) = paddle.sphere_offsets();
        assert!((right - Vec2::new(0.0, PADDLE_HALF_SPAN)).length() < 1e-3);
    }
}
