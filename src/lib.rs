//! Ballpit - balls bouncing in a box against a rotating paddle
//!
//! Core modules:
//! - `fixed`: Deterministic fixed-point numbers used for all simulation state
//! - `matrix`: 2x2 linear transforms for sprites and paddle geometry
//! - `sim`: Deterministic simulation (physics, collisions, game state)
//! - `renderer`: Batched sprite rendering on wgpu
//! - `game`: Per-frame driver tying simulation to the sprite batch
//! - `platform`: Window, event loop and keyboard state
//! - `settings`: Data-driven configuration

pub mod fixed;
pub mod game;
pub mod matrix;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use fixed::{Fixed, Fixed0_32, Fixed8_24, Fixed16_16, Fixed24_8, Fixed32_0};
pub use game::Game;
pub use settings::Settings;

/// Physics tuning constants (one tick = one main-loop iteration)
pub mod consts {
    use crate::fixed::{Fixed8_24, Fixed16_16, Fixed24_8};

    /// Ball radius in pixels (16x16 sprite)
    pub const BALL_RADIUS: Fixed24_8 = Fixed24_8::const_int(8);
    /// Radius of the two paddle end spheres
    pub const PADDLE_RADIUS: Fixed24_8 = Fixed24_8::const_int(8);
    /// Horizontal offset of each paddle sphere from the paddle centre
    pub const PADDLE_HALF_SPAN: f32 = 24.0;
    /// Paddle centre distance from the arena bottom
    pub const PADDLE_FLOOR_OFFSET: i32 = 32;

    /// Downward acceleration added to every ball each tick (1/8 px/tick²)
    pub const GRAVITY: Fixed16_16 = Fixed16_16::from_raw(1 << 13);

    /// Paddle horizontal speed while a direction is held (px/tick)
    pub const PADDLE_SPEED: Fixed24_8 = Fixed24_8::const_int(4);
    /// Rotation change per tick while a direction is held (degrees)
    pub const PADDLE_ROTATION_RATE: Fixed8_24 = Fixed8_24::const_int(2);
    /// Rotation eased back toward level per tick with no input (degrees)
    pub const PADDLE_ROTATION_RETURN: Fixed8_24 = Fixed8_24::const_int(1);
    /// Rotation limit in either direction (degrees)
    pub const PADDLE_MAX_ROTATION: Fixed8_24 = Fixed8_24::const_int(30);

    /// Ball–ball restitution
    pub const BOUNCE: f32 = 0.9;
    /// Tangential velocity retained in ball–ball contacts
    pub const FRICTION: f32 = 1.0;

    /// Ticks between dynamic spawns
    pub const SPAWN_INTERVAL: u32 = 300;
    /// Height of spawned balls below the arena top
    pub const SPAWN_Y: i32 = 32;
    /// Spawns stay this far from the side walls
    pub const SPAWN_MARGIN: i32 = 32;

    /// Largest initial speed per axis (px/tick)
    pub const INITIAL_SPEED: i32 = 4;
}

/// Move `value` toward `target` by at most `step` without overshooting
pub fn step_towards<T>(value: T, target: T, step: T) -> T
where
    T: Copy + PartialOrd + std::ops::Add<Output = T> + std::ops::Sub<Output = T>,
{
    if value < target {
        let next = value + step;
        if next > target { target } else { next }
    } else if value > target {
        let next = value - step;
        if next < target { target } else { next }
    } else {
        value
    }
}

/// Clamp `value` into `[min, max]`
pub fn clamp<T: PartialOrd>(min: T, value: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
