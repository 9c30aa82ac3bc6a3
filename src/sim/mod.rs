//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One fixed step per main-loop iteration
//! - Seeded RNG only
//! - Fixed-point state; floats only inside a single collision computation
//! - Stable pair order (`i < j`) for ball–ball resolution
//! - No rendering or platform dependencies

pub mod collision;
pub mod state;
pub mod tick;

pub use collision::{
    DebugMarker, DebugMarkers, MarkerKind, ball_ball_collision, ball_boundary_collision,
    ball_paddle_collision, reflect_velocity, resolve_ball_pairs,
};
pub use state::{Arena, Ball, GameState, Paddle};
pub use tick::{TickInput, tick, update_paddle, update_spawn_timer};
