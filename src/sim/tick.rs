//! Fixed timestep simulation tick
//!
//! One call advances the game by one main-loop iteration:
//! paddle control → spawn timer → ball integration → walls → ball pairs → paddle.

use super::collision::{DebugMarkers, ball_boundary_collision, ball_paddle_collision, resolve_ball_pairs};
use super::state::{GameState, Paddle};
use crate::consts::*;
use crate::fixed::{Fixed8_24, Fixed24_8};
use crate::{clamp, step_towards};

/// Input for a single tick. Level-triggered: `true` while the key is held.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
}

impl TickInput {
    /// Signed direction: -1 left, +1 right, 0 for none or both
    pub fn direction(&self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, markers: &mut DebugMarkers) {
    state.time_ticks += 1;

    update_paddle(&mut state.paddle, input);

    // Spawn before physics so a new ball is separated on its first tick
    update_spawn_timer(state);

    for ball in &mut state.balls {
        ball.integrate();
    }

    for ball in &mut state.balls {
        ball_boundary_collision(ball, &state.arena, markers);
    }

    resolve_ball_pairs(&mut state.balls, markers);

    for ball in &mut state.balls {
        ball_paddle_collision(ball, &state.paddle, markers);
    }
}

/// Count down and spawn a ball when the timer expires
pub fn update_spawn_timer(state: &mut GameState) {
    state.spawn_timer = state.spawn_timer.saturating_sub(1);
    if state.spawn_timer == 0 {
        state.spawn_ball();
        state.spawn_timer = state.spawn_interval;
    }
}

/// Apply held directions to paddle position and rotation.
///
/// While a direction is held the paddle tilts toward it up to
/// `PADDLE_MAX_ROTATION`; with no input it eases back to level.
pub fn update_paddle(paddle: &mut Paddle, input: &TickInput) {
    let (speed, rotation_delta) = match input.direction() {
        d if d < 0 => (-PADDLE_SPEED, -PADDLE_ROTATION_RATE),
        d if d > 0 => (PADDLE_SPEED, PADDLE_ROTATION_RATE),
        _ => (Fixed24_8::default(), Fixed8_24::default()),
    };

    paddle.rotation = if rotation_delta == Fixed8_24::default() {
        step_towards(paddle.rotation, Fixed8_24::default(), PADDLE_ROTATION_RETURN)
    } else {
        clamp(
            -PADDLE_MAX_ROTATION,
            paddle.rotation + rotation_delta,
            PADDLE_MAX_ROTATION,
        )
    };

    paddle.x += speed;
}
