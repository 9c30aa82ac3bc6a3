//! Collision detection and response
//!
//! Boundary tests run in fixed point. Ball–ball and ball–paddle contacts
//! decompose velocities in float (`glam::Vec2`) and write the result back to
//! fixed point before returning, so no float state survives a call.
//!
//! Every resolved contact appends a marker to the caller's [`DebugMarkers`].

use glam::Vec2;

use super::state::{Arena, Ball, Paddle};
use crate::consts::*;
use crate::fixed::Fixed24_8;

/// Below this, a separation vector is treated as zero length
const MIN_SEPARATION: f32 = 1e-4;

/// What produced a debug marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Wall,
    Ball,
    Paddle,
}

/// A contact point recorded during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugMarker {
    pub pos: Vec2,
    pub kind: MarkerKind,
}

/// Contact points collected over one tick, drained by the renderer
#[derive(Debug, Clone, Default)]
pub struct DebugMarkers {
    markers: Vec<DebugMarker>,
}

impl DebugMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, pos: Vec2, kind: MarkerKind) {
        self.markers.push(DebugMarker { pos, kind });
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DebugMarker> {
        self.markers.iter()
    }

    pub fn count(&self, kind: MarkerKind) -> usize {
        self.markers.iter().filter(|m| m.kind == kind).count()
    }
}

/// Reflect velocity off a surface: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Unit vector along `delta`, or `fallback` when `delta` is (nearly) zero
#[inline]
fn normal_or(delta: Vec2, length: f32, fallback: Vec2) -> Vec2 {
    if length > MIN_SEPARATION {
        delta / length
    } else {
        fallback
    }
}

/// Bounce a ball off the left, right and bottom walls.
///
/// A penetrating ball is clamped to touch the wall and the velocity component
/// normal to that wall is negated. The top is open.
pub fn ball_boundary_collision(ball: &mut Ball, arena: &Arena, markers: &mut DebugMarkers) -> bool {
    let r = BALL_RADIUS;
    let zero = Fixed24_8::default();
    let mut hit = false;

    if ball.x - r < zero {
        ball.x = r;
        ball.vx = -ball.vx;
        markers.push(Vec2::new(0.0, ball.y.to_f32()), MarkerKind::Wall);
        hit = true;
    }
    if ball.x + r > arena.width {
        ball.x = arena.width - r;
        ball.vx = -ball.vx;
        markers.push(Vec2::new(arena.width.to_f32(), ball.y.to_f32()), MarkerKind::Wall);
        hit = true;
    }
    if ball.y + r > arena.height {
        ball.y = arena.height - r;
        ball.vy = -ball.vy;
        markers.push(Vec2::new(ball.x.to_f32(), arena.height.to_f32()), MarkerKind::Wall);
        hit = true;
    }

    hit
}

/// Resolve an overlapping pair of balls.
///
/// Both balls move apart along the centre line by half the overlap each.
/// Velocity components along the normal are exchanged with restitution
/// `BOUNCE`; tangential components are scaled by `FRICTION` and kept.
pub fn ball_ball_collision(a: &mut Ball, b: &mut Ball, markers: &mut DebugMarkers) -> bool {
    let radius = BALL_RADIUS.to_f32();
    let pa = a.pos();
    let pb = b.pos();

    let delta = pb - pa;
    let dist = delta.length();
    if dist >= 2.0 * radius {
        return false;
    }

    // Coincident centres have no defined axis; separate horizontally
    let normal = normal_or(delta, dist, Vec2::X);
    let correction = normal * ((2.0 * radius - dist) * 0.5);
    let new_pa = pa - correction;
    let new_pb = pb + correction;

    let va = a.vel();
    let vb = b.vel();
    let va_par = normal * va.dot(normal);
    let vb_par = normal * vb.dot(normal);
    let va_perp = va - va_par;
    let vb_perp = vb - vb_par;

    let transferred = (1.0 + BOUNCE) * 0.5;
    let retained = (1.0 - BOUNCE) * 0.5;
    let new_va = va_par * retained + vb_par * transferred + va_perp * FRICTION;
    let new_vb = vb_par * retained + va_par * transferred + vb_perp * FRICTION;
    debug_assert!(new_va.is_finite() && new_vb.is_finite());

    a.set_pos(new_pa);
    b.set_pos(new_pb);
    a.set_vel(new_va);
    b.set_vel(new_vb);

    markers.push(new_pa + normal * radius, MarkerKind::Ball);
    true
}

/// Resolve every unordered pair once, in index order (`i < j`).
///
/// The slice length is fixed for the duration of the pass.
pub fn resolve_ball_pairs(balls: &mut [Ball], markers: &mut DebugMarkers) -> usize {
    let mut contacts = 0;
    for i in 0..balls.len() {
        let (head, tail) = balls.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if ball_ball_collision(a, b, markers) {
                contacts += 1;
            }
        }
    }
    contacts
}

/// Bounce a ball off the paddle capsule.
///
/// The ball centre is projected onto the segment between the two rotated end
/// spheres. Inside reach, the ball is pushed out along the separating normal
/// and the normal component of its velocity is inverted.
pub fn ball_paddle_collision(ball: &mut Ball, paddle: &Paddle, markers: &mut DebugMarkers) -> bool {
    let center = paddle.pos();
    let (left, right) = paddle.sphere_offsets();
    let segment = right - left;

    let rel = ball.pos() - center;
    let t = ((rel - left).dot(segment) / segment.length_squared()).clamp(0.0, 1.0);
    let closest = left + segment * t;

    let delta = rel - closest;
    let dist = delta.length();
    let reach = (BALL_RADIUS + PADDLE_RADIUS).to_f32();
    if dist >= reach {
        return false;
    }

    // Centre on the segment: push out of the paddle's upper face
    let up = Vec2::new(segment.y, -segment.x).normalize_or(Vec2::NEG_Y);
    let normal = normal_or(delta, dist, up);

    let contact = center + closest + normal * PADDLE_RADIUS.to_f32();
    ball.set_pos(center + closest + normal * reach);
    let vel = reflect_velocity(ball.vel(), normal);
    debug_assert!(vel.is_finite());
    ball.set_vel(vel);

    markers.push(contact, MarkerKind::Paddle);
    true
}
