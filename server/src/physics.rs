//! Ball and paddle integration plus the wall/paddle collision resolver.
//!
//! Every wall is resolved by the same routine: the ball is rotated into the wall's
//! canonical frame (wall at +x), tested against the owning paddle, reflected, and
//! rotated back.

use std::f64::consts::FRAC_1_SQRT_2;

use pong_shared::config::GameConfig;
use pong_shared::vec2::{add, length, normalize, rotate, scale, vec2, Vec2};
use rand::Rng;

use crate::input::InputEvent;
use crate::side::{Side, Wall};
use crate::state::{BallState, PlayerState};

/// Reflected |vy| may not exceed this multiple of |vx|
const MAX_DEFLECTION_RATIO: f64 = 2.5;

/// Random draws tried before falling back to a fixed launch direction
const LAUNCH_ATTEMPTS: usize = 8;

/// Blend the paddle's velocity toward the input direction and move it along its wall.
/// A paddle pushed into the end of its wall stops dead.
pub fn integrate_paddle(paddle: &mut PlayerState, input: Option<&InputEvent>, config: &GameConfig) {
    let dir = input.map_or(0.0, InputEvent::direction);
    let inertia = config.paddle_inertia;
    let new_vel = ((dir + paddle.vel * inertia) / (inertia + 1.0)).clamp(-1.0, 1.0);

    // trapezoidal step over one tick
    let moved =
        paddle.pos + (new_vel + paddle.vel) / 2.0 * config.tick_ms as f64 * config.paddle_speed;
    let limit = config.paddle_limit();
    let clamped = moved.clamp(-limit, limit);

    paddle.vel = if clamped != moved { 0.0 } else { new_vel };
    paddle.pos = clamped;
}

/// Move the ball one tick along its unit velocity.
pub fn integrate_ball(ball: &mut BallState, config: &GameConfig) {
    let step = config.tick_ms as f64 * config.ball_speed;
    ball.pos = add(ball.pos, scale(ball.vel, step));
}

/// Resolve all four walls, dominant axis first.
pub fn resolve_collisions(ball: &mut BallState, players: &mut [PlayerState], config: &GameConfig) {
    for wall in Wall::collision_order(ball.pos) {
        resolve_wall(ball, players, wall, config);
    }
}

/// Test one wall in its canonical frame. Paddle logic runs only when the wall's owner
/// exists and still has health; the reflection off the wall itself always applies.
pub fn resolve_wall(
    ball: &mut BallState,
    players: &mut [PlayerState],
    wall: Wall,
    config: &GameConfig,
) {
    let turn = wall.turn();
    let mut pos = rotate(ball.pos, turn);
    let mut vel = rotate(ball.vel, turn);

    let owner = wall.owner();
    if players.get(owner.index()).is_some_and(PlayerState::has_health) {
        vel = paddle_collision(
            &mut pos,
            vel,
            owner,
            &mut ball.last_reflector,
            players,
            config,
        );
    }

    let half = config.half_size();
    if pos.x >= half {
        pos.x = 2.0 * half - pos.x;
        vel.x = -vel.x;
    }

    let back = turn.inverse();
    ball.pos = rotate(pos, back);
    ball.vel = rotate(vel, back);
}

/// Canonical-frame paddle test for the wall at +x. Returns the velocity after the paddle
/// step; the wall reflection is applied by the caller.
fn paddle_collision(
    pos: &mut Vec2,
    vel: Vec2,
    owner: Side,
    last_reflector: &mut Option<Side>,
    players: &mut [PlayerState],
    config: &GameConfig,
) -> Vec2 {
    let half = config.half_size();
    let Some(paddle) = players.get_mut(owner.index()) else {
        return vel;
    };
    paddle.hit_by = None;
    // A ball moving parallel to the wall has no crossing point and is not crossing it.
    if pos.x < half || vel.x == 0.0 {
        return vel;
    }

    // where along the wall the ball crossed
    pos.y += (half - pos.x) / vel.x * vel.y;

    let paddle_vel = paddle.vel;
    let hdist = (pos.y - paddle.pos) / (config.paddle_size / 2.0);

    if hdist.abs() > 1.0 {
        if let Some(reflector) = *last_reflector {
            if let Some(scorer) = players.get_mut(reflector.index()) {
                if reflector != owner {
                    scorer.score += 1;
                } else {
                    scorer.score -= 1;
                }
            }
            if let Some(paddle) = players.get_mut(owner.index()) {
                paddle.hit_by = Some(reflector);
            }
        }
        if let Some(paddle) = players.get_mut(owner.index()) {
            paddle.lose_health();
        }
        return vel;
    }

    *last_reflector = Some(owner);
    let limit = MAX_DEFLECTION_RATIO * vel.x.abs();
    let mut vy = vel.y + paddle_vel * config.paddle_friction;
    if vy.abs() > limit {
        vy = limit.copysign(vy);
    }
    normalize(vec2(vel.x, vy))
}

/// Random launch direction, uniform per axis then normalized.
pub fn launch_direction(rng: &mut impl Rng) -> Vec2 {
    launch_direction_from(|| vec2(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0)))
}

/// Normalize the first non-degenerate draw, or fall back to the diagonal.
pub fn launch_direction_from(mut draw: impl FnMut() -> Vec2) -> Vec2 {
    for _ in 0..LAUNCH_ATTEMPTS {
        let v = draw();
        if length(v) > 1e-9 {
            return normalize(v);
        }
    }
    vec2(FRAC_1_SQRT_2, FRAC_1_SQRT_2)
}
