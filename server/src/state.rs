use std::time::Duration;

use pong_shared::config::GameConfig;
use pong_shared::protocol::EndReason;
use pong_shared::vec2::Vec2;

use crate::input::InputEvent;
use crate::physics;
use crate::side::Side;

/// Paddle and scoring state of one side. Never removed while the session lives.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    /// Paddle centre along its wall, in that wall's canonical frame
    pub pos: f64,
    /// Normalized paddle velocity in [-1, 1]
    pub vel: f64,
    /// None means unlimited
    pub health: Option<i32>,
    pub score: i32,
    /// Side credited with this paddle's most recent miss
    pub hit_by: Option<Side>,
}

impl PlayerState {
    pub fn new(starting_health: Option<u32>) -> Self {
        Self {
            pos: 0.0,
            vel: 0.0,
            health: starting_health.map(|h| h as i32),
            score: 0,
            hit_by: None,
        }
    }

    /// Whether the paddle still defends its wall
    pub fn has_health(&self) -> bool {
        self.health.map_or(true, |h| h > 0)
    }

    pub fn is_out(&self) -> bool {
        !self.has_health()
    }

    pub fn lose_health(&mut self) {
        if let Some(health) = self.health.as_mut() {
            *health -= 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BallState {
    pub pos: Vec2,
    /// Unit length once launched, zero during the countdown
    pub vel: Vec2,
    /// Last side that legally returned the ball
    pub last_reflector: Option<Side>,
}

impl Default for BallState {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            last_reflector: None,
        }
    }
}

/// Simulation state of one session, owned by that session's task.
#[derive(Debug, Clone)]
pub struct GameState {
    /// Non-paused ticks simulated so far
    pub tick: u64,
    /// Wall-clock time accumulated by the scheduler
    pub elapsed: Duration,
    /// Ticks left before the ball is launched
    pub pause_countdown: u32,
    /// Indexed by side
    pub players: Vec<PlayerState>,
    pub ball: BallState,
}

impl GameState {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            tick: 0,
            elapsed: Duration::ZERO,
            pause_countdown: config.pause_countdown_ticks(),
            players: (0..config.n_players)
                .map(|_| PlayerState::new(config.starting_health))
                .collect(),
            ball: BallState::default(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed.as_millis() as u64
    }

    /// Advance one simulated tick: paddles first, then the ball and its collisions.
    /// `inputs` holds the newest input per side, indexed by side.
    pub fn step(&mut self, inputs: &[Option<InputEvent>], config: &GameConfig) {
        for (i, paddle) in self.players.iter_mut().enumerate() {
            let input = inputs.get(i).and_then(Option::as_ref);
            physics::integrate_paddle(paddle, input, config);
        }
        physics::integrate_ball(&mut self.ball, config);
        physics::resolve_collisions(&mut self.ball, &mut self.players, config);
    }

    /// Why the match should end now, if it should.
    pub fn end_reason(&self, config: &GameConfig) -> Option<EndReason> {
        let out = self.players.iter().filter(|p| p.is_out()).count();
        let best = self.players.iter().map(|p| p.score).max().unwrap_or(0);

        if out + 1 >= config.n_players as usize {
            return Some(EndReason::LastStanding);
        }
        if let Some(target) = config.points_target {
            if best >= target as i32 {
                return Some(EndReason::PointsTarget);
            }
        }
        if self.elapsed_ms() >= config.time_limit_ms {
            return Some(EndReason::TimeLimit);
        }
        None
    }
}
