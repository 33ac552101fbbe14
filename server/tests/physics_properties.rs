//! Property tests for the collision resolver and paddle integration.

use pong_server::input::InputEvent;
use pong_server::physics::{integrate_ball, integrate_paddle, resolve_collisions};
use pong_server::side::Side;
use pong_server::state::{BallState, GameState, PlayerState};
use pong_shared::config::GameConfig;
use pong_shared::vec2::{length, normalize, vec2};
use proptest::prelude::*;

fn config(n_players: u8, paddle_size: f64, friction: f64) -> GameConfig {
    let mut config = GameConfig::with_players(n_players);
    config.paddle_size = paddle_size;
    config.paddle_friction = friction;
    config.starting_health = Some(3);
    config
}

fn input(seq: u64, dir: i8) -> InputEvent {
    InputEvent {
        seq,
        time: 0,
        up: dir > 0,
        down: dir < 0,
    }
}

proptest! {
    #[test]
    fn ball_speed_is_unit_after_collisions(
        n_players in 2u8..=4,
        x in -70_000.0f64..70_000.0,
        y in -70_000.0f64..70_000.0,
        angle in 0.0f64..std::f64::consts::TAU,
        paddle_pos in -20_000.0f64..20_000.0,
        paddle_vel in -1.0f64..1.0,
        friction in -5.0f64..5.0,
    ) {
        let cfg = config(n_players, 17_000.0, friction);
        let mut players: Vec<PlayerState> = (0..n_players)
            .map(|_| PlayerState { pos: paddle_pos, vel: paddle_vel, ..PlayerState::new(Some(3)) })
            .collect();
        let dir = vec2(angle.cos(), angle.sin());
        prop_assume!(dir.x.abs() > 1e-6 && dir.y.abs() > 1e-6);
        let mut ball = BallState {
            pos: vec2(x, y),
            vel: normalize(dir),
            last_reflector: Some(Side::Zero),
        };

        resolve_collisions(&mut ball, &mut players, &cfg);

        prop_assert!((length(ball.vel) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn paddles_stay_on_their_wall(
        paddle_size in 4_000.0f64..60_000.0,
        dirs in proptest::collection::vec(-1i8..=1, 1..400),
    ) {
        let cfg = config(2, paddle_size, 1.4);
        let limit = cfg.half_size() - paddle_size / 2.0;
        let mut paddle = PlayerState::new(None);
        for (seq, dir) in dirs.into_iter().enumerate() {
            integrate_paddle(&mut paddle, Some(&input(seq as u64, dir)), &cfg);
            prop_assert!(paddle.pos.abs() <= limit);
            prop_assert!(paddle.vel.abs() <= 1.0);
        }
    }

    #[test]
    fn long_rallies_keep_unit_speed(
        angle in 0.0f64..std::f64::consts::TAU,
        ticks in 1usize..2_000,
    ) {
        let cfg = config(4, 17_000.0, 1.4);
        let mut state = GameState::new(&cfg);
        let dir = vec2(angle.cos(), angle.sin());
        prop_assume!(dir.x.abs() > 1e-6 && dir.y.abs() > 1e-6);
        state.ball.vel = normalize(dir);
        let mut last_tick_scores: i32 = 0;

        for _ in 0..ticks {
            integrate_ball(&mut state.ball, &cfg);
            resolve_collisions(&mut state.ball, &mut state.players, &cfg);
            prop_assert!((length(state.ball.vel) - 1.0).abs() < 1e-9);

            // one point at most per wall
            let total: i32 = state.players.iter().map(|p| p.score).sum();
            prop_assert!((total - last_tick_scores).abs() <= 4);
            last_tick_scores = total;
        }
    }
}
