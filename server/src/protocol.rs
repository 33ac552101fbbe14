//! Conversion from simulation state to the wire types in `pong_shared::protocol`.

pub use pong_shared::protocol::*;

use crate::state::{BallState, GameState, PlayerState};

impl From<&PlayerState> for PlayerWire {
    fn from(player: &PlayerState) -> Self {
        Self {
            pos: player.pos,
            vel: player.vel,
            health: player.health,
            score: player.score,
            hit_by: player.hit_by.map(|side| side.id()),
        }
    }
}

impl From<&BallState> for BallWire {
    fn from(ball: &BallState) -> Self {
        Self {
            pos: ball.pos,
            vel: ball.vel,
            last_refl: ball.last_reflector.map(|side| side.id()),
        }
    }
}

/// Immutable copy of the game state for broadcasting.
pub fn snapshot(state: &GameState) -> StateWire {
    StateWire {
        tick: state.tick,
        time: state.elapsed_ms(),
        pause_cd: state.pause_countdown,
        players: state.players.iter().map(PlayerWire::from).collect(),
        ball: BallWire::from(&state.ball),
    }
}
