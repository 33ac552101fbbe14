//! Match outcome: winner selection and delivery to the result collaborator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::protocol::{EndReason, MatchResult};
use crate::side::Side;
use crate::state::{GameState, PlayerState};

/// Pick the winning side, or None for a draw.
///
/// With a last-standing end the only paddle with health left wins. Otherwise (or if
/// no paddle has health left) the unique top score wins.
pub fn decide_winner(reason: EndReason, players: &[PlayerState]) -> Option<Side> {
    if reason == EndReason::LastStanding {
        let mut standing = players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.has_health())
            .map(|(i, _)| i);
        if let (Some(i), None) = (standing.next(), standing.next()) {
            return Side::from_index(i);
        }
    }

    let best = players.iter().map(|p| p.score).max()?;
    let mut leaders = players
        .iter()
        .enumerate()
        .filter(|(_, p)| p.score == best)
        .map(|(i, _)| i);
    match (leaders.next(), leaders.next()) {
        (Some(i), None) => Side::from_index(i),
        _ => None,
    }
}

pub fn build_result(
    reason: EndReason,
    state: &GameState,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> MatchResult {
    let winner = decide_winner(reason, &state.players);
    MatchResult {
        reason,
        winner: winner.map(Side::id),
        draw: winner.is_none(),
        scores: state.players.iter().map(|p| p.score).collect(),
        health: state.players.iter().map(|p| p.health).collect(),
        ticks: state.tick,
        duration_ms: state.elapsed_ms(),
        started_at: started_at.timestamp_millis(),
        ended_at: ended_at.timestamp_millis(),
    }
}

/// Receives every finished match exactly once.
pub trait ResultSink: Send + Sync {
    fn report(&self, session_id: Uuid, result: &MatchResult);
}

/// Writes results to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogResultSink;

impl ResultSink for LogResultSink {
    fn report(&self, session_id: Uuid, result: &MatchResult) {
        tracing::info!(
            session = %session_id,
            reason = ?result.reason,
            winner = ?result.winner,
            draw = result.draw,
            scores = ?result.scores,
            ticks = result.ticks,
            duration_ms = result.duration_ms,
            "Match finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_shared::config::GameConfig;
    use std::time::Duration;

    fn players(scores: &[i32], health: &[Option<i32>]) -> Vec<PlayerState> {
        scores
            .iter()
            .zip(health)
            .map(|(&score, &health)| PlayerState {
                score,
                health,
                ..PlayerState::new(None)
            })
            .collect()
    }

    #[test]
    fn top_score_wins() {
        let p = players(&[3, 7], &[None, None]);
        assert_eq!(decide_winner(EndReason::PointsTarget, &p), Some(Side::One));
    }

    #[test]
    fn tied_top_score_is_draw() {
        let p = players(&[4, 4, 1], &[None, None, None]);
        assert_eq!(decide_winner(EndReason::TimeLimit, &p), None);
    }

    #[test]
    fn last_standing_beats_higher_score() {
        let p = players(&[9, 0, 5, 2], &[Some(0), Some(0), Some(1), Some(0)]);
        assert_eq!(decide_winner(EndReason::LastStanding, &p), Some(Side::Two));
    }

    #[test]
    fn nobody_standing_falls_back_to_score() {
        let p = players(&[1, 2], &[Some(0), Some(0)]);
        assert_eq!(decide_winner(EndReason::LastStanding, &p), Some(Side::One));
    }

    #[test]
    fn result_carries_final_state() {
        let mut config = GameConfig::with_players(2);
        config.starting_health = Some(3);
        let mut state = GameState::new(&config);
        state.tick = 500;
        state.elapsed = Duration::from_millis(10_000);
        state.players[0].score = 7;
        state.players[1].health = Some(1);

        let started = Utc::now();
        let ended = started + chrono::Duration::milliseconds(10_000);
        let result = build_result(EndReason::PointsTarget, &state, started, ended);

        assert_eq!(result.winner, Some(0));
        assert!(!result.draw);
        assert_eq!(result.scores, vec![7, 0]);
        assert_eq!(result.health, vec![Some(3), Some(1)]);
        assert_eq!(result.ticks, 500);
        assert_eq!(result.duration_ms, 10_000);
        assert_eq!(result.ended_at - result.started_at, 10_000);
    }
}
