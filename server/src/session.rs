//! One match: lifecycle, side assignment, input ingestion and the tick body.
//!
//! A `Session` is owned by a single task (see `game_loop`), so none of its methods
//! need synchronization.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use pong_shared::config::GameConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use crate::broadcast::{Broadcaster, ConnId, Connection};
use crate::error::JoinError;
use crate::input::{InputEvent, InputPipeline};
use crate::physics;
use crate::protocol::{
    self, GameEndMsg, GameJoinMsg, GameWaitMsg, MatchResult, ServerMsg, PROTOCOL_VERSION,
};
use crate::result;
use crate::side::Side;
use crate::state::GameState;

pub type SessionId = Uuid;
/// Opaque player identity behind a join credential.
pub type PlayerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Not every side has joined yet
    Waiting,
    Active,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    pub side: Side,
    /// This join completed the roster and the scheduler must start
    pub started: bool,
}

pub struct Session {
    id: SessionId,
    config: GameConfig,
    phase: Phase,
    state: GameState,
    sides: HashMap<PlayerId, Side>,
    broadcaster: Broadcaster,
    inputs: InputPipeline,
    rng: ChaCha8Rng,
    last_tick_at: Option<Instant>,
    started_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(id: SessionId, config: GameConfig, seed: u64) -> Self {
        Self {
            id,
            state: GameState::new(&config),
            inputs: InputPipeline::new(config.n_players),
            config,
            phase: Phase::Waiting,
            sides: HashMap::new(),
            broadcaster: Broadcaster::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            last_tick_at: None,
            started_at: None,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn side_of(&self, player: &PlayerId) -> Option<Side> {
        self.sides.get(player).copied()
    }

    pub fn is_connected(&self, side: Side) -> bool {
        self.broadcaster.is_connected(side)
    }

    /// Attach a connection for `player`. A known identity gets its side back with its
    /// paddle and score intact; a new identity takes the next free side.
    pub fn join(&mut self, player: PlayerId, connection: Connection) -> Result<JoinOutcome, JoinError> {
        if self.phase == Phase::Ended {
            return Err(JoinError::SessionClosed);
        }

        let side = match self.sides.get(&player) {
            Some(&side) => side,
            None => {
                let side = (self.sides.len() < self.config.n_players as usize)
                    .then(|| Side::from_index(self.sides.len()))
                    .flatten()
                    .ok_or(JoinError::SessionFull)?;
                self.sides.insert(player, side);
                side
            }
        };

        if self.broadcaster.attach(side, connection).is_some() {
            tracing::debug!("Session {} side {} replaced its connection", self.id, side.id());
        }
        self.inputs.reset_sequence(side);

        self.broadcaster.send_to(
            side,
            ServerMsg::GameJoin(GameJoinMsg {
                protocol_version: PROTOCOL_VERSION,
                params: self.config.clone(),
                pid: side.id(),
            }),
        );

        let mut started = false;
        if self.sides.len() == self.config.n_players as usize {
            if self.phase == Phase::Waiting {
                self.phase = Phase::Active;
                self.last_tick_at = Some(Instant::now());
                self.started_at = Some(Utc::now());
                self.broadcaster.broadcast(&ServerMsg::GameStart);
                started = true;
                tracing::info!("Session {} started with {} players", self.id, self.sides.len());
            } else {
                self.broadcaster.send_to(side, ServerMsg::GameStart);
            }
        } else {
            self.broadcaster.broadcast(&ServerMsg::GameWait(GameWaitMsg {
                joined_players: self.sides.len() as u8,
            }));
        }

        tracing::info!("Player joined session {} as side {}", self.id, side.id());
        Ok(JoinOutcome { side, started })
    }

    /// Drop the player's connection `conn_id`. Side, paddle and score stay; input
    /// buffered from that connection is discarded. Ignored if the side has since
    /// reconnected on another connection.
    pub fn detach(&mut self, player: &PlayerId, conn_id: ConnId) -> bool {
        let Some(side) = self.side_of(player) else {
            return false;
        };
        let left = self.broadcaster.detach_if(side, conn_id);
        if left {
            self.inputs.clear(side);
            tracing::info!("Side {} left session {}", side.id(), self.id);
        }
        left
    }

    /// Drop whatever connection the player currently has.
    #[cfg(test)]
    pub fn leave(&mut self, player: &PlayerId) -> bool {
        let Some(side) = self.side_of(player) else {
            return false;
        };
        let left = self.broadcaster.detach(side).is_some();
        if left {
            self.inputs.clear(side);
        }
        left
    }

    /// Queue a paddle input. Returns false if it was dropped.
    pub fn input(&mut self, player: &PlayerId, event: InputEvent) -> bool {
        if self.phase == Phase::Ended {
            return false;
        }
        let Some(side) = self.side_of(player) else {
            tracing::debug!("Session {} dropped input from unknown player", self.id);
            return false;
        };
        if !self.broadcaster.is_connected(side) {
            return false;
        }
        self.inputs.accept(side, event)
    }

    /// Run one scheduler period. Returns the result if this tick ended the match; the
    /// connections stay attached until `close`.
    pub fn tick(&mut self, now: Instant) -> Option<MatchResult> {
        if self.phase != Phase::Active {
            return None;
        }

        let last = self.last_tick_at.replace(now).unwrap_or(now);
        self.state.elapsed += now.saturating_duration_since(last);

        if self.state.pause_countdown > 0 {
            self.state.pause_countdown -= 1;
            if self.state.pause_countdown == 0 {
                self.state.ball.vel = physics::launch_direction(&mut self.rng);
                tracing::debug!("Session {} ball launched", self.id);
            }
            self.broadcast_state();
            return None;
        }

        self.state.tick += 1;
        let mut inputs = self.inputs.drain_latest();
        // a side pruned mid-window keeps nothing it sent before the drop
        for (i, input) in inputs.iter_mut().enumerate() {
            if Side::from_index(i).is_some_and(|side| !self.broadcaster.is_connected(side)) {
                *input = None;
            }
        }
        self.state.step(&inputs, &self.config);
        let end = self.state.end_reason(&self.config);
        self.broadcast_state();

        end.map(|reason| self.finish(reason))
    }

    /// Release every connection without producing a result.
    pub fn close(&mut self) {
        self.phase = Phase::Ended;
        let released = self.broadcaster.close_all();
        tracing::info!("Session {} closed, released {} connections", self.id, released);
    }

    fn finish(&mut self, reason: protocol::EndReason) -> MatchResult {
        let ended_at = Utc::now();
        let result = result::build_result(
            reason,
            &self.state,
            self.started_at.unwrap_or(ended_at),
            ended_at,
        );
        self.broadcaster.broadcast(&ServerMsg::GameEnd(GameEndMsg {
            result: result.clone(),
        }));
        self.phase = Phase::Ended;
        tracing::info!("Session {} ended: {:?}", self.id, reason);
        result
    }

    fn broadcast_state(&mut self) {
        let snapshot = protocol::snapshot(&self.state);
        self.broadcaster.broadcast_state(&snapshot);
    }
}
