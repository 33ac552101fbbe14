use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Interval, MissedTickBehavior};

use crate::broadcast::{ConnId, Connection};
use crate::error::JoinError;
use crate::input::InputEvent;
use crate::protocol::MatchResult;
use crate::result::ResultSink;
use crate::session::{Phase, PlayerId, Session, SessionId};
use crate::side::Side;

/// Commands handled back to back before a due tick is let through
const MAX_COMMANDS_PER_TICK: usize = 64;

/// Commands from client connections to a session task
#[derive(Debug)]
pub enum SessionCommand {
    PlayerJoin {
        player: PlayerId,
        connection: Connection,
        response: oneshot::Sender<Result<Side, JoinError>>,
    },
    PlayerLeave {
        player: PlayerId,
        conn_id: ConnId,
    },
    PlayerInput {
        player: PlayerId,
        input: InputEvent,
    },
    /// The join credentials ran out; a session still waiting for players is abandoned.
    CredentialsExpired,
    Shutdown,
}

/// Cloneable address of a running session task.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn new(id: SessionId, tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub async fn join(&self, player: PlayerId, connection: Connection) -> Result<Side, JoinError> {
        let (response, rx) = oneshot::channel();
        let cmd = SessionCommand::PlayerJoin {
            player,
            connection,
            response,
        };
        if self.tx.send(cmd).await.is_err() {
            return Err(JoinError::SessionClosed);
        }
        rx.await.unwrap_or(Err(JoinError::SessionClosed))
    }

    pub async fn leave(&self, player: PlayerId, conn_id: ConnId) {
        let _ = self
            .tx
            .send(SessionCommand::PlayerLeave { player, conn_id })
            .await;
    }

    /// Returns false once the session task is gone.
    pub async fn input(&self, player: PlayerId, input: InputEvent) -> bool {
        self.tx
            .send(SessionCommand::PlayerInput { player, input })
            .await
            .is_ok()
    }

    pub async fn expire(&self) {
        let _ = self.tx.send(SessionCommand::CredentialsExpired).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(SessionCommand::Shutdown).await;
    }
}

/// Wait for the next scheduler period, or forever while the session is not running.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn start_ticker(session: &Session) -> Interval {
    let period = std::time::Duration::from_millis(session.config().tick_ms as u64);
    let mut interval = tokio::time::interval(period);
    // a late tick is skipped rather than run back to back
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

/// Run one session until it ends or is shut down. Owns the session.
pub async fn run_session(
    mut session: Session,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    results: Arc<dyn ResultSink>,
) -> Option<MatchResult> {
    let mut ticker: Option<Interval> = None;
    let mut handled = 0usize;

    loop {
        tokio::select! {
            // commands queued before a tick fires are applied before it, up to a cap
            biased;

            cmd = cmd_rx.recv(), if ticker.is_none() || handled < MAX_COMMANDS_PER_TICK => {
                handled += 1;
                match cmd {
                    Some(SessionCommand::PlayerJoin { player, connection, response }) => {
                        let joined = session.join(player, connection);
                        if let Ok(outcome) = &joined {
                            if outcome.started && ticker.is_none() {
                                ticker = Some(start_ticker(&session));
                            }
                        }
                        let _ = response.send(joined.map(|outcome| outcome.side));
                    }
                    Some(SessionCommand::PlayerLeave { player, conn_id }) => {
                        session.detach(&player, conn_id);
                    }
                    Some(SessionCommand::PlayerInput { player, input }) => {
                        session.input(&player, input);
                    }
                    Some(SessionCommand::CredentialsExpired) => {
                        if session.phase() == Phase::Waiting {
                            tracing::info!("Session {} abandoned before every side joined", session.id());
                            session.close();
                            break;
                        }
                    }
                    Some(SessionCommand::Shutdown) | None => {
                        session.close();
                        break;
                    }
                }
            }

            _ = next_tick(&mut ticker) => {
                handled = 0;
                if let Some(result) = session.tick(Instant::now()) {
                    results.report(session.id(), &result);
                    session.close();
                    return Some(result);
                }
            }
        }
    }

    tracing::info!("Session {} shut down", session.id());
    None
}
