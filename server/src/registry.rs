//! Session creation and join-credential lookup.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pong_shared::config::GameConfig;
use pong_shared::protocol::{CreateGameResponse, GameKey};
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{CreateError, JoinError};
use crate::game_loop::{run_session, SessionHandle};
use crate::result::ResultSink;
use crate::session::{PlayerId, Session, SessionId};

/// What a join credential grants: one identity in one session.
#[derive(Debug, Clone)]
struct Credential {
    session_id: SessionId,
    player: PlayerId,
    expires: DateTime<Utc>,
}

pub struct SessionRegistry {
    config: ServerConfig,
    results: Arc<dyn ResultSink>,
    sessions: Mutex<HashMap<SessionId, SessionHandle>>,
    credentials: Mutex<HashMap<String, Credential>>,
}

impl SessionRegistry {
    pub fn new(config: ServerConfig, results: Arc<dyn ResultSink>) -> Self {
        Self {
            config,
            results,
            sessions: Mutex::new(HashMap::new()),
            credentials: Mutex::new(HashMap::new()),
        }
    }

    /// Validate the configuration, spawn the session task and issue one credential
    /// per side. The session is forgotten once its task exits.
    pub async fn create(self: &Arc<Self>, config: GameConfig) -> Result<CreateGameResponse, CreateError> {
        config.validate().map_err(CreateError::InvalidConfig)?;

        let id = Uuid::new_v4();
        let seed = self.config.rng_seed.unwrap_or_else(rand::random);
        let n_players = config.n_players;
        let session = Session::new(id, config, seed);

        let (tx, rx) = mpsc::channel(self.config.mailbox_capacity);
        let handle = SessionHandle::new(id, tx);
        self.sessions.lock().await.insert(id, handle.clone());

        let expires = Utc::now() + chrono::Duration::milliseconds(self.config.token_ttl.as_millis() as i64);
        let mut game_keys = Vec::with_capacity(n_players as usize);
        {
            let mut credentials = self.credentials.lock().await;
            for _ in 0..n_players {
                let key = Uuid::new_v4().simple().to_string();
                credentials.insert(
                    key.clone(),
                    Credential {
                        session_id: id,
                        player: Uuid::new_v4(),
                        expires,
                    },
                );
                game_keys.push(GameKey {
                    key,
                    game_id: id.to_string(),
                    expires: expires.to_rfc3339(),
                });
            }
        }

        let registry = Arc::clone(self);
        let results = Arc::clone(&self.results);
        tokio::spawn(async move {
            run_session(session, rx, results).await;
            registry.forget(id).await;
        });

        // every credential shares one expiry; a roster still incomplete then never fills
        let ttl = self.config.token_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            handle.expire().await;
        });

        tracing::info!("Created session {} for {} players", id, n_players);
        Ok(CreateGameResponse {
            game_id: id.to_string(),
            game_keys,
        })
    }

    /// Look up a credential. Expired credentials are removed and rejected; valid ones
    /// stay usable for reconnects until they expire.
    pub async fn resolve(&self, token: &str) -> Result<(SessionHandle, PlayerId), JoinError> {
        let credential = {
            let mut credentials = self.credentials.lock().await;
            let credential = credentials
                .get(token)
                .cloned()
                .ok_or(JoinError::UnknownCredential)?;
            if credential.expires <= Utc::now() {
                credentials.remove(token);
                return Err(JoinError::CredentialExpired);
            }
            credential
        };

        let handle = self
            .sessions
            .lock()
            .await
            .get(&credential.session_id)
            .cloned()
            .ok_or(JoinError::SessionClosed)?;
        Ok((handle, credential.player))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Stop every running session.
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = self.sessions.lock().await.values().cloned().collect();
        tracing::info!("Shutting down {} sessions", handles.len());
        for handle in handles {
            handle.shutdown().await;
        }
    }

    async fn forget(&self, id: SessionId) {
        self.sessions.lock().await.remove(&id);
        self.credentials
            .lock()
            .await
            .retain(|_, credential| credential.session_id != id);
        tracing::debug!("Session {} removed from registry", id);
    }
}
