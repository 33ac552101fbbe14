use thiserror::Error;

/// Why a connection could not be attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("unknown credential")]
    UnknownCredential,
    #[error("credential expired")]
    CredentialExpired,
    #[error("session is closed")]
    SessionClosed,
    #[error("every side of the session is taken")]
    SessionFull,
}

/// Error when creating a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CreateError {
    #[error("invalid game configuration: {0}")]
    InvalidConfig(String),
}
