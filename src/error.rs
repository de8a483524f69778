//! Error types for session-keeper.

use thiserror::Error;

use crate::session::SessionState;

/// Main error type for session-keeper operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// `start()` was called on a session that is already active.
    #[error("session already started")]
    AlreadyStarted,

    /// Attribute access attempted outside the active state.
    #[error("session not started: current state is {0:?}")]
    NotStarted(SessionState),

    /// Invalid state transition attempted.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        from: SessionState,
        to: SessionState,
    },

    /// Session identifier failed validation.
    #[error("invalid session id: {0:?}")]
    InvalidId(String),

    /// Session with the given ID was not found in storage.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Another holder owns the lease on this session.
    #[error("session locked: {0}")]
    Locked(String),

    /// The storage driver failed to load, save or delete.
    #[error("session storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The storage driver cannot garbage-collect.
    #[error("session storage does not support garbage collection")]
    GcUnsupported,

    /// Internal lock was poisoned.
    #[error("internal lock poisoned")]
    LockPoisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Attribute (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Console command failed.
    #[error("command error: {0}")]
    Command(String),
}

impl SessionError {
    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }
}

/// Convenience Result type for session-keeper operations.
pub type Result<T> = std::result::Result<T, SessionError>;
