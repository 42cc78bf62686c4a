//! Error types for the announcement engine

use thiserror::Error;

/// Result type alias for announcement operations
pub type Result<T> = std::result::Result<T, AnnounceError>;

/// Errors that can occur while announcing services.
///
/// None of these reach the caller of the lifecycle facade; they are logged
/// and terminal to the announcement attempt or trigger an orderly shutdown.
#[derive(Debug, Error)]
pub enum AnnounceError {
    /// A provider resource (daemon connection, poll object, client) could
    /// not be created
    #[error("failed to create discovery provider resource: {0}")]
    Resource(String),

    /// A registration submission was rejected by the provider
    #[error("failed to register service '{name}': {reason}")]
    Register { name: String, reason: String },

    /// The requested service name is already taken on the network
    #[error("service name collision")]
    Collision,

    /// Dispatching pending provider events failed
    #[error("event dispatch failed: {0}")]
    Dispatch(String),

    /// The provider reported a fatal condition
    #[error("discovery provider failure: {0}")]
    Provider(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnnounceError {
    /// Returns whether this error is a recoverable name collision
    pub fn is_collision(&self) -> bool {
        matches!(self, AnnounceError::Collision)
    }
}
