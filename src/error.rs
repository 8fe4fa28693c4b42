//! Error types for the wisp goal scheduler.

/// Top-level error type for the goal scheduling engine.
#[derive(Debug, thiserror::Error)]
pub enum GoalError {
    /// State store read/write error.
    #[error("store error: {0}")]
    Store(String),

    /// Serialization or deserialization error.
    #[error("serialize error: {0}")]
    Serialize(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, GoalError>;
