//! Error types for penlight
//!
//! Workflow rejections (light off, failed skill check, cancelled sessions)
//! are ordinary values and never surface here. `ExamError` is reserved for
//! misuse of the session machinery and for configuration/scenario faults.

use thiserror::Error;

use crate::types::EntityId;

/// Main error type for the examination system
#[derive(Error, Debug)]
pub enum ExamError {
    /// Session state machine transition errors
    #[error("Invalid session transition from {from:?} via {event}: {reason}")]
    InvalidTransition {
        from: String,
        event: String,
        reason: String,
    },

    /// A pending session already exists for the triple
    #[error("Session already pending for user {user}, instrument {instrument}, subject {subject}")]
    DuplicateSession {
        user: EntityId,
        instrument: EntityId,
        subject: EntityId,
    },

    /// Session id not present in the registry
    #[error("Unknown session: {0}")]
    UnknownSession(uuid::Uuid),

    /// Entity id not present in the world
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Scenario script errors
    #[error("Scenario error: {0}")]
    ScenarioError(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors reading or writing config and scenario files
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for exam operations
pub type Result<T> = std::result::Result<T, ExamError>;
