//! Error types for the agenda library.

use thiserror::Error;
use uuid::Uuid;

/// Reasons an edit form is rejected. The display text is the message shown
/// to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid date. Use DD/MM/YYYY or YYYY-MM-DD.")]
    InvalidDate,

    #[error("Title is required.")]
    MissingTitle,

    #[error("Invalid time. Use HH:MM (00:00-23:59).")]
    InvalidTime,

    #[error("Invalid end time. Use HH:MM, not earlier than the start time.")]
    InvalidEndTime,
}

#[derive(Error, Debug)]
pub enum AgendaError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Event not found: {0}")]
    EventNotFound(Uuid),

    #[error("Stored event is malformed: {0}")]
    MalformedEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Remote store error ({status}): {body}")]
    Remote { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AgendaResult<T> = Result<T, AgendaError>;
