//! Error types for gm-ticket

use crate::core::SubmitterId;
use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, GmTicketError>;

/// Main error type for gm-ticket operations
#[derive(Error, Debug)]
pub enum GmTicketError {
    /// A storage backend rejected a statement
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite failure
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("No ticket found for submitter {submitter}")]
    TicketNotFound { submitter: SubmitterId },

    #[error("Submitter id must be non-zero")]
    InvalidSubmitter,

    /// The survey payload ended before a field could be read
    #[error("Survey payload truncated: needed {needed} bytes at offset {offset}")]
    SurveyTruncated { offset: usize, needed: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The player session layer refused a notification
    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GmTicketError {
    /// Returns a hint the CLI can show next to the error message
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::TicketNotFound { .. } => Some("Run 'gm-ticket list' to see open tickets"),
            Self::InvalidSubmitter => Some("Submitter ids are positive player GUID counters"),
            Self::Config(_) => Some("Check gm-ticket.toml and GM_TICKET__* environment variables"),
            _ => None,
        }
    }
}
