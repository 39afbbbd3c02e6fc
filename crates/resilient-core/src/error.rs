//! Error types for every component of the subsystem.
//!
//! Component errors stay separate so callers can match on exactly what failed;
//! `ResilienceError` folds them together for code that drives several components.

use thiserror::Error;

/// A mood entry that violates the log invariants. Never partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("intensity {0} is outside the allowed range 1-5")]
    IntensityOutOfRange(u8),

    #[error("rejection trigger supplied for an entry that is not rejection related")]
    TriggerWithoutRejection,

    #[error("entry dated {given} precedes the latest logged entry ({latest})")]
    OutOfOrder { latest: String, given: String },
}

#[derive(Debug, Error)]
pub enum MoodStoreError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("strategy '{0}' has no steps")]
    EmptySteps(String),

    #[error("duplicate strategy id '{0}'")]
    DuplicateId(String),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Failures reported by the AI bridge. Delivered only to the caller that issued the query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("AI bridge is not initialized")]
    NotInitialized,

    #[error("AI request failed: {0}")]
    RequestFailed(String),
}

impl AiError {
    pub fn request_failed(message: impl Into<String>) -> Self {
        Self::RequestFailed(message.into())
    }
}

/// An AI response that is not in the expected JSON shape. Recovered locally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("response JSON is missing '{0}'")]
    MissingField(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    #[error("notification '{identifier}' rejected: {reason}")]
    Rejected { identifier: String, reason: String },

    #[error("invalid delivery time {hour:02}:{minute:02}")]
    InvalidTime { hour: u32, minute: u32 },
}

#[derive(Debug, Error)]
pub enum ResilienceError {
    #[error(transparent)]
    MoodStore(#[from] MoodStoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<ValidationError> for ResilienceError {
    fn from(e: ValidationError) -> Self {
        ResilienceError::MoodStore(MoodStoreError::Validation(e))
    }
}

pub type ResilienceResult<T> = Result<T, ResilienceError>;
