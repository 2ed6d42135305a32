//! Error types for the booking service.

use std::time::Duration;

use uuid::Uuid;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Booking error: {0}")]
    Booking(#[from] BookingError),

    #[error("Rating error: {0}")]
    Rating(#[from] RatingError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Professional-directory lookup errors.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Directory request failed: {reason}")]
    RequestFailed { reason: String },

    #[error("Invalid directory response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Directory request timed out after {waited:?}")]
    Timeout { waited: Duration },
}

/// Booking submission errors.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("Draft is incomplete, missing: {}", .missing.join(", "))]
    DraftIncomplete { missing: Vec<String> },

    #[error("Invalid {field}: {reason}")]
    InvalidContact { field: String, reason: String },

    #[error("Requested time {time} is not on the appointment grid")]
    OffGridSlot { time: String },

    #[error("Submission timed out after {waited:?}")]
    Timeout { waited: Duration },
}

/// Rating submission errors.
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid {field} score {value}, expected 1-5")]
    InvalidScore { field: String, value: u8 },

    #[error("Booking {booking_id} has already been rated")]
    AlreadyRated { booking_id: Uuid },

    #[error("Booking {booking_id} not found")]
    BookingNotFound { booking_id: Uuid },
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database open error: {0}")]
    Open(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Outbound notification errors.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Notifications are not configured")]
    Disabled,

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    BuildFailed(String),

    #[error("Failed to send message: {0}")]
    SendFailed(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
