use thiserror::Error;

use crate::EventId;

/// Errors that can occur when interacting with the registration store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// An event with this id has already been provisioned.
    #[error("Event already exists: {0}")]
    DuplicateEvent(EventId),

    /// The store cannot serve requests right now. No mutation was applied.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row holds a value the domain types cannot represent.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

// Connection exceptions, serialization failure, deadlock, insufficient
// resources, operator intervention.
const TRANSIENT_SQLSTATE_PREFIXES: &[&str] = &["08", "40001", "40P01", "53", "57P"];

impl StoreError {
    /// Returns true for transient infrastructure failures.
    ///
    /// Callers may retry these; the store guarantees nothing was half-applied.
    /// Lookups that found nothing, constraint violations and undecodable data
    /// fail the same way on every attempt and are not included.
    pub fn is_unavailable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Database(err) => is_transient(err),
            _ => false,
        }
    }
}

fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| {
            TRANSIENT_SQLSTATE_PREFIXES
                .iter()
                .any(|prefix| code.starts_with(prefix))
        }),
        _ => false,
    }
}

/// Result type for registration store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
