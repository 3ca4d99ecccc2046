//! Registration service error types.

use common::EventId;
use domain::ValidationError;
use registration_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registration operations.
///
/// Capacity and party-size rejections are not errors; they come back as
/// `CreateOutcome::Rejected`.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The creation payload is malformed. Nothing was attempted.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// An event with this id has already been provisioned.
    #[error("Event already exists: {0}")]
    DuplicateEvent(EventId),

    /// Transient storage failure. No partial mutation was applied and the
    /// caller may retry.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),

    /// Storage failure that will repeat on retry, such as a constraint
    /// violation or undecodable row. No partial mutation was applied.
    #[error("Storage error: {0}")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for RegistrationError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EventNotFound(event_id) => RegistrationError::EventNotFound(event_id),
            StoreError::DuplicateEvent(event_id) => RegistrationError::DuplicateEvent(event_id),
            other if other.is_unavailable() => RegistrationError::StorageUnavailable(other),
            other => RegistrationError::Storage(other),
        }
    }
}

impl RegistrationError {
    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegistrationError::StorageUnavailable(_))
    }
}

/// Convenience type alias for registration service results.
pub type Result<T> = std::result::Result<T, RegistrationError>;
