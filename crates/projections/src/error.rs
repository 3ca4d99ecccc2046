//! Projection error types.

use common::EventId;
use thiserror::Error;

/// Errors that can occur while building a view.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the registration store.
    #[error("Registration store error: {0}")]
    Store(#[from] registration_store::StoreError),

    /// The event to summarize does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
