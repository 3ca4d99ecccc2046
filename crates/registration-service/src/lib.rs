//! Registration service.
//!
//! Orchestrates one registration request end to end:
//! 1. Validate the contact payload
//! 2. Apply the create atomically through the registration store
//! 3. Send a confirmation, best-effort
//!
//! A failed confirmation is reported alongside the result. It never undoes
//! the registration or its contribution to the attendee count.

pub mod error;
pub mod notification;
pub mod service;

pub use error::{RegistrationError, Result};
pub use notification::{
    InMemoryNotificationDispatcher, LogNotificationDispatcher, NotificationDispatcher,
    NotificationError, SentNotification,
};
pub use registration_store::{CancellationOutcome, CancelledRegistration};
pub use service::{Confirmation, CreateOutcome, NotificationStatus, RegistrationService};
