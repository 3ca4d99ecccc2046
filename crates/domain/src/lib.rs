//! Domain layer for the event registration system.
//!
//! This crate provides:
//! - The `Event` and `Registration` records and their value objects
//! - The capacity accountant, a pure admit/reject decision function
//! - Shape validation for attendee contact data

pub mod capacity;
pub mod error;
pub mod registration;
pub mod validation;

pub use capacity::{Decision, Rejection, apply_cancellation, cancellation_delta, evaluate};
pub use common::{EventId, RegistrationId};
pub use error::ValidationError;
pub use registration::{Contact, Event, Locale, NewRegistration, PartySize, Registration};
