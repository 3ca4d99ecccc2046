//! Read-only projections for human display.
//!
//! This crate never mutates anything. It reads one consistent snapshot of an
//! event and turns it into display-oriented summaries. Formatting rules such
//! as the listing cutoff and the `(+N)` guest notation live here and nowhere
//! near the capacity accountant.

pub mod error;
pub mod views;

pub use error::{ProjectionError, Result};
pub use views::{
    AttendeeSummary, AttendeeViewBuilder, DEFAULT_MAX_NAMED_ATTENDEES, format_attendee_line,
};
