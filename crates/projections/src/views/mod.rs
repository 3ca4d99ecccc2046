//! Display views over registration data.

pub mod attendees;

pub use attendees::{
    AttendeeSummary, AttendeeViewBuilder, DEFAULT_MAX_NAMED_ATTENDEES, format_attendee_line,
};
