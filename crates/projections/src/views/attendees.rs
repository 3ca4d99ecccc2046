//! Attendee summary — the roster shown next to an event.

use common::EventId;
use registration_store::{EventSnapshot, RegistrationStore};
use serde::Serialize;

use crate::{ProjectionError, Result};

/// Largest roster listed by name before switching to the bulk-export hint.
pub const DEFAULT_MAX_NAMED_ATTENDEES: usize = 10;

/// Human-facing summary of who is coming to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AttendeeSummary {
    /// Nobody has registered.
    Empty,
    /// Too many attendees to list by name; use the bulk export instead.
    TooMany { attendees: u32 },
    /// One line per registration, in listing order.
    Listed { lines: Vec<String> },
}

impl AttendeeSummary {
    /// Builds the summary for a snapshot.
    ///
    /// The empty check and the cutoff both use the event's attendee count,
    /// so a single party of twelve already exceeds a cutoff of ten.
    pub fn from_snapshot(snapshot: &EventSnapshot, max_named: usize) -> Self {
        let attendees = snapshot.event.current_attendees;

        if attendees == 0 {
            return AttendeeSummary::Empty;
        }
        if usize::try_from(attendees).map_or(true, |count| count > max_named) {
            return AttendeeSummary::TooMany { attendees };
        }

        AttendeeSummary::Listed {
            lines: snapshot
                .registrations
                .iter()
                .map(|registration| {
                    format_attendee_line(
                        registration.contact.display_name(),
                        registration.party_size.get(),
                    )
                })
                .collect(),
        }
    }
}

impl std::fmt::Display for AttendeeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendeeSummary::Empty => write!(f, "No attendees yet"),
            AttendeeSummary::TooMany { attendees } => write!(
                f,
                "{attendees} attendees: too many to list, use the bulk export"
            ),
            AttendeeSummary::Listed { lines } => write!(f, "{}", lines.join("\n")),
        }
    }
}

/// Formats one roster line: the name, plus `(+N)` when bringing guests.
pub fn format_attendee_line(name: &str, party_size: u32) -> String {
    match party_size.saturating_sub(1) {
        0 => name.to_string(),
        guests => format!("{name} (+{guests})"),
    }
}

/// Builds attendee summaries from a registration store.
#[derive(Clone)]
pub struct AttendeeViewBuilder<S: RegistrationStore> {
    store: S,
}

impl<S: RegistrationStore> AttendeeViewBuilder<S> {
    /// Creates a view builder reading from `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Summarizes an event's attendees, listing names only when there are at
    /// most `max_named` of them.
    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self, event_id: EventId, max_named: usize) -> Result<AttendeeSummary> {
        let snapshot = self
            .store
            .snapshot(event_id)
            .await?
            .ok_or(ProjectionError::EventNotFound(event_id))?;

        Ok(AttendeeSummary::from_snapshot(&snapshot, max_named))
    }
}
