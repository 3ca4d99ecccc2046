//! Event and registration records.

use chrono::{DateTime, SubsecRound, Utc};
use common::{EventId, RegistrationId};
use serde::{Deserialize, Serialize};

use super::{Contact, PartySize};

// Microsecond precision, matching what the database stores.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A calendar event that members can register for.
///
/// `current_attendees` is a cached aggregate. It must always equal the sum of
/// `party_size` over the event's active registrations, and only the
/// registration store writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    /// Upper bound on total attendees. `None` means unlimited.
    pub capacity: Option<u32>,
    pub current_attendees: u32,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Creates a new event with no attendees.
    pub fn new(title: impl Into<String>, capacity: Option<u32>) -> Self {
        Self {
            id: EventId::new(),
            title: title.into(),
            capacity,
            current_attendees: 0,
            created_at: now(),
        }
    }

    /// Returns how many more attendees fit, or `None` when unlimited.
    pub fn remaining_capacity(&self) -> Option<u32> {
        self.capacity
            .map(|capacity| capacity.saturating_sub(self.current_attendees))
    }

    /// Returns true if the event has a capacity and it is fully booked.
    pub fn is_full(&self) -> bool {
        self.remaining_capacity() == Some(0)
    }
}

/// One party's registration for an event.
///
/// Immutable once created: changing the party size is a cancellation
/// followed by a new registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub party_size: PartySize,
    pub contact: Contact,
    pub created_at: DateTime<Utc>,
}

impl Registration {
    /// Creates a registration stamped with the current time.
    pub fn new(event_id: EventId, party_size: PartySize, contact: Contact) -> Self {
        Self {
            id: RegistrationId::new(),
            event_id,
            party_size,
            contact,
            created_at: now(),
        }
    }

    /// Ordering key used by every listing: creation time, then id.
    pub fn listing_key(&self) -> (DateTime<Utc>, RegistrationId) {
        (self.created_at, self.id)
    }
}

/// A caller's request to register for an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub event_id: EventId,
    /// Requested party size. Defaults to one when absent.
    pub party_size: Option<i64>,
    pub contact: Contact,
}

impl NewRegistration {
    /// Creates a request for a single attendee.
    pub fn new(event_id: EventId, contact: Contact) -> Self {
        Self {
            event_id,
            party_size: None,
            contact,
        }
    }

    /// Sets the requested party size.
    pub fn with_party_size(mut self, party_size: i64) -> Self {
        self.party_size = Some(party_size);
        self
    }

    /// Returns the requested party size with the default applied.
    pub fn requested_party_size(&self) -> i64 {
        self.party_size
            .unwrap_or_else(|| i64::from(PartySize::DEFAULT.get()))
    }
}
