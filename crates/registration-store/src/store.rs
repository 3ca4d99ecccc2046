use async_trait::async_trait;
use domain::{Contact, Event, PartySize, Registration, Rejection};
use serde::Serialize;

use crate::{EventId, RegistrationId, Result};

/// Outcome of an atomic create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// The registration was inserted and the count updated together.
    /// `event` reflects the state right after the commit.
    Admitted {
        registration: Registration,
        event: Event,
    },
    /// Nothing was written.
    Rejected(Rejection),
}

/// What an atomic cancel removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CancelledRegistration {
    pub registration_id: RegistrationId,
    pub event_id: EventId,
    pub removed_party_size: PartySize,
    /// The event's attendee count after the cancellation committed.
    pub attendees_after: u32,
}

/// Outcome of an atomic cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationOutcome {
    Cancelled(CancelledRegistration),
    /// No registration had that id. Nothing was written, so retrying a
    /// cancel that already succeeded lands here.
    NotFound,
}

impl CancellationOutcome {
    /// Returns true for [`CancellationOutcome::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CancellationOutcome::Cancelled(_))
    }
}

/// An event together with its active registrations, read as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSnapshot {
    pub event: Event,
    /// Ordered by creation time, ties broken by id.
    pub registrations: Vec<Registration>,
}

impl EventSnapshot {
    /// Recomputes the attendee total from the registrations themselves.
    pub fn attendee_sum(&self) -> u32 {
        self.registrations
            .iter()
            .map(|registration| registration.party_size.get())
            .sum()
    }

    /// Returns true if the cached count matches the registrations.
    pub fn is_consistent(&self) -> bool {
        self.event.current_attendees == self.attendee_sum()
    }
}

/// Core trait for registration store implementations.
///
/// Implementations must serialize `apply_create` and `apply_cancel` per event
/// so that capacity checks never run against a stale count, while leaving
/// different events free to proceed in parallel.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Provisions a new event with no registrations.
    ///
    /// The stored count always starts at zero regardless of the input.
    /// Returns the event as stored.
    async fn insert_event(&self, event: Event) -> Result<Event>;

    /// Retrieves an event by id.
    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>>;

    /// Atomically evaluates capacity and, on admission, inserts the
    /// registration and writes the new count.
    ///
    /// Fails with `EventNotFound` if the event does not exist.
    async fn apply_create(
        &self,
        event_id: EventId,
        party_size: i64,
        contact: Contact,
    ) -> Result<AdmissionOutcome>;

    /// Atomically deletes a registration and subtracts its party size from
    /// the owning event, flooring the count at zero.
    async fn apply_cancel(&self, registration_id: RegistrationId) -> Result<CancellationOutcome>;

    /// Retrieves a registration by id.
    async fn get_registration(&self, registration_id: RegistrationId)
    -> Result<Option<Registration>>;

    /// Reads an event and its registrations as one consistent snapshot.
    ///
    /// Returns None if the event doesn't exist.
    async fn snapshot(&self, event_id: EventId) -> Result<Option<EventSnapshot>>;
}

/// Extension trait providing convenience methods for registration stores.
#[async_trait]
pub trait RegistrationStoreExt: RegistrationStore {
    /// Lists an event's registrations ordered by creation time, then id.
    ///
    /// Unknown events yield an empty list.
    async fn list_by_event(&self, event_id: EventId) -> Result<Vec<Registration>> {
        Ok(self
            .snapshot(event_id)
            .await?
            .map(|snapshot| snapshot.registrations)
            .unwrap_or_default())
    }

    /// Recomputes the sum of party sizes for an event from its registrations.
    async fn attendee_sum(&self, event_id: EventId) -> Result<Option<u32>> {
        Ok(self
            .snapshot(event_id)
            .await?
            .map(|snapshot| snapshot.attendee_sum()))
    }

    /// Checks if a registration exists.
    async fn registration_exists(&self, registration_id: RegistrationId) -> Result<bool> {
        Ok(self.get_registration(registration_id).await?.is_some())
    }
}

// Blanket implementation for all RegistrationStore implementations
impl<T: RegistrationStore + ?Sized> RegistrationStoreExt for T {}
