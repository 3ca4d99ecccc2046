use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock as StdRwLock};

use async_trait::async_trait;
use domain::{
    Contact, Decision, Event, PartySize, Registration, apply_cancellation, cancellation_delta,
    evaluate,
};
use tokio::sync::{Mutex, RwLock};

use crate::{
    EventId, RegistrationId, Result, StoreError,
    store::{
        AdmissionOutcome, CancellationOutcome, CancelledRegistration, EventSnapshot,
        RegistrationStore,
    },
};

/// One event's row plus its registrations. Guarded by a single mutex, which
/// is the event's serialization point.
#[derive(Debug)]
struct EventSlot {
    event: Event,
    /// Kept sorted by `Registration::listing_key`.
    registrations: Vec<Registration>,
}

type SlotHandle = Arc<Mutex<EventSlot>>;

const INDEX_SHARDS: usize = 16;

type IndexShard = StdRwLock<HashMap<RegistrationId, EventId>>;

/// Registration id to owning event, for cancel and lookup by id.
///
/// Sharded by id. The guards are synchronous and never live across an
/// await, so a slot mutation and its index update cannot be separated by a
/// dropped future.
#[derive(Debug)]
struct RegistrationIndex {
    shards: Vec<IndexShard>,
}

impl Default for RegistrationIndex {
    fn default() -> Self {
        Self {
            shards: (0..INDEX_SHARDS).map(|_| StdRwLock::default()).collect(),
        }
    }
}

impl RegistrationIndex {
    fn shard(&self, registration_id: RegistrationId) -> &IndexShard {
        let bucket = registration_id.as_uuid().as_u128() % INDEX_SHARDS as u128;
        &self.shards[bucket as usize]
    }

    fn get(&self, registration_id: RegistrationId) -> Option<EventId> {
        self.shard(registration_id)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&registration_id)
            .copied()
    }

    fn insert(&self, registration_id: RegistrationId, event_id: EventId) {
        self.shard(registration_id)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(registration_id, event_id);
    }

    fn remove(&self, registration_id: RegistrationId) {
        self.shard(registration_id)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&registration_id);
    }

    fn clear(&self) {
        for shard in &self.shards {
            shard.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}

/// In-memory registration store.
///
/// Each event has its own mutex, so creates and cancels on one event are
/// linearizable. Mutations of different events share no async lock: the
/// event registry is only read to clone a handle, and the id index is
/// updated synchronously on a per-id shard. Once a mutation starts there is
/// no await point until it is fully published, so abandoning a call either
/// applies nothing or applies everything.
#[derive(Clone, Default)]
pub struct InMemoryRegistrationStore {
    events: Arc<RwLock<HashMap<EventId, SlotHandle>>>,
    registrations: Arc<RegistrationIndex>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryRegistrationStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `StoreError::Unavailable`
    /// before touching any state.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Overwrites an event's cached attendee count without touching its
    /// registrations.
    ///
    /// Only for simulating a drifted count in tests of the cancellation floor.
    pub async fn simulate_drift(&self, event_id: EventId, current_attendees: u32) -> Result<()> {
        let slot = self
            .slot(event_id)
            .await
            .ok_or(StoreError::EventNotFound(event_id))?;
        slot.lock().await.event.current_attendees = current_attendees;
        Ok(())
    }

    /// Returns the number of provisioned events.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Clears all events and registrations.
    pub async fn clear(&self) {
        self.events.write().await.clear();
        self.registrations.clear();
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store is marked unavailable".to_string(),
            ));
        }
        Ok(())
    }

    async fn slot(&self, event_id: EventId) -> Option<SlotHandle> {
        self.events.read().await.get(&event_id).cloned()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn insert_event(&self, mut event: Event) -> Result<Event> {
        self.check_available()?;

        let mut events = self.events.write().await;
        if events.contains_key(&event.id) {
            return Err(StoreError::DuplicateEvent(event.id));
        }

        event.current_attendees = 0;
        events.insert(
            event.id,
            Arc::new(Mutex::new(EventSlot {
                event: event.clone(),
                registrations: Vec::new(),
            })),
        );
        Ok(event)
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        self.check_available()?;

        match self.slot(event_id).await {
            Some(slot) => Ok(Some(slot.lock().await.event.clone())),
            None => Ok(None),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, contact))]
    async fn apply_create(
        &self,
        event_id: EventId,
        party_size: i64,
        contact: Contact,
    ) -> Result<AdmissionOutcome> {
        self.check_available()?;

        let slot = self
            .slot(event_id)
            .await
            .ok_or(StoreError::EventNotFound(event_id))?;

        let party_size = match PartySize::try_from(party_size) {
            Ok(size) => size,
            Err(rejection) => return Ok(AdmissionOutcome::Rejected(rejection)),
        };

        let mut slot = slot.lock().await;

        let new_count = match evaluate(
            slot.event.current_attendees,
            slot.event.capacity,
            i64::from(party_size.get()),
        ) {
            Decision::Admit { new_count } => new_count,
            Decision::Reject(rejection) => return Ok(AdmissionOutcome::Rejected(rejection)),
        };

        let registration = Registration::new(event_id, party_size, contact);
        let key = registration.listing_key();
        let position = slot
            .registrations
            .partition_point(|existing| existing.listing_key() <= key);
        slot.registrations.insert(position, registration.clone());
        slot.event.current_attendees = new_count;
        self.registrations.insert(registration.id, event_id);

        Ok(AdmissionOutcome::Admitted {
            registration,
            event: slot.event.clone(),
        })
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn apply_cancel(&self, registration_id: RegistrationId) -> Result<CancellationOutcome> {
        self.check_available()?;

        let Some(event_id) = self.registrations.get(registration_id) else {
            return Ok(CancellationOutcome::NotFound);
        };
        let Some(slot) = self.slot(event_id).await else {
            return Ok(CancellationOutcome::NotFound);
        };

        let mut slot = slot.lock().await;

        // A concurrent cancel may have won between the lookup and the lock.
        let Some(position) = slot
            .registrations
            .iter()
            .position(|registration| registration.id == registration_id)
        else {
            return Ok(CancellationOutcome::NotFound);
        };

        let removed = slot.registrations.remove(position);
        let delta = cancellation_delta(removed.party_size);
        slot.event.current_attendees = apply_cancellation(slot.event.current_attendees, delta);

        self.registrations.remove(registration_id);

        Ok(CancellationOutcome::Cancelled(CancelledRegistration {
            registration_id,
            event_id,
            removed_party_size: removed.party_size,
            attendees_after: slot.event.current_attendees,
        }))
    }

    async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<Registration>> {
        self.check_available()?;

        let Some(event_id) = self.registrations.get(registration_id) else {
            return Ok(None);
        };
        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };

        let slot = slot.lock().await;
        Ok(slot
            .registrations
            .iter()
            .find(|registration| registration.id == registration_id)
            .cloned())
    }

    async fn snapshot(&self, event_id: EventId) -> Result<Option<EventSnapshot>> {
        self.check_available()?;

        let Some(slot) = self.slot(event_id).await else {
            return Ok(None);
        };

        let slot = slot.lock().await;
        Ok(Some(EventSnapshot {
            event: slot.event.clone(),
            registrations: slot.registrations.clone(),
        }))
    }
}
