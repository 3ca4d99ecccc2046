//! Registration service providing the create/cancel API.

use std::time::Instant;

use common::{EventId, RegistrationId};
use domain::{Event, NewRegistration, Registration, Rejection};
use registration_store::{
    AdmissionOutcome, CancellationOutcome, RegistrationStore, RegistrationStoreExt,
};
use serde::Serialize;

use crate::error::Result;
use crate::notification::NotificationDispatcher;

/// Whether the confirmation for a new registration went out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    /// Delivery failed. The registration still stands.
    Failed { reason: String },
}

/// A committed registration and what happened to its confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub registration: Registration,
    /// The event as of the commit, including this registration's party.
    pub event: Event,
    pub notification: NotificationStatus,
}

impl Confirmation {
    /// Returns the notification failure reason, if any, as a warning.
    pub fn warning(&self) -> Option<&str> {
        match &self.notification {
            NotificationStatus::Sent => None,
            NotificationStatus::Failed { reason } => Some(reason),
        }
    }
}

/// Result of a create request that reached the accountant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Confirmation),
    /// Not admitted. No state changed and no notification was sent.
    Rejected(Rejection),
}

/// Service for registering and cancelling attendance.
///
/// Holds no locks of its own; all serialization happens inside the store.
pub struct RegistrationService<S, N>
where
    S: RegistrationStore,
    N: NotificationDispatcher,
{
    store: S,
    notifier: N,
}

impl<S, N> RegistrationService<S, N>
where
    S: RegistrationStore,
    N: NotificationDispatcher,
{
    /// Creates a new registration service.
    pub fn new(store: S, notifier: N) -> Self {
        Self { store, notifier }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the notification dispatcher.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Registers a party for an event.
    ///
    /// Validation failures and storage outages are errors. Capacity and
    /// party-size rejections come back as [`CreateOutcome::Rejected`].
    #[tracing::instrument(skip(self, request), fields(event_id = %request.event_id))]
    pub async fn create(&self, request: NewRegistration) -> Result<CreateOutcome> {
        let started = Instant::now();
        let result = self.register(request).await;

        metrics::histogram!(
            "registration_create_duration_seconds",
            "outcome" => create_outcome_label(&result)
        )
        .record(started.elapsed().as_secs_f64());

        result
    }

    async fn register(&self, request: NewRegistration) -> Result<CreateOutcome> {
        if let Err(err) = request.contact.validate() {
            tracing::info!(error = %err, "registration payload rejected");
            metrics::counter!("registrations_rejected_total", "reason" => "validation")
                .increment(1);
            return Err(err.into());
        }

        let party_size = request.requested_party_size();
        let outcome = self
            .store
            .apply_create(request.event_id, party_size, request.contact)
            .await?;

        let (registration, event) = match outcome {
            AdmissionOutcome::Admitted {
                registration,
                event,
            } => (registration, event),
            AdmissionOutcome::Rejected(rejection) => {
                tracing::info!(%rejection, party_size, "registration rejected");
                metrics::counter!("registrations_rejected_total", "reason" => rejection.as_str())
                    .increment(1);
                return Ok(CreateOutcome::Rejected(rejection));
            }
        };

        tracing::info!(
            registration_id = %registration.id,
            party_size,
            attendees = event.current_attendees,
            "registration admitted"
        );
        metrics::counter!("registrations_admitted_total").increment(1);

        // The registration has committed; from here on nothing can undo it.
        let notification = match self
            .notifier
            .send(&registration, &event, &registration.contact.language)
            .await
        {
            Ok(()) => NotificationStatus::Sent,
            Err(err) => {
                tracing::warn!(
                    registration_id = %registration.id,
                    error = %err,
                    "confirmation not delivered"
                );
                metrics::counter!("notifications_failed_total").increment(1);
                NotificationStatus::Failed {
                    reason: err.to_string(),
                }
            }
        };

        Ok(CreateOutcome::Created(Confirmation {
            registration,
            event,
            notification,
        }))
    }

    /// Cancels a registration.
    ///
    /// Cancelling an id that does not exist, including one already
    /// cancelled, returns [`CancellationOutcome::NotFound`] and changes
    /// nothing.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, registration_id: RegistrationId) -> Result<CancellationOutcome> {
        let outcome = self.store.apply_cancel(registration_id).await?;

        match &outcome {
            CancellationOutcome::Cancelled(cancelled) => {
                tracing::info!(
                    event_id = %cancelled.event_id,
                    party_size = cancelled.removed_party_size.get(),
                    attendees = cancelled.attendees_after,
                    "registration cancelled"
                );
                metrics::counter!("registrations_cancelled_total").increment(1);
            }
            CancellationOutcome::NotFound => {
                tracing::debug!("cancellation target not found");
            }
        }

        Ok(outcome)
    }

    /// Provisions a new event with no attendees.
    #[tracing::instrument(skip(self))]
    pub async fn provision_event(&self, title: String, capacity: Option<u32>) -> Result<Event> {
        Ok(self.store.insert_event(Event::new(title, capacity)).await?)
    }

    /// Loads an event by id.
    pub async fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        Ok(self.store.get_event(event_id).await?)
    }

    /// Loads a registration by id.
    pub async fn get_registration(
        &self,
        registration_id: RegistrationId,
    ) -> Result<Option<Registration>> {
        Ok(self.store.get_registration(registration_id).await?)
    }

    /// Lists an event's registrations in creation order.
    ///
    /// Returns None if the event doesn't exist.
    pub async fn list_by_event(&self, event_id: EventId) -> Result<Option<Vec<Registration>>> {
        Ok(self
            .store
            .snapshot(event_id)
            .await?
            .map(|snapshot| snapshot.registrations))
    }

    /// Returns whether a registration is currently active.
    pub async fn is_active(&self, registration_id: RegistrationId) -> Result<bool> {
        Ok(self.store.registration_exists(registration_id).await?)
    }
}

/// Label for the create latency histogram.
fn create_outcome_label(result: &Result<CreateOutcome>) -> &'static str {
    match result {
        Ok(CreateOutcome::Created(_)) => "created",
        Ok(CreateOutcome::Rejected(_)) => "rejected",
        Err(_) => "error",
    }
}

#[cfg(test)]
mod tests {
    use domain::Contact;
    use registration_store::InMemoryRegistrationStore;

    use super::*;
    use crate::notification::InMemoryNotificationDispatcher;

    fn service() -> RegistrationService<InMemoryRegistrationStore, InMemoryNotificationDispatcher>
    {
        RegistrationService::new(
            InMemoryRegistrationStore::new(),
            InMemoryNotificationDispatcher::new(),
        )
    }

    #[tokio::test]
    async fn party_size_defaults_to_one() {
        let service = service();
        let event = service
            .provision_event("Picnic".to_string(), None)
            .await
            .unwrap();

        let outcome = service
            .create(NewRegistration::new(event.id, Contact::named("Ann")))
            .await
            .unwrap();
        let CreateOutcome::Created(confirmation) = outcome else {
            panic!("expected creation");
        };
        assert_eq!(confirmation.registration.party_size.get(), 1);
        assert_eq!(confirmation.event.current_attendees, 1);
        assert_eq!(confirmation.notification, NotificationStatus::Sent);
        assert!(confirmation.warning().is_none());
    }

    #[tokio::test]
    async fn rejection_sends_no_notification() {
        let service = service();
        let event = service
            .provision_event("Tiny".to_string(), Some(1))
            .await
            .unwrap();

        let outcome = service
            .create(NewRegistration::new(event.id, Contact::named("Ann")).with_party_size(2))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CreateOutcome::Rejected(Rejection::CapacityExceeded { remaining: 1 })
        );
        assert_eq!(service.notifier().attempt_count(), 0);
    }

    #[tokio::test]
    async fn list_by_event_distinguishes_unknown_events() {
        let service = service();
        assert!(
            service
                .list_by_event(EventId::new())
                .await
                .unwrap()
                .is_none()
        );

        let event = service
            .provision_event("Empty".to_string(), None)
            .await
            .unwrap();
        assert_eq!(service.list_by_event(event.id).await.unwrap(), Some(vec![]));
    }

    #[tokio::test]
    async fn every_create_path_has_a_latency_label() {
        let service = service();
        let event = service
            .provision_event("Tiny".to_string(), Some(1))
            .await
            .unwrap();
        let request = |party_size| {
            NewRegistration::new(event.id, Contact::named("Ann")).with_party_size(party_size)
        };

        let created = service.create(request(1)).await;
        let rejected = service.create(request(1)).await;
        let failed = service
            .create(NewRegistration::new(event.id, Contact::named("")))
            .await;

        assert_eq!(create_outcome_label(&created), "created");
        assert_eq!(create_outcome_label(&rejected), "rejected");
        assert_eq!(create_outcome_label(&failed), "error");
    }

    #[test]
    fn notification_status_serialization() {
        let json = serde_json::to_value(NotificationStatus::Failed {
            reason: "bounced".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "failed", "reason": "bounced"})
        );
    }
}
