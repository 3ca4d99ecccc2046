//! Confirmation dispatcher trait and implementations.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use common::{EventId, RegistrationId};
use domain::{Event, Locale, Registration};
use thiserror::Error;

/// A confirmation could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotificationError {
    /// The downstream provider refused or failed the delivery.
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// Trait for sending registration confirmations.
///
/// Called at most once per successful registration, after the registration
/// has committed and outside any store lock.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Sends a confirmation for `registration` in the attendee's language.
    async fn send(
        &self,
        registration: &Registration,
        event: &Event,
        locale: &Locale,
    ) -> Result<(), NotificationError>;
}

/// A confirmation recorded by [`InMemoryNotificationDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub registration_id: RegistrationId,
    pub event_id: EventId,
    pub recipient: Option<String>,
    pub locale: Locale,
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<SentNotification>,
    attempts: usize,
    fail_on_send: bool,
}

/// In-memory dispatcher for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationDispatcher {
    state: Arc<Mutex<InMemoryNotificationState>>,
}

impl InMemoryNotificationDispatcher {
    /// Creates a new in-memory dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the dispatcher to fail every send until reset.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.state().fail_on_send = fail;
    }

    /// Returns the number of confirmations delivered.
    pub fn sent_count(&self) -> usize {
        self.state().sent.len()
    }

    /// Returns the number of send attempts, successful or not.
    pub fn attempt_count(&self) -> usize {
        self.state().attempts
    }

    /// Returns true if a confirmation was delivered for the registration.
    pub fn was_notified(&self, registration_id: RegistrationId) -> bool {
        self.state()
            .sent
            .iter()
            .any(|sent| sent.registration_id == registration_id)
    }

    /// Returns all delivered confirmations in send order.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.state().sent.clone()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryNotificationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryNotificationDispatcher {
    async fn send(
        &self,
        registration: &Registration,
        event: &Event,
        locale: &Locale,
    ) -> Result<(), NotificationError> {
        let mut state = self.state();
        state.attempts += 1;

        if state.fail_on_send {
            return Err(NotificationError::Delivery(
                "Mail provider unavailable".to_string(),
            ));
        }

        state.sent.push(SentNotification {
            registration_id: registration.id,
            event_id: event.id,
            recipient: registration.contact.email.clone(),
            locale: locale.clone(),
        });
        Ok(())
    }
}

/// Dispatcher that records confirmations as structured log events.
///
/// Used by the server when no mail provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for LogNotificationDispatcher {
    async fn send(
        &self,
        registration: &Registration,
        event: &Event,
        locale: &Locale,
    ) -> Result<(), NotificationError> {
        tracing::info!(
            registration_id = %registration.id,
            event_id = %event.id,
            event_title = %event.title,
            party_size = registration.party_size.get(),
            recipient = registration.contact.email.as_deref().unwrap_or("-"),
            %locale,
            "registration confirmation"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use domain::{Contact, PartySize};

    use super::*;

    fn registration_for(event: &Event) -> Registration {
        Registration::new(
            event.id,
            PartySize::DEFAULT,
            Contact::named("Ann").with_email("ann@example.org"),
        )
    }

    #[tokio::test]
    async fn records_sent_confirmations() {
        let dispatcher = InMemoryNotificationDispatcher::new();
        let event = Event::new("Picnic", None);
        let registration = registration_for(&event);

        dispatcher
            .send(&registration, &event, &Locale::new("fi"))
            .await
            .unwrap();

        assert_eq!(dispatcher.sent_count(), 1);
        assert!(dispatcher.was_notified(registration.id));
        let sent = &dispatcher.sent()[0];
        assert_eq!(sent.recipient.as_deref(), Some("ann@example.org"));
        assert_eq!(sent.locale, Locale::new("fi"));
    }

    #[tokio::test]
    async fn fail_on_send() {
        let dispatcher = InMemoryNotificationDispatcher::new();
        dispatcher.set_fail_on_send(true);
        let event = Event::new("Picnic", None);
        let registration = registration_for(&event);

        let result = dispatcher
            .send(&registration, &event, &Locale::default())
            .await;
        assert!(result.is_err());
        assert_eq!(dispatcher.sent_count(), 0);
        assert_eq!(dispatcher.attempt_count(), 1);
    }

    #[tokio::test]
    async fn log_dispatcher_always_succeeds() {
        let event = Event::new("Picnic", None);
        let registration = registration_for(&event);

        let result = LogNotificationDispatcher
            .send(&registration, &event, &Locale::default())
            .await;
        assert!(result.is_ok());
    }
}
