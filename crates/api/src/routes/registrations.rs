//! Registration create and cancel endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{EventId, RegistrationId};
use domain::{Contact, NewRegistration, Registration};
use registration_service::{CancellationOutcome, CreateOutcome, NotificationStatus};
use registration_store::RegistrationStore;
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateRegistrationRequest {
    #[serde(flatten)]
    pub contact: Contact,
    /// Defaults to 1 when omitted.
    #[serde(default)]
    pub party_size: Option<i64>,
}

// -- Response types --

#[derive(Serialize)]
pub struct RegistrationCreatedResponse {
    pub registration: Registration,
    pub attendees: u32,
    pub remaining_capacity: Option<u32>,
    /// `"sent"` or `"failed"`.
    pub notification: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

// -- Handlers --

/// POST /events/{id}/registrations: register a party.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<CreateRegistrationRequest>,
) -> Result<(StatusCode, Json<RegistrationCreatedResponse>), ApiError> {
    let event_id: EventId = parse_id("event", &id)?;
    let request = NewRegistration {
        event_id,
        party_size: req.party_size,
        contact: req.contact,
    };

    let confirmation = match state.service.create(request).await? {
        CreateOutcome::Created(confirmation) => confirmation,
        CreateOutcome::Rejected(rejection) => return Err(ApiError::Rejected(rejection)),
    };

    let warning = confirmation.warning().map(String::from);
    let notification = match confirmation.notification {
        NotificationStatus::Sent => "sent",
        NotificationStatus::Failed { .. } => "failed",
    };

    let response = RegistrationCreatedResponse {
        attendees: confirmation.event.current_attendees,
        remaining_capacity: confirmation.event.remaining_capacity(),
        registration: confirmation.registration,
        notification,
        warning,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// DELETE /registrations/{id}: cancel a registration.
///
/// A registration that is already gone answers 404 and changes nothing.
#[tracing::instrument(skip(state))]
pub async fn cancel<S: RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let registration_id: RegistrationId = parse_id("registration", &id)?;

    match state.service.cancel(registration_id).await? {
        CancellationOutcome::Cancelled(_) => Ok(StatusCode::NO_CONTENT),
        CancellationOutcome::NotFound => Err(ApiError::NotFound(format!(
            "Registration {id} not found"
        ))),
    }
}
