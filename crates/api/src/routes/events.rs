//! Event provisioning and read endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::EventId;
use domain::{Event, Registration};
use projections::AttendeeSummary;
use registration_store::RegistrationStore;
use serde::{Deserialize, Serialize};

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    /// Omitted or null for unlimited.
    #[serde(default)]
    pub capacity: Option<u32>,
}

// -- Response types --

#[derive(Serialize)]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub remaining_capacity: Option<u32>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            remaining_capacity: event.remaining_capacity(),
            event,
        }
    }
}

#[derive(Serialize)]
pub struct AttendeesResponse {
    pub event_id: EventId,
    #[serde(flatten)]
    pub summary: AttendeeSummary,
    /// The summary as shown to members.
    pub text: String,
}

// -- Handlers --

/// POST /events: provision an event with no attendees.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Event title is required".to_string()));
    }

    let event = state
        .service
        .provision_event(title.to_string(), req.capacity)
        .await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// GET /events/{id}: the event with its attendee count and remaining room.
#[tracing::instrument(skip(state))]
pub async fn get<S: RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<EventResponse>, ApiError> {
    let event_id: EventId = parse_id("event", &id)?;
    let event = state
        .service
        .get_event(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {id} not found")))?;

    Ok(Json(event.into()))
}

/// GET /events/{id}/registrations: every registration in creation order.
#[tracing::instrument(skip(state))]
pub async fn registrations<S: RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let event_id: EventId = parse_id("event", &id)?;
    let registrations = state
        .service
        .list_by_event(event_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Event {id} not found")))?;

    Ok(Json(registrations))
}

/// GET /events/{id}/attendees: the attendee summary.
#[tracing::instrument(skip(state))]
pub async fn attendees<S: RegistrationStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<AttendeesResponse>, ApiError> {
    let event_id: EventId = parse_id("event", &id)?;
    let summary = state
        .attendees
        .summarize(event_id, state.max_named_attendees)
        .await?;

    Ok(Json(AttendeesResponse {
        event_id,
        text: summary.to_string(),
        summary,
    }))
}
