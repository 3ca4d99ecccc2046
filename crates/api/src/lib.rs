//! HTTP API server with observability for event registrations.
//!
//! Provides REST endpoints for provisioning events, registering and
//! cancelling parties, and reading attendee summaries, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use projections::AttendeeViewBuilder;
use registration_service::{LogNotificationDispatcher, RegistrationService};
use registration_store::RegistrationStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state accessible from all handlers.
pub struct AppState<S: RegistrationStore> {
    pub service: RegistrationService<S, LogNotificationDispatcher>,
    pub attendees: AttendeeViewBuilder<S>,
    /// Largest attendee count listed by name in summaries.
    pub max_named_attendees: usize,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: RegistrationStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/events", post(routes::events::create::<S>))
        .route("/events/{id}", get(routes::events::get::<S>))
        .route(
            "/events/{id}/registrations",
            post(routes::registrations::create::<S>).get(routes::events::registrations::<S>),
        )
        .route("/events/{id}/attendees", get(routes::events::attendees::<S>))
        .route(
            "/registrations/{id}",
            delete(routes::registrations::cancel::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a store, confirming registrations
/// through the log dispatcher.
pub fn create_default_state<S: RegistrationStore + Clone + 'static>(
    store: S,
    max_named_attendees: usize,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        service: RegistrationService::new(store.clone(), LogNotificationDispatcher),
        attendees: AttendeeViewBuilder::new(store),
        max_named_attendees,
    })
}

/// Registers descriptions for the metrics recorded by the service.
pub fn describe_metrics() {
    metrics::describe_counter!(
        "registrations_admitted_total",
        "Registrations committed to the store"
    );
    metrics::describe_counter!(
        "registrations_rejected_total",
        "Registration requests refused, labelled by reason"
    );
    metrics::describe_counter!(
        "registrations_cancelled_total",
        "Registrations removed by cancellation"
    );
    metrics::describe_counter!(
        "notifications_failed_total",
        "Confirmations that could not be delivered"
    );
    metrics::describe_histogram!(
        "registration_create_duration_seconds",
        metrics::Unit::Seconds,
        "Time to handle a create request, labelled by outcome (created, rejected, error)"
    );
}
