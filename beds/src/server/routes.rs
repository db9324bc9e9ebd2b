//! Router configuration for the bed service.
//!
//! Builds the complete Axum router with all endpoints.

use super::health::readiness;
use super::state::AppState;
use crate::api::{
    allocation_logs, hospital_bookings, private_rooms, summary, user_bookings, wards,
};
use crate::providers::BedStore;
use axum::{
    middleware::from_fn,
    routing::{delete, get, put},
    Router,
};
use pocketcare_web::handlers::health_check;
use pocketcare_web::middleware::propagate_correlation_id;

/// Build the complete Axum router.
///
/// Configures all routes including:
/// - Health checks
/// - Patient booking endpoints
/// - Hospital booking management
/// - Ward, private room and allocation log management
/// - Bed summary
///
/// Every request gets a correlation ID and a tracing span.
///
/// # Arguments
///
/// - `state`: Application state to share with handlers
pub fn build_router<S: BedStore>(state: AppState<S>) -> Router {
    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness::<S>))
        // Patient bookings
        .route(
            "/user/bed-bookings",
            get(user_bookings::list_bookings::<S>).post(user_bookings::create_booking::<S>),
        )
        .route(
            "/user/bed-bookings/:id",
            delete(user_bookings::cancel_booking::<S>),
        )
        // Hospital booking management
        .route(
            "/hospital/bed-bookings",
            get(hospital_bookings::list_bookings::<S>),
        )
        .route(
            "/hospital/bed-bookings/by-ward",
            get(hospital_bookings::list_bookings_by_ward::<S>),
        )
        .route(
            "/hospital/bed-bookings/:id/status",
            put(hospital_bookings::update_status::<S>),
        )
        // Ward capacity
        .route(
            "/bed-wards",
            get(wards::list_wards::<S>).post(wards::upsert_ward::<S>),
        )
        .route(
            "/bed-wards/:id",
            put(wards::update_ward::<S>).delete(wards::delete_ward::<S>),
        )
        // Private rooms
        .route(
            "/private-rooms",
            get(private_rooms::list_rooms::<S>).post(private_rooms::create_room::<S>),
        )
        .route(
            "/private-rooms/:id",
            put(private_rooms::update_room::<S>).delete(private_rooms::delete_room::<S>),
        )
        // Allocation log
        .route(
            "/bed-allocation-logs",
            get(allocation_logs::list_logs::<S>).post(allocation_logs::create_log::<S>),
        )
        // Summary
        .route("/bed-summary", get(summary::bed_summary::<S>))
        .layer(from_fn(propagate_correlation_id))
        .with_state(state)
}
