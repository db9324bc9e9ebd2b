//! Readiness endpoint wired to the bed store.

use super::state::AppState;
use crate::providers::BedStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pocketcare_web::handlers::readiness_check;
use pocketcare_web::ReadinessReport;
use std::sync::Arc;

/// Report whether the bed store can serve queries.
///
/// # Endpoint
///
/// ```text
/// GET /ready
/// ```
pub async fn readiness<S: BedStore>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<ReadinessReport>) {
    readiness_check(State(Arc::clone(&state.store))).await
}
