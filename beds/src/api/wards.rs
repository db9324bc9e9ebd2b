//! Ward capacity endpoints.
//!
//! - GET /bed-wards?hospital_id= - List a hospital's wards (public)
//! - POST /bed-wards - Create or update a ward's counters
//! - PUT /bed-wards/:id - Partially update a ward's counters
//! - DELETE /bed-wards/:id - Delete a ward

use super::{ensure_owner, HospitalQuery, JsonBody, QueryParams};
use crate::auth::AuthHospital;
use crate::error::BedError;
use crate::ledger::{WardCountsPatch, WardUpsert, WardUpsertRequest};
use crate::providers::{BedStore, WardLedger};
use crate::server::AppState;
use crate::types::{HospitalId, Ward, WardId};
use axum::extract::{Path, State};
use axum::Json;
use pocketcare_web::AppError;
use serde::Serialize;

// ============================================================================
// Response Types
// ============================================================================

/// A hospital's wards.
#[derive(Debug, Serialize)]
pub struct WardsResponse {
    /// Always true
    pub success: bool,
    /// Ordered by ward type, AC type, room config
    pub wards: Vec<Ward>,
}

/// Result of an upsert.
#[derive(Debug, Serialize)]
pub struct WardUpsertResponse {
    /// Always true
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Updated or created ward
    pub ward_id: WardId,
}

/// Result of a partial update.
#[derive(Debug, Serialize)]
pub struct WardUpdateResponse {
    /// Always true
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// Ward after the update
    pub ward: Ward,
}

/// Result of a delete.
#[derive(Debug, Serialize)]
pub struct WardDeleteResponse {
    /// Always true
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List a hospital's wards. No authentication: patients browse availability
/// before booking.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:5000/bed-wards?hospital_id=1"
/// ```
pub async fn list_wards<S: BedStore>(
    State(state): State<AppState<S>>,
    QueryParams(query): QueryParams<HospitalQuery>,
) -> Result<Json<WardsResponse>, AppError> {
    let hospital_id = query.require()?;
    let wards = state.store.list_wards(hospital_id).await?;

    Ok(Json(WardsResponse {
        success: true,
        wards,
    }))
}

/// Create or update the ward identified by hospital, ward type, AC type and
/// room configuration.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/bed-wards \
///   -H "Authorization: Bearer $HOSPITAL_TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"hospital_id": 1, "ward_type": "general", "ac_type": "non_ac",
///        "total_beds": 10, "occupied_beds": 7}'
/// ```
pub async fn upsert_ward<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    JsonBody(request): JsonBody<WardUpsertRequest>,
) -> Result<Json<WardUpsertResponse>, AppError> {
    let upsert = WardUpsert::try_from(request)?;
    ensure_owner(caller, upsert.hospital_id)?;

    let ward_id = state.store.upsert_ward(&upsert).await?;
    tracing::info!(%ward_id, hospital_id = %upsert.hospital_id, ward_type = %upsert.ward_type, "Ward counters saved");

    Ok(Json(WardUpsertResponse {
        success: true,
        message: "Ward bed status updated successfully".to_string(),
        ward_id,
    }))
}

/// Partially update a ward's counters.
pub async fn update_ward<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    Path(ward_id): Path<i64>,
    JsonBody(patch): JsonBody<WardCountsPatch>,
) -> Result<Json<WardUpdateResponse>, AppError> {
    let ward_id = WardId(ward_id);
    owned_ward(&state, caller, ward_id).await?;

    let ward = state.store.update_ward_counts(ward_id, &patch).await?;

    Ok(Json(WardUpdateResponse {
        success: true,
        message: "Ward updated successfully".to_string(),
        ward,
    }))
}

/// Delete a ward.
pub async fn delete_ward<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    Path(ward_id): Path<i64>,
) -> Result<Json<WardDeleteResponse>, AppError> {
    let ward_id = WardId(ward_id);
    owned_ward(&state, caller, ward_id).await?;

    state.store.delete_ward(ward_id).await?;
    tracing::info!(%ward_id, hospital_id = %caller, "Ward deleted");

    Ok(Json(WardDeleteResponse {
        success: true,
        message: "Ward deleted successfully".to_string(),
    }))
}

async fn owned_ward<S: BedStore>(
    state: &AppState<S>,
    caller: HospitalId,
    ward_id: WardId,
) -> Result<Ward, AppError> {
    let ward = state
        .store
        .get_ward(ward_id)
        .await?
        .ok_or_else(|| BedError::not_found("Ward", ward_id.get()))?;
    ensure_owner(caller, ward.hospital_id)?;
    Ok(ward)
}
