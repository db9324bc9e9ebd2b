//! Allocation log endpoints.
//!
//! - GET /bed-allocation-logs?hospital_id=&limit= - Recent entries, newest first
//! - POST /bed-allocation-logs - Record a manual allocation event

use super::{ensure_owner, require_hospital_id, JsonBody, QueryParams};
use crate::allocation_log::{clamp_limit, AllocationLogRequest};
use crate::auth::AuthHospital;
use crate::error::BedError;
use crate::input;
use crate::providers::{
    AllocationLogRepository, BedStore, NewAllocationLog, PrivateRoomRepository, WardLedger,
};
use crate::server::AppState;
use crate::types::{AllocationLogEntry, LogId};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use pocketcare_web::AppError;
use serde::{Deserialize, Serialize};

/// Listing parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LogListQuery {
    /// Hospital (required).
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub hospital_id: Option<i64>,
    /// Page size, default 50, at most 500.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub limit: Option<i64>,
}

/// Recent entries.
#[derive(Debug, Serialize)]
pub struct LogsResponse {
    /// Always true
    pub success: bool,
    /// Newest first
    pub logs: Vec<AllocationLogEntry>,
}

/// Result of an append.
#[derive(Debug, Serialize)]
pub struct LogCreatedResponse {
    /// Always true
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// New entry
    pub log_id: LogId,
}

/// Recent allocation log entries of the caller's hospital.
///
/// # Example
///
/// ```bash
/// curl "http://localhost:5000/bed-allocation-logs?hospital_id=1&limit=20" \
///   -H "Authorization: Bearer $HOSPITAL_TOKEN"
/// ```
pub async fn list_logs<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    QueryParams(query): QueryParams<LogListQuery>,
) -> Result<Json<LogsResponse>, AppError> {
    let hospital_id = require_hospital_id(query.hospital_id)?;
    ensure_owner(caller, hospital_id)?;

    let logs = state
        .store
        .list_logs(hospital_id, clamp_limit(query.limit))
        .await?;

    Ok(Json(LogsResponse {
        success: true,
        logs,
    }))
}

/// Record a manual allocation event (admission, discharge, transfer).
pub async fn create_log<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    JsonBody(request): JsonBody<AllocationLogRequest>,
) -> Result<(StatusCode, Json<LogCreatedResponse>), AppError> {
    let entry = NewAllocationLog::try_from(request)?;
    ensure_owner(caller, entry.hospital_id)?;

    // Referenced ward and room must belong to the same hospital.
    if let Some(ward_id) = entry.ward_id {
        let ward = state
            .store
            .get_ward(ward_id)
            .await?
            .ok_or_else(|| BedError::not_found("Ward", ward_id.get()))?;
        ensure_owner(entry.hospital_id, ward.hospital_id)?;
    }
    if let Some(room_id) = entry.room_id {
        let room = state
            .store
            .get_room(room_id)
            .await?
            .ok_or_else(|| BedError::not_found("Private room", room_id.get()))?;
        ensure_owner(entry.hospital_id, room.hospital_id)?;
    }

    let log_id = state.store.append_log(&entry).await?;

    Ok((
        StatusCode::CREATED,
        Json(LogCreatedResponse {
            success: true,
            message: "Allocation log created successfully".to_string(),
            log_id,
        }),
    ))
}
