//! Private room inventory endpoints.
//!
//! - GET /private-rooms?hospital_id=&status= - List rooms (any signed-in caller)
//! - POST /private-rooms - Create a room
//! - PUT /private-rooms/:id - Partially update a room
//! - DELETE /private-rooms/:id - Delete a room

use super::{ensure_owner, require_hospital_id, JsonBody, QueryParams};
use crate::auth::{AnyIdentity, AuthHospital};
use crate::error::BedError;
use crate::input::{self, non_empty};
use crate::providers::{BedStore, PrivateRoomRepository};
use crate::rooms::{room_patch_from_json, CreateRoomRequest};
use crate::server::AppState;
use crate::types::{HospitalId, PrivateRoom, RoomId, RoomStatus};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pocketcare_web::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Request Types
// ============================================================================

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct RoomListQuery {
    /// Hospital (required).
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub hospital_id: Option<i64>,
    /// Only rooms in this status.
    pub status: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A hospital's rooms.
#[derive(Debug, Serialize)]
pub struct RoomsResponse {
    /// Always true
    pub success: bool,
    /// Ordered by room number
    pub rooms: Vec<PrivateRoom>,
}

/// Result of a create.
#[derive(Debug, Serialize)]
pub struct RoomCreatedResponse {
    /// Always true
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
    /// New room
    pub room_id: RoomId,
}

/// Result of an update or delete.
#[derive(Debug, Serialize)]
pub struct RoomMessageResponse {
    /// Always true
    pub success: bool,
    /// Human-readable outcome
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// List a hospital's private rooms.
pub async fn list_rooms<S: BedStore>(
    State(state): State<AppState<S>>,
    AnyIdentity(_identity): AnyIdentity,
    QueryParams(query): QueryParams<RoomListQuery>,
) -> Result<Json<RoomsResponse>, AppError> {
    let hospital_id = require_hospital_id(query.hospital_id)?;
    let status = non_empty(query.status)
        .map(|s| s.parse::<RoomStatus>())
        .transpose()
        .map_err(BedError::from)?;

    let rooms = state.store.list_rooms(hospital_id, status).await?;

    Ok(Json(RoomsResponse {
        success: true,
        rooms,
    }))
}

/// Create a private room.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/private-rooms \
///   -H "Authorization: Bearer $HOSPITAL_TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"hospital_id": 1, "room_number": "P-101", "bed_count": 1,
///        "ac_type": "ac", "has_attached_bathroom": true, "daily_rate": 2500}'
/// ```
///
/// Response (201):
/// ```json
/// {"success": true, "message": "Private room created successfully", "room_id": 4}
/// ```
pub async fn create_room<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    JsonBody(request): JsonBody<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomCreatedResponse>), AppError> {
    let room = request.validate()?;
    ensure_owner(caller, room.hospital_id)?;

    let room_id = state.store.create_room(&room).await?;
    tracing::info!(%room_id, hospital_id = %caller, room_number = %room.room_number, "Private room created");

    Ok((
        StatusCode::CREATED,
        Json(RoomCreatedResponse {
            success: true,
            message: "Private room created successfully".to_string(),
            room_id,
        }),
    ))
}

/// Partially update a private room.
///
/// Keys absent from the body are left alone; `null` or `""` clears a
/// nullable field such as `patient_name`.
pub async fn update_room<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    Path(room_id): Path<i64>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> Result<Json<RoomMessageResponse>, AppError> {
    let room_id = RoomId(room_id);
    owned_room(&state, caller, room_id).await?;

    let patch = room_patch_from_json(&body)?;
    state.store.update_room(room_id, &patch).await?;

    Ok(Json(RoomMessageResponse {
        success: true,
        message: "Private room updated successfully".to_string(),
    }))
}

/// Delete a private room.
pub async fn delete_room<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(caller): AuthHospital,
    Path(room_id): Path<i64>,
) -> Result<Json<RoomMessageResponse>, AppError> {
    let room_id = RoomId(room_id);
    owned_room(&state, caller, room_id).await?;

    state.store.delete_room(room_id).await?;
    tracing::info!(%room_id, hospital_id = %caller, "Private room deleted");

    Ok(Json(RoomMessageResponse {
        success: true,
        message: "Private room deleted successfully".to_string(),
    }))
}

async fn owned_room<S: BedStore>(
    state: &AppState<S>,
    caller: HospitalId,
    room_id: RoomId,
) -> Result<PrivateRoom, AppError> {
    let room = state
        .store
        .get_room(room_id)
        .await?
        .ok_or_else(|| BedError::not_found("Private room", room_id.get()))?;
    ensure_owner(caller, room.hospital_id)?;
    Ok(room)
}
