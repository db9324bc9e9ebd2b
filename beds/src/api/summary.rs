//! Bed summary endpoint.
//!
//! - GET /bed-summary?hospital_id= - Ward and room statistics for a hospital

use super::{ensure_owner, HospitalQuery, QueryParams};
use crate::auth::AnyIdentity;
use crate::providers::{BedStore, PrivateRoomRepository, WardLedger};
use crate::server::AppState;
use crate::summary::{summarize, BedSummary};
use axum::extract::State;
use axum::Json;
use pocketcare_web::AppError;
use serde::Serialize;

/// Dashboard summary.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    /// Always true
    pub success: bool,
    /// Statistics
    #[serde(flatten)]
    pub summary: BedSummary,
}

/// Summarise a hospital's wards and private rooms.
///
/// Only the hospital itself may read its summary; user tokens get 403.
///
/// # Example
///
/// ```json
/// {
///   "success": true,
///   "ward_statistics": [
///     {"ward_type": "general", "ac_type": "non_ac", "total_beds": 10,
///      "available_beds": 2, "occupied_beds": 7, "reserved_beds": 1}
///   ],
///   "room_statistics": [
///     {"bed_count": 1, "ac_type": "ac", "has_attached_bathroom": true,
///      "status": "available", "count": 3}
///   ],
///   "total_statistics": {"total_ward_beds": 10, "available_ward_beds": 2}
/// }
/// ```
pub async fn bed_summary<S: BedStore>(
    State(state): State<AppState<S>>,
    AnyIdentity(identity): AnyIdentity,
    QueryParams(query): QueryParams<HospitalQuery>,
) -> Result<Json<SummaryResponse>, AppError> {
    let hospital_id = query.require()?;
    let caller = identity
        .as_hospital()
        .ok_or_else(|| AppError::forbidden("Access denied"))?;
    ensure_owner(caller, hospital_id)?;

    let wards = state.store.list_wards(hospital_id).await?;
    let rooms = state.store.list_rooms(hospital_id, None).await?;

    Ok(Json(SummaryResponse {
        success: true,
        summary: summarize(&wards, &rooms),
    }))
}
