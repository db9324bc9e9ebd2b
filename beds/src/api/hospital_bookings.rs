//! Hospital-facing booking endpoints.
//!
//! - GET /hospital/bed-bookings?status=&ward_type= - List the hospital's bookings
//! - GET /hospital/bed-bookings/by-ward - Confirmed bookings grouped by ward
//! - PUT /hospital/bed-bookings/:id/status - Change a booking's status

use super::{JsonBody, QueryParams};
use crate::auth::AuthHospital;
use crate::booking::WardBookingView;
use crate::providers::BedStore;
use crate::server::AppState;
use crate::types::{Booking, BookingId, BookingStatus, BookingWithUser};
use axum::extract::{Path, State};
use axum::Json;
use pocketcare_web::AppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Request Types
// ============================================================================

/// Listing filters.
#[derive(Debug, Default, Deserialize)]
pub struct BookingListQuery {
    /// Only this status
    pub status: Option<String>,
    /// Only this ward type
    pub ward_type: Option<String>,
}

/// Status change.
#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    /// `confirmed`, `rejected`, `completed` or `cancelled`
    #[serde(default)]
    pub status: String,
    /// Replacement notes
    pub notes: Option<String>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A booking as shown to hospital staff.
#[derive(Debug, Serialize)]
pub struct HospitalBookingView {
    /// Stored booking fields
    #[serde(flatten)]
    pub booking: Booking,
    /// Booking user's name
    pub user_name: String,
    /// Booking user's email
    pub user_email: String,
    /// Booking user's registered phone
    pub user_phone_registered: Option<String>,
}

impl From<BookingWithUser> for HospitalBookingView {
    fn from(row: BookingWithUser) -> Self {
        Self {
            booking: row.booking,
            user_name: row.user.name,
            user_email: row.user.email,
            user_phone_registered: row.user.phone,
        }
    }
}

/// Hospital's bookings.
#[derive(Debug, Serialize)]
pub struct HospitalBookingsResponse {
    /// Newest first
    pub bookings: Vec<HospitalBookingView>,
}

/// Confirmed bookings grouped by ward key.
#[derive(Debug, Serialize)]
pub struct BookingsByWardResponse {
    /// Always true
    pub success: bool,
    /// Ward key → bookings, latest admission date first
    pub bookings_by_ward: BTreeMap<String, Vec<WardBookingView>>,
}

/// Result of a status change.
#[derive(Debug, Serialize)]
pub struct StatusUpdateResponse {
    /// Human-readable outcome
    pub message: String,
    /// Booking ID
    pub booking_id: BookingId,
    /// New status
    pub status: BookingStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// List the hospital's bookings, optionally filtered by status and ward type.
pub async fn list_bookings<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(hospital_id): AuthHospital,
    QueryParams(query): QueryParams<BookingListQuery>,
) -> Result<Json<HospitalBookingsResponse>, AppError> {
    let bookings = state
        .bookings
        .list_hospital_bookings(hospital_id, query.status, query.ward_type)
        .await?;

    Ok(Json(HospitalBookingsResponse {
        bookings: bookings.into_iter().map(HospitalBookingView::from).collect(),
    }))
}

/// Confirmed bookings grouped by ward, for the bed management board.
///
/// # Example
///
/// ```json
/// {
///   "success": true,
///   "bookings_by_ward": {
///     "general_non_ac": [
///       {
///         "id": 7,
///         "booking_id": "BK-0007",
///         "bed_number": "BED-0007",
///         "patient_name": "Ana Costa",
///         "admission_date": "2025-03-01",
///         "admission_reason": "Not specified",
///         "booked_by": {"user_id": 3, "name": "Ana", "email": "ana@example.com", "phone": null}
///       }
///     ],
///     "private_1bed_with_bath": []
///   }
/// }
/// ```
pub async fn list_bookings_by_ward<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(hospital_id): AuthHospital,
) -> Result<Json<BookingsByWardResponse>, AppError> {
    let bookings_by_ward = state.bookings.list_bookings_by_ward(hospital_id).await?;

    Ok(Json(BookingsByWardResponse {
        success: true,
        bookings_by_ward,
    }))
}

/// Change a booking's status.
///
/// Moving a confirmed booking to `cancelled`, `rejected` or `completed`
/// returns its bed to the ward.
pub async fn update_status<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthHospital(hospital_id): AuthHospital,
    Path(booking_id): Path<i64>,
    JsonBody(request): JsonBody<StatusUpdateRequest>,
) -> Result<Json<StatusUpdateResponse>, AppError> {
    let status = state
        .bookings
        .update_booking_status(BookingId(booking_id), hospital_id, &request.status, request.notes)
        .await?;

    Ok(Json(StatusUpdateResponse {
        message: format!("Booking status updated to {status}"),
        booking_id: BookingId(booking_id),
        status,
    }))
}
