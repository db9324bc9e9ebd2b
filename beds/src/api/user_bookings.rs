//! Patient-facing bed booking endpoints.
//!
//! - POST /user/bed-bookings - Book a bed (confirmed immediately)
//! - GET /user/bed-bookings - List the caller's bookings
//! - DELETE /user/bed-bookings/:id - Cancel one of the caller's bookings

use super::JsonBody;
use crate::auth::AuthUser;
use crate::booking::CreateBookingRequest;
use crate::providers::BedStore;
use crate::server::AppState;
use crate::types::{Booking, BookingId, BookingStatus, BookingWithHospital};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use pocketcare_web::AppError;
use serde::Serialize;

// ============================================================================
// Response Types
// ============================================================================

/// Response after a successful booking.
#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    /// Human-readable confirmation
    pub message: String,
    /// New booking ID
    pub booking_id: BookingId,
    /// Hospital display name
    pub hospital_name: String,
    /// Always `confirmed`
    pub status: BookingStatus,
}

/// A booking as shown to the patient.
#[derive(Debug, Serialize)]
pub struct UserBookingView {
    /// Stored booking fields
    #[serde(flatten)]
    pub booking: Booking,
    /// Alias of `preferred_date` used by the booking form
    pub admission_date: NaiveDate,
    /// Alias of `admission_reason` used by the booking form
    pub medical_condition: Option<String>,
    /// Hospital name
    pub hospital_name: String,
    /// Hospital address
    pub hospital_address: Option<String>,
    /// Hospital phone
    pub hospital_phone: Option<String>,
}

impl From<BookingWithHospital> for UserBookingView {
    fn from(row: BookingWithHospital) -> Self {
        Self {
            admission_date: row.booking.preferred_date,
            medical_condition: row.booking.admission_reason.clone(),
            booking: row.booking,
            hospital_name: row.hospital_name,
            hospital_address: row.hospital_address,
            hospital_phone: row.hospital_phone,
        }
    }
}

/// Caller's bookings.
#[derive(Debug, Serialize)]
pub struct UserBookingsResponse {
    /// Newest first
    pub bookings: Vec<UserBookingView>,
}

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Book a bed.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:5000/user/bed-bookings \
///   -H "Authorization: Bearer $TOKEN" \
///   -H "Content-Type: application/json" \
///   -d '{"hospital_id": 1, "ward_type": "general", "ac_type": "non_ac",
///        "patient_name": "Ana Costa", "patient_phone": "555-0100",
///        "admission_date": "2025-03-01"}'
/// ```
///
/// Response (201):
/// ```json
/// {
///   "message": "Bed booked successfully! Your reservation is confirmed.",
///   "booking_id": 42,
///   "hospital_name": "City General",
///   "status": "confirmed"
/// }
/// ```
pub async fn create_booking<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    JsonBody(request): JsonBody<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingCreatedResponse>), AppError> {
    let confirmation = state.bookings.create_booking(user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingCreatedResponse {
            message: "Bed booked successfully! Your reservation is confirmed.".to_string(),
            booking_id: confirmation.booking_id,
            hospital_name: confirmation.hospital_name,
            status: confirmation.status,
        }),
    ))
}

/// List the caller's bookings, newest first.
pub async fn list_bookings<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserBookingsResponse>, AppError> {
    let bookings = state.bookings.list_user_bookings(user_id).await?;

    Ok(Json(UserBookingsResponse {
        bookings: bookings.into_iter().map(UserBookingView::from).collect(),
    }))
}

/// Cancel one of the caller's bookings.
///
/// Returns 404 for bookings the caller does not own and 400 for bookings
/// already cancelled or completed.
pub async fn cancel_booking<S: BedStore>(
    State(state): State<AppState<S>>,
    AuthUser(user_id): AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .bookings
        .cancel_booking(BookingId(booking_id), user_id)
        .await?;

    Ok(Json(MessageResponse {
        message: "Booking cancelled successfully".to_string(),
    }))
}
