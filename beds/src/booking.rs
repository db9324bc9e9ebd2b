//! Booking lifecycle manager.
//!
//! Bookings are created directly as `confirmed` and can then move to
//! `cancelled`, `rejected` or `completed`:
//!
//! ```text
//!              ┌──────────▶ rejected ──┐
//!              │                       ▼
//! confirmed ───┼──────────▶ cancelled (terminal)
//!              │
//!              └──────────▶ completed (terminal)
//! ```
//!
//! Nothing leads back to `confirmed`. Exactly one bed is reserved when a
//! booking is created and exactly one is released when it leaves
//! `confirmed`; every other transition leaves ward counters untouched.

use crate::error::{BedError, Result};
use crate::input::{self, non_empty, parse_date};
use crate::ledger::WardLookup;
use crate::metrics;
use crate::providers::{
    BedStore, BookingFilter, BookingTransition, NewAllocationLog, NewBooking, ReleaseTarget,
    TransitionOutcome,
};
use crate::types::{
    AcType, AllocationAction, Booking, BookingId, BookingStatus, BookingWithHospital,
    BookingWithUser, Gender, HospitalId, RoomConfig, UserContact, UserId, WardId, WardType,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Admission reason shown when the patient gave none.
pub const DEFAULT_ADMISSION_REASON: &str = "Not specified";

// ============================================================================
// Requests
// ============================================================================

/// Booking request as submitted by the booking form.
///
/// Every field is optional at this stage so that missing fields can be
/// reported together.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookingRequest {
    /// Hospital.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub hospital_id: Option<i64>,
    /// Ward category.
    pub ward_type: Option<String>,
    /// AC variant, default `not_applicable`.
    pub ac_type: Option<String>,
    /// Private room configuration.
    pub room_config: Option<String>,
    /// Patient name.
    pub patient_name: Option<String>,
    /// Patient age.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub patient_age: Option<i32>,
    /// Patient gender.
    pub patient_gender: Option<String>,
    /// Patient phone.
    pub patient_phone: Option<String>,
    /// Patient email. Defaults to the booking user's email.
    pub patient_email: Option<String>,
    /// Emergency contact.
    pub emergency_contact: Option<String>,
    /// Preferred admission date, `YYYY-MM-DD`.
    #[serde(alias = "preferred_date")]
    pub admission_date: Option<String>,
    /// Expected discharge date, `YYYY-MM-DD`.
    pub expected_discharge_date: Option<String>,
    /// Reason for admission.
    #[serde(alias = "admission_reason")]
    pub medical_condition: Option<String>,
    /// Referring doctor.
    pub doctor_name: Option<String>,
    /// Special requirements.
    pub special_requirements: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

impl CreateBookingRequest {
    /// Validate and normalise into a [`NewBooking`] for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`BedError::Validation`] listing missing required fields, or
    /// naming the first malformed one.
    pub fn validate(self, user_id: UserId) -> Result<NewBooking> {
        let ward_type = non_empty(self.ward_type);
        let patient_name = non_empty(self.patient_name);
        let patient_phone = non_empty(self.patient_phone);
        let admission_date = non_empty(self.admission_date);

        let missing: Vec<&str> = [
            ("hospital_id", self.hospital_id.is_none()),
            ("ward_type", ward_type.is_none()),
            ("patient_name", patient_name.is_none()),
            ("patient_phone", patient_phone.is_none()),
            ("admission_date", admission_date.is_none()),
        ]
        .into_iter()
        .filter_map(|(field, is_missing)| is_missing.then_some(field))
        .collect();

        let (Some(hospital_id), Some(ward_type), Some(patient_name), Some(patient_phone), Some(admission_date)) =
            (self.hospital_id, ward_type, patient_name, patient_phone, admission_date)
        else {
            return Err(BedError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let ward_type: WardType = ward_type.parse()?;
        let mut ac_type = non_empty(self.ac_type)
            .map(|s| s.parse::<AcType>())
            .transpose()?
            .unwrap_or_default();
        if ward_type == WardType::PrivateRoom {
            ac_type = AcType::NotApplicable;
        }
        let room_config = non_empty(self.room_config)
            .map(|s| s.parse::<RoomConfig>())
            .transpose()?;
        let patient_gender = non_empty(self.patient_gender)
            .map(|s| s.to_ascii_lowercase().parse::<Gender>())
            .transpose()?;
        if let Some(age) = self.patient_age {
            if !(0..=150).contains(&age) {
                return Err(BedError::Validation("Invalid patient_age".to_string()));
            }
        }

        let preferred_date =
            parse_date("admission_date", &admission_date).map_err(BedError::Validation)?;
        let expected_discharge_date = non_empty(self.expected_discharge_date)
            .map(|d| parse_date("expected_discharge_date", &d))
            .transpose()
            .map_err(BedError::Validation)?;

        Ok(NewBooking {
            user_id,
            hospital_id: HospitalId(hospital_id),
            ward_type,
            ac_type,
            room_config,
            patient_name,
            patient_age: self.patient_age,
            patient_gender,
            patient_phone,
            patient_email: non_empty(self.patient_email),
            emergency_contact: non_empty(self.emergency_contact),
            preferred_date,
            expected_discharge_date,
            admission_reason: non_empty(self.medical_condition),
            doctor_name: non_empty(self.doctor_name),
            special_requirements: non_empty(self.special_requirements),
            notes: non_empty(self.notes),
        })
    }
}

// ============================================================================
// Results & views
// ============================================================================

/// Result of a successful booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfirmation {
    /// New booking.
    pub booking_id: BookingId,
    /// Ward whose bed was reserved.
    pub ward_id: WardId,
    /// Hospital display name.
    pub hospital_name: String,
    /// Always `confirmed`.
    pub status: BookingStatus,
}

/// Confirmed booking as shown in the hospital's bed management view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WardBookingView {
    /// Booking ID.
    pub id: BookingId,
    /// Display booking number (`BK-0042`).
    pub booking_id: String,
    /// Display bed number (`BED-0042`).
    pub bed_number: String,
    /// Patient name.
    pub patient_name: String,
    /// Patient age.
    pub patient_age: Option<i32>,
    /// Patient gender.
    pub patient_gender: Option<Gender>,
    /// Patient phone.
    pub patient_phone: String,
    /// Patient email.
    pub patient_email: Option<String>,
    /// Emergency contact.
    pub emergency_contact: Option<String>,
    /// Preferred admission date.
    pub admission_date: NaiveDate,
    /// Admission reason or [`DEFAULT_ADMISSION_REASON`].
    pub admission_reason: String,
    /// Ward category.
    pub ward_type: WardType,
    /// AC variant.
    pub ac_type: AcType,
    /// Private room configuration.
    pub room_config: Option<RoomConfig>,
    /// Status.
    pub status: BookingStatus,
    /// Booking user.
    pub booked_by: UserContact,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl From<BookingWithUser> for WardBookingView {
    fn from(row: BookingWithUser) -> Self {
        let BookingWithUser { booking, user } = row;
        Self {
            id: booking.id,
            booking_id: format!("BK-{:04}", booking.id.get()),
            bed_number: format!("BED-{:04}", booking.id.get()),
            patient_name: booking.patient_name,
            patient_age: booking.patient_age,
            patient_gender: booking.patient_gender,
            patient_phone: booking.patient_phone,
            patient_email: booking.patient_email,
            emergency_contact: booking.emergency_contact,
            admission_date: booking.preferred_date,
            admission_reason: booking
                .admission_reason
                .unwrap_or_else(|| DEFAULT_ADMISSION_REASON.to_string()),
            ward_type: booking.ward_type,
            ac_type: booking.ac_type,
            room_config: booking.room_config,
            status: booking.status,
            booked_by: user,
            created_at: booking.created_at,
            updated_at: booking.updated_at,
        }
    }
}

/// Grouping key for the bed management view.
///
/// Private rooms group by room configuration; other wards by
/// `{ward_type}_{ac_type}`, or the bare ward type when AC does not apply.
#[must_use]
pub fn ward_group_key(ward_type: WardType, ac_type: AcType, room_config: Option<RoomConfig>) -> String {
    match (ward_type, room_config) {
        (WardType::PrivateRoom, Some(config)) => config.ward_key().to_string(),
        _ if ac_type != AcType::NotApplicable => format!("{ward_type}_{ac_type}"),
        _ => ward_type.to_string(),
    }
}

// ============================================================================
// Manager
// ============================================================================

/// Creates, cancels and transitions bookings, keeping ward counters in step.
pub struct BookingManager<S> {
    store: Arc<S>,
}

impl<S> Clone for BookingManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BedStore> BookingManager<S> {
    /// Create a manager over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Book a bed for `user_id`.
    ///
    /// # Errors
    ///
    /// - Missing or malformed fields → [`BedError::Validation`]
    /// - Unknown hospital → [`BedError::NotFound`]
    /// - No matching ward with a free bed, including losing a concurrent
    ///   race for the last one → [`BedError::CapacityExhausted`]
    #[tracing::instrument(skip_all, fields(user_id = %user_id))]
    pub async fn create_booking(
        &self,
        user_id: UserId,
        request: CreateBookingRequest,
    ) -> Result<BookingConfirmation> {
        let mut booking = match request.validate(user_id) {
            Ok(booking) => booking,
            Err(err) => {
                metrics::record_booking_rejected();
                return Err(err);
            }
        };

        if booking.patient_email.is_none() {
            match self.store.user_email(user_id).await {
                Ok(email) => booking.patient_email = email,
                Err(err) => tracing::warn!(error = %err, "Could not look up user email"),
            }
        }

        let hospital_name = self
            .store
            .hospital_name(booking.hospital_id)
            .await?
            .ok_or_else(|| BedError::not_found("Hospital", booking.hospital_id.get()))?;

        let lookup = WardLookup::resolve(
            booking.hospital_id,
            booking.ward_type,
            booking.ac_type,
            booking.room_config,
        );

        let has_capacity = self
            .store
            .find_ward(&lookup)
            .await?
            .is_some_and(|ward| ward.counts.available_beds > 0);
        if !has_capacity {
            metrics::record_capacity_exhausted(booking.ward_type);
            return Err(BedError::CapacityExhausted {
                ward_type: booking.ward_type,
            });
        }

        let reserved = match self.store.create_confirmed_booking(&booking, &lookup).await {
            Ok(reserved) => reserved,
            Err(err @ BedError::CapacityExhausted { .. }) => {
                tracing::info!(ward_type = %booking.ward_type, "Lost the race for the last bed");
                metrics::record_capacity_exhausted(booking.ward_type);
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        metrics::record_booking_confirmed(booking.ward_type);
        tracing::info!(
            booking_id = %reserved.booking_id,
            ward_id = %reserved.ward_id,
            hospital_id = %booking.hospital_id,
            ward_type = %booking.ward_type,
            "Bed booking confirmed"
        );

        self.record_allocation(NewAllocationLog {
            hospital_id: booking.hospital_id,
            ward_id: Some(reserved.ward_id),
            room_id: None,
            allocation_type: booking.ward_type.allocation_type(),
            action: AllocationAction::Reserved,
            patient_name: Some(booking.patient_name.clone()),
            patient_contact: Some(booking.patient_phone.clone()),
            allocated_by: Some(format!("user_{user_id}")),
            notes: Some(format!("Booking #{} confirmed", reserved.booking_id)),
        })
        .await;

        Ok(BookingConfirmation {
            booking_id: reserved.booking_id,
            ward_id: reserved.ward_id,
            hospital_name,
            status: BookingStatus::Confirmed,
        })
    }

    /// Cancel a user's own booking, releasing its bed if it was confirmed.
    ///
    /// # Errors
    ///
    /// - Booking missing or owned by someone else → [`BedError::NotFound`]
    /// - Booking already cancelled or completed, or changed concurrently →
    ///   [`BedError::InvalidState`]
    #[tracing::instrument(skip_all, fields(booking_id = %booking_id, user_id = %user_id))]
    pub async fn cancel_booking(&self, booking_id: BookingId, user_id: UserId) -> Result<()> {
        let booking = self
            .store
            .find_user_booking(booking_id, user_id)
            .await?
            .ok_or_else(|| BedError::not_found("Booking", booking_id.get()))?;

        if booking.status.is_terminal() {
            return Err(BedError::InvalidState(format!(
                "Cannot cancel a {} booking",
                booking.status
            )));
        }

        let released = self
            .apply_transition(&booking, BookingStatus::Cancelled, None)
            .await?;

        tracing::info!(previous = %booking.status, released = released.is_some(), "Booking cancelled");

        if let Some(ward_id) = released {
            self.record_allocation(release_log(
                &booking,
                ward_id,
                AllocationAction::Cancelled,
                format!("user_{user_id}"),
                format!("Booking #{booking_id} cancelled by user"),
            ))
            .await;
        }

        Ok(())
    }

    /// Change a booking's status on behalf of its hospital.
    ///
    /// A bed is released only when a `confirmed` booking becomes
    /// `cancelled`, `rejected` or `completed`. Setting the current status
    /// again only updates the notes.
    ///
    /// # Errors
    ///
    /// - `new_status` is not confirmed/rejected/completed/cancelled →
    ///   [`BedError::Validation`] (checked before anything else)
    /// - Booking missing or at another hospital → [`BedError::NotFound`]
    /// - Leaving a terminal status, re-confirming, or a concurrent change →
    ///   [`BedError::InvalidState`]
    #[tracing::instrument(skip_all, fields(booking_id = %booking_id, hospital_id = %hospital_id))]
    pub async fn update_booking_status(
        &self,
        booking_id: BookingId,
        hospital_id: HospitalId,
        new_status: &str,
        notes: Option<String>,
    ) -> Result<BookingStatus> {
        let new_status = new_status
            .trim()
            .parse::<BookingStatus>()
            .ok()
            .filter(|status| status.is_hospital_settable())
            .ok_or_else(|| BedError::Validation("Invalid status".to_string()))?;

        let booking = self
            .store
            .find_hospital_booking(booking_id, hospital_id)
            .await?
            .ok_or_else(|| BedError::not_found("Booking", booking_id.get()))?;

        let old_status = booking.status;
        if old_status != new_status {
            if old_status.is_terminal() {
                return Err(BedError::InvalidState(format!(
                    "Cannot change a {old_status} booking to {new_status}"
                )));
            }
            if new_status == BookingStatus::Confirmed {
                return Err(BedError::InvalidState(format!(
                    "Cannot confirm a {old_status} booking"
                )));
            }
        }

        let released = self
            .apply_transition(&booking, new_status, non_empty(notes))
            .await?;

        if old_status != new_status {
            metrics::record_booking_transition(new_status);
        }
        tracing::info!(from = %old_status, to = %new_status, released = released.is_some(), "Booking status updated");

        if let Some(ward_id) = released {
            self.record_allocation(release_log(
                &booking,
                ward_id,
                AllocationAction::Released,
                format!("hospital_{hospital_id}"),
                format!("Booking #{booking_id} {new_status}"),
            ))
            .await;
        }

        Ok(new_status)
    }

    /// Confirmed bookings of a hospital grouped by [`ward_group_key`], each
    /// group ordered by admission date, latest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_bookings_by_ward(
        &self,
        hospital_id: HospitalId,
    ) -> Result<BTreeMap<String, Vec<WardBookingView>>> {
        let filter = BookingFilter {
            status: Some(BookingStatus::Confirmed),
            ward_type: None,
        };
        let mut rows = self.store.list_hospital_bookings(hospital_id, &filter).await?;
        rows.sort_by(|a, b| {
            b.booking
                .preferred_date
                .cmp(&a.booking.preferred_date)
                .then(b.booking.id.cmp(&a.booking.id))
        });

        let mut grouped: BTreeMap<String, Vec<WardBookingView>> = BTreeMap::new();
        for row in rows {
            let key = ward_group_key(
                row.booking.ward_type,
                row.booking.ac_type,
                row.booking.room_config,
            );
            grouped.entry(key).or_default().push(row.into());
        }
        tracing::debug!(groups = grouped.len(), "Grouped confirmed bookings by ward");
        Ok(grouped)
    }

    /// A user's bookings, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    pub async fn list_user_bookings(&self, user_id: UserId) -> Result<Vec<BookingWithHospital>> {
        self.store.list_user_bookings(user_id).await
    }

    /// A hospital's bookings, newest first, optionally filtered.
    ///
    /// # Errors
    ///
    /// - Unknown `status` or `ward_type` filter → [`BedError::Validation`]
    /// - The store query fails
    pub async fn list_hospital_bookings(
        &self,
        hospital_id: HospitalId,
        status: Option<String>,
        ward_type: Option<String>,
    ) -> Result<Vec<BookingWithUser>> {
        let filter = BookingFilter {
            status: non_empty(status).map(|s| s.parse()).transpose()?,
            ward_type: non_empty(ward_type).map(|s| s.parse()).transpose()?,
        };
        self.store.list_hospital_bookings(hospital_id, &filter).await
    }

    async fn apply_transition(
        &self,
        booking: &Booking,
        to: BookingStatus,
        notes: Option<String>,
    ) -> Result<Option<WardId>> {
        let release = (booking.status == BookingStatus::Confirmed && to.releases_bed())
            .then(|| release_target(booking));

        let transition = BookingTransition {
            booking_id: booking.id,
            from: booking.status,
            to,
            notes,
            release,
        };

        match self.store.transition_booking(&transition).await? {
            TransitionOutcome::Applied { released } => {
                if released.is_some() {
                    metrics::record_bed_released();
                } else if release.is_some() {
                    tracing::warn!(booking_id = %booking.id, "No ward found to release the bed into");
                }
                Ok(released)
            }
            TransitionOutcome::Stale => Err(BedError::InvalidState(
                "Booking was modified by another request; reload and try again".to_string(),
            )),
        }
    }

    async fn record_allocation(&self, entry: NewAllocationLog) {
        if let Err(err) = self.store.append_log(&entry).await {
            tracing::warn!(
                error = %err,
                hospital_id = %entry.hospital_id,
                action = %entry.action,
                "Failed to append allocation log entry"
            );
        }
    }
}

fn release_target(booking: &Booking) -> ReleaseTarget {
    booking.ward_id.map_or_else(
        || {
            ReleaseTarget::Lookup(WardLookup::resolve(
                booking.hospital_id,
                booking.ward_type,
                booking.ac_type,
                booking.room_config,
            ))
        },
        ReleaseTarget::Ward,
    )
}

fn release_log(
    booking: &Booking,
    ward_id: WardId,
    action: AllocationAction,
    allocated_by: String,
    notes: String,
) -> NewAllocationLog {
    NewAllocationLog {
        hospital_id: booking.hospital_id,
        ward_id: Some(ward_id),
        room_id: None,
        allocation_type: booking.ward_type.allocation_type(),
        action,
        patient_name: Some(booking.patient_name.clone()),
        patient_contact: Some(booking.patient_phone.clone()),
        allocated_by: Some(allocated_by),
        notes: Some(notes),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            hospital_id: Some(1),
            ward_type: Some("general".into()),
            ac_type: Some("non_ac".into()),
            patient_name: Some("Ana".into()),
            patient_phone: Some("555-0100".into()),
            admission_date: Some("2025-03-01".into()),
            ..CreateBookingRequest::default()
        }
    }

    #[test]
    fn test_missing_fields_are_listed() {
        let err = CreateBookingRequest {
            hospital_id: Some(1),
            patient_name: Some("  ".into()),
            ..CreateBookingRequest::default()
        }
        .validate(UserId(1))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Missing required fields: ward_type, patient_name, patient_phone, admission_date"
        );
    }

    #[test]
    fn test_private_room_forces_not_applicable() {
        let booking = CreateBookingRequest {
            ward_type: Some("private_room".into()),
            ac_type: Some("ac".into()),
            room_config: Some("1_bed_with_bath".into()),
            ..request()
        }
        .validate(UserId(1))
        .unwrap();
        assert_eq!(booking.ac_type, AcType::NotApplicable);
        assert_eq!(booking.room_config, Some(RoomConfig::OneBedWithBath));
    }

    #[test]
    fn test_absent_ac_type_defaults_and_empty_strings_are_absent() {
        let booking = CreateBookingRequest {
            ac_type: Some(String::new()),
            patient_email: Some(String::new()),
            medical_condition: Some("Fracture".into()),
            ..request()
        }
        .validate(UserId(1))
        .unwrap();
        assert_eq!(booking.ac_type, AcType::NotApplicable);
        assert_eq!(booking.patient_email, None);
        assert_eq!(booking.admission_reason.as_deref(), Some("Fracture"));
    }

    #[test]
    fn test_lenient_json_form_values() {
        let req: CreateBookingRequest = serde_json::from_str(
            r#"{"hospital_id": "3", "ward_type": "icu", "patient_name": "Bo",
                "patient_phone": "1", "admission_date": "2025-05-02",
                "patient_age": "", "patient_gender": "Female"}"#,
        )
        .unwrap();
        let booking = req.validate(UserId(2)).unwrap();
        assert_eq!(booking.hospital_id, HospitalId(3));
        assert_eq!(booking.patient_age, None);
        assert_eq!(booking.patient_gender, Some(Gender::Female));
    }

    #[test]
    fn test_bad_values_are_validation_errors() {
        let err = CreateBookingRequest {
            ward_type: Some("suite".into()),
            ..request()
        }
        .validate(UserId(1))
        .unwrap_err();
        assert!(matches!(err, BedError::Validation(_)));

        let err = CreateBookingRequest {
            admission_date: Some("tomorrow".into()),
            ..request()
        }
        .validate(UserId(1))
        .unwrap_err();
        assert_eq!(err.to_string(), "Invalid admission_date: expected YYYY-MM-DD");
    }

    #[test]
    fn test_ward_group_keys() {
        assert_eq!(
            ward_group_key(WardType::PrivateRoom, AcType::NotApplicable, Some(RoomConfig::OneBedWithBath)),
            "private_1bed_with_bath"
        );
        assert_eq!(ward_group_key(WardType::General, AcType::NonAc, None), "general_non_ac");
        assert_eq!(ward_group_key(WardType::Icu, AcType::NotApplicable, None), "icu");
        assert_eq!(
            ward_group_key(WardType::PrivateRoom, AcType::NotApplicable, None),
            "private_room"
        );
    }
}
