//! Storage providers.
//!
//! The booking manager and HTTP handlers depend on these traits, never on a
//! database directly. `stores::postgres` implements them over `sqlx`;
//! `mocks` implements them in memory for tests.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────────────┐
//! │ API handlers     │────▶│ BookingManager       │
//! └────────┬─────────┘     └──────────┬───────────┘
//!          │                          │
//!          ▼                          ▼
//! ┌─────────────────────────────────────────────────┐
//! │ BedStore = Directory + WardLedger               │
//! │          + BookingRepository                    │
//! │          + PrivateRoomRepository                │
//! │          + AllocationLogRepository              │
//! └─────────────────────────────────────────────────┘
//!          │                          │
//!          ▼                          ▼
//!   PostgresBedStore            InMemoryBedStore
//! ```
//!
//! Operations that must move a ward counter and a booking row together
//! (`create_confirmed_booking`, `transition_booking`) are single
//! repository calls so each implementation can make them atomic.

use crate::ledger::WardLookup;
use crate::types::{
    AcType, AllocationAction, AllocationType, BookingId, BookingStatus, Gender, HospitalId,
    RoomConfig, RoomId, RoomStatus, UserId, WardId, WardType,
};
use chrono::NaiveDate;
use pocketcare_web::ReadinessProbe;

pub mod allocation_log;
pub mod booking;
pub mod directory;
pub mod room;
pub mod ward;

pub use allocation_log::AllocationLogRepository;
pub use booking::BookingRepository;
pub use directory::Directory;
pub use room::PrivateRoomRepository;
pub use ward::WardLedger;

/// Everything the bed service needs from storage.
pub trait BedStore:
    Directory
    + WardLedger
    + BookingRepository
    + PrivateRoomRepository
    + AllocationLogRepository
    + ReadinessProbe
{
}

impl<T> BedStore for T where
    T: Directory
        + WardLedger
        + BookingRepository
        + PrivateRoomRepository
        + AllocationLogRepository
        + ReadinessProbe
{
}

// ============================================================================
// Booking models
// ============================================================================

/// Validated booking, ready to be stored as `confirmed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    /// Booking user.
    pub user_id: UserId,
    /// Hospital.
    pub hospital_id: HospitalId,
    /// Ward category.
    pub ward_type: WardType,
    /// AC variant.
    pub ac_type: AcType,
    /// Private room configuration.
    pub room_config: Option<RoomConfig>,
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
    pub preferred_date: NaiveDate,
    /// Expected discharge date.
    pub expected_discharge_date: Option<NaiveDate>,
    /// Reason for admission.
    pub admission_reason: Option<String>,
    /// Referring doctor.
    pub doctor_name: Option<String>,
    /// Special requirements.
    pub special_requirements: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

/// A stored booking and the ward whose bed it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservedBooking {
    /// New booking.
    pub booking_id: BookingId,
    /// Ward that was decremented.
    pub ward_id: WardId,
}

/// Ward that receives a released bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTarget {
    /// The ward recorded on the booking.
    Ward(WardId),
    /// Legacy bookings without a ward reference: resolve by lookup.
    Lookup(WardLookup),
}

/// Compare-and-swap status change, optionally releasing one bed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingTransition {
    /// Booking to change.
    pub booking_id: BookingId,
    /// Status the caller observed. The change applies only if it still holds.
    pub from: BookingStatus,
    /// New status.
    pub to: BookingStatus,
    /// Replacement notes. `None` keeps the stored notes.
    pub notes: Option<String>,
    /// Ward to release one bed into, in the same transaction.
    pub release: Option<ReleaseTarget>,
}

/// Result of [`BookingRepository::transition_booking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// Status changed. `released` names the ward that got a bed back.
    Applied {
        /// Ward credited with the released bed.
        released: Option<WardId>,
    },
    /// The stored status no longer matched `from`; nothing changed.
    Stale,
}

/// Filters for hospital booking listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Only this status.
    pub status: Option<BookingStatus>,
    /// Only this ward category.
    pub ward_type: Option<WardType>,
}

// ============================================================================
// Private room models
// ============================================================================

/// Validated private room creation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrivateRoom {
    /// Hospital.
    pub hospital_id: HospitalId,
    /// Room number.
    pub room_number: String,
    /// 1 or 2.
    pub bed_count: i16,
    /// Attached bathroom.
    pub has_attached_bathroom: bool,
    /// `ac` or `non_ac`.
    pub ac_type: AcType,
    /// Initial status.
    pub status: RoomStatus,
    /// Daily rate.
    pub daily_rate: f64,
    /// Notes.
    pub notes: Option<String>,
}

/// Field update: leave alone, clear, or set.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldUpdate<T> {
    /// Not part of the update.
    #[default]
    Keep,
    /// Set to NULL.
    Clear,
    /// Set to a value.
    Set(T),
}

impl<T> FieldUpdate<T> {
    /// Whether the field is part of the update.
    #[must_use]
    pub const fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    /// Apply the update to an optional stored value.
    pub fn apply_to(self, current: &mut Option<T>) {
        match self {
            Self::Keep => {}
            Self::Clear => *current = None,
            Self::Set(value) => *current = Some(value),
        }
    }
}

/// Validated private room update. Non-nullable fields use `Option`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoomPatch {
    /// New room number.
    pub room_number: Option<String>,
    /// New bed count.
    pub bed_count: Option<i16>,
    /// New bathroom flag.
    pub has_attached_bathroom: Option<bool>,
    /// New AC variant.
    pub ac_type: Option<AcType>,
    /// New status.
    pub status: Option<RoomStatus>,
    /// New daily rate.
    pub daily_rate: Option<f64>,
    /// Current patient name.
    pub patient_name: FieldUpdate<String>,
    /// Current patient contact.
    pub patient_contact: FieldUpdate<String>,
    /// Admission date.
    pub admission_date: FieldUpdate<NaiveDate>,
    /// Expected discharge date.
    pub expected_discharge_date: FieldUpdate<NaiveDate>,
    /// Notes.
    pub notes: FieldUpdate<String>,
}

impl RoomPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.room_number.is_none()
            && self.bed_count.is_none()
            && self.has_attached_bathroom.is_none()
            && self.ac_type.is_none()
            && self.status.is_none()
            && self.daily_rate.is_none()
            && self.patient_name.is_keep()
            && self.patient_contact.is_keep()
            && self.admission_date.is_keep()
            && self.expected_discharge_date.is_keep()
            && self.notes.is_keep()
    }
}

// ============================================================================
// Allocation log models
// ============================================================================

/// Allocation log entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAllocationLog {
    /// Hospital.
    pub hospital_id: HospitalId,
    /// Ward.
    pub ward_id: Option<WardId>,
    /// Private room.
    pub room_id: Option<RoomId>,
    /// Capacity pool.
    pub allocation_type: AllocationType,
    /// What happened.
    pub action: AllocationAction,
    /// Patient name.
    pub patient_name: Option<String>,
    /// Patient contact.
    pub patient_contact: Option<String>,
    /// Who performed the action.
    pub allocated_by: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}
