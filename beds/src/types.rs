//! Domain types for bed inventory and bookings.
//!
//! Identifiers are integer newtypes matching the relational keys. Categorical
//! columns are closed enums; their string forms are the values stored in the
//! database and exchanged over HTTP.

use crate::ledger::BedCounts;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the raw database key.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Hospital primary key.
    HospitalId
);
id_type!(
    /// Registered user primary key.
    UserId
);
id_type!(
    /// Ward (capacity pool) primary key.
    WardId
);
id_type!(
    /// Private room primary key.
    RoomId
);
id_type!(
    /// Bed booking primary key.
    BookingId
);
id_type!(
    /// Allocation log entry primary key.
    LogId
);

// ============================================================================
// Enumerations
// ============================================================================

/// Failure to parse one of the closed enumerations from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind}: {value}")]
pub struct ParseEnumError {
    /// Field being parsed (`ward_type`, `status`, ...).
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Stored string form.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(
    /// Ward category.
    WardType, "ward_type" {
        /// General ward.
        General => "general",
        /// Maternity ward.
        Maternity => "maternity",
        /// Pediatrics ward.
        Pediatrics => "pediatrics",
        /// Intensive care.
        Icu => "icu",
        /// Emergency ward.
        Emergency => "emergency",
        /// Private room pool, keyed by room configuration.
        PrivateRoom => "private_room",
    }
);

impl WardType {
    /// ICU and emergency capacity is not split by AC variant.
    #[must_use]
    pub const fn ignores_ac_type(self) -> bool {
        matches!(self, Self::Icu | Self::Emergency)
    }

    /// Allocation log category for capacity in this ward type.
    #[must_use]
    pub const fn allocation_type(self) -> AllocationType {
        match self {
            Self::PrivateRoom => AllocationType::PrivateRoom,
            _ => AllocationType::Ward,
        }
    }
}

string_enum!(
    /// Air-conditioning variant.
    AcType, "ac_type" {
        /// Air-conditioned.
        Ac => "ac",
        /// Not air-conditioned.
        NonAc => "non_ac",
        /// No AC distinction (private-room pools, ICU, emergency).
        NotApplicable => "not_applicable",
    }
);

impl Default for AcType {
    fn default() -> Self {
        Self::NotApplicable
    }
}

string_enum!(
    /// Private room configuration.
    RoomConfig, "room_config" {
        /// Single bed, shared bathroom.
        OneBedNoBath => "1_bed_no_bath",
        /// Single bed, attached bathroom.
        OneBedWithBath => "1_bed_with_bath",
        /// Two beds, attached bathroom.
        TwoBedWithBath => "2_bed_with_bath",
    }
);

impl RoomConfig {
    /// Key used by the hospital bed management view.
    #[must_use]
    pub const fn ward_key(self) -> &'static str {
        match self {
            Self::OneBedNoBath => "private_1bed_no_bath",
            Self::OneBedWithBath => "private_1bed_with_bath",
            Self::TwoBedWithBath => "private_2bed_with_bath",
        }
    }
}

string_enum!(
    /// Booking lifecycle status.
    BookingStatus, "status" {
        /// Legacy rows only; new bookings start confirmed.
        Pending => "pending",
        /// Bed reserved.
        Confirmed => "confirmed",
        /// Rejected by the hospital.
        Rejected => "rejected",
        /// Cancelled by the user or the hospital.
        Cancelled => "cancelled",
        /// Patient discharged.
        Completed => "completed",
    }
);

impl BookingStatus {
    /// Statuses a booking can never leave.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Statuses a hospital may set.
    #[must_use]
    pub const fn is_hospital_settable(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Whether moving a confirmed booking to this status frees its bed.
    #[must_use]
    pub const fn releases_bed(self) -> bool {
        matches!(self, Self::Cancelled | Self::Rejected | Self::Completed)
    }
}

string_enum!(
    /// Private room occupancy status.
    RoomStatus, "status" {
        /// Free.
        Available => "available",
        /// Patient admitted.
        Occupied => "occupied",
        /// Held for an incoming patient.
        Reserved => "reserved",
        /// Out of service.
        Maintenance => "maintenance",
    }
);

impl Default for RoomStatus {
    fn default() -> Self {
        Self::Available
    }
}

string_enum!(
    /// Patient gender.
    Gender, "patient_gender" {
        /// Male.
        Male => "male",
        /// Female.
        Female => "female",
        /// Other.
        Other => "other",
    }
);

string_enum!(
    /// Capacity pool an allocation log entry refers to.
    AllocationType, "allocation_type" {
        /// Ward bed.
        Ward => "ward",
        /// Private room.
        PrivateRoom => "private_room",
    }
);

string_enum!(
    /// Capacity-changing action recorded in the allocation log.
    AllocationAction, "action" {
        /// Bed handed to an admitted patient.
        Allocated => "allocated",
        /// Bed returned to the available pool.
        Released => "released",
        /// Bed held by a booking.
        Reserved => "reserved",
        /// Booking cancelled by the user.
        Cancelled => "cancelled",
    }
);

// ============================================================================
// Entities
// ============================================================================

/// Ward capacity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ward {
    /// Ward ID.
    pub id: WardId,
    /// Owning hospital.
    pub hospital_id: HospitalId,
    /// Ward category.
    pub ward_type: WardType,
    /// AC variant.
    pub ac_type: AcType,
    /// Room configuration (private room pools only).
    pub room_config: Option<RoomConfig>,
    /// Bed counters.
    #[serde(flatten)]
    pub counts: BedCounts,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Private room inventory row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrivateRoom {
    /// Room ID.
    pub id: RoomId,
    /// Owning hospital.
    pub hospital_id: HospitalId,
    /// Room number, unique per hospital.
    pub room_number: String,
    /// Beds in the room (1 or 2).
    pub bed_count: i16,
    /// Whether the room has its own bathroom.
    pub has_attached_bathroom: bool,
    /// AC variant (`ac` or `non_ac`).
    pub ac_type: AcType,
    /// Occupancy status.
    pub status: RoomStatus,
    /// Daily rate.
    pub daily_rate: f64,
    /// Current patient name.
    pub patient_name: Option<String>,
    /// Current patient contact.
    pub patient_contact: Option<String>,
    /// Current patient admission date.
    pub admission_date: Option<NaiveDate>,
    /// Current patient expected discharge date.
    pub expected_discharge_date: Option<NaiveDate>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// User bed booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Booking {
    /// Booking ID.
    pub id: BookingId,
    /// Booking user.
    pub user_id: UserId,
    /// Hospital.
    pub hospital_id: HospitalId,
    /// Ward row whose bed was reserved. `None` on legacy rows.
    pub ward_id: Option<WardId>,
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
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Notes (user- or hospital-provided).
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Booking joined with its hospital's contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingWithHospital {
    /// The booking.
    pub booking: Booking,
    /// Hospital name.
    pub hospital_name: String,
    /// Hospital address.
    pub hospital_address: Option<String>,
    /// Hospital phone.
    pub hospital_phone: Option<String>,
}

/// Registered user contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContact {
    /// User ID.
    pub user_id: UserId,
    /// Name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Phone.
    pub phone: Option<String>,
}

/// Booking joined with the booking user's contact details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingWithUser {
    /// The booking.
    pub booking: Booking,
    /// The booking user.
    pub user: UserContact,
}

/// Allocation log entry. Write-once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationLogEntry {
    /// Entry ID.
    pub id: LogId,
    /// Hospital.
    pub hospital_id: HospitalId,
    /// Ward the event refers to.
    pub ward_id: Option<WardId>,
    /// Private room the event refers to.
    pub room_id: Option<RoomId>,
    /// Capacity pool.
    pub allocation_type: AllocationType,
    /// What happened.
    pub action: AllocationAction,
    /// Patient name.
    pub patient_name: Option<String>,
    /// Patient contact.
    pub patient_contact: Option<String>,
    /// Who performed the action (`user_7`, `hospital_3`, staff name).
    pub allocated_by: Option<String>,
    /// Notes.
    pub notes: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}
