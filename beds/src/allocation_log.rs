//! Allocation log requests.
//!
//! Entries are appended by the booking manager and by hospital staff
//! recording manual admissions and discharges.

use crate::error::{BedError, Result};
use crate::input::{self, non_empty};
use crate::providers::NewAllocationLog;
use crate::types::{AllocationAction, AllocationType, HospitalId, RoomId, WardId};
use serde::Deserialize;

/// Entries returned when no limit is given.
pub const DEFAULT_LOG_LIMIT: i64 = 50;

/// Largest page of entries returned.
pub const MAX_LOG_LIMIT: i64 = 500;

/// Clamp a requested page size to `1..=MAX_LOG_LIMIT`.
#[must_use]
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT)
}

/// Manual allocation log entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AllocationLogRequest {
    /// Hospital.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub hospital_id: Option<i64>,
    /// Ward the event refers to.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub ward_id: Option<i64>,
    /// Private room the event refers to.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub room_id: Option<i64>,
    /// `ward` or `private_room`.
    pub allocation_type: Option<String>,
    /// `allocated`, `released`, `reserved` or `cancelled`.
    pub action: Option<String>,
    /// Patient name.
    pub patient_name: Option<String>,
    /// Patient contact.
    pub patient_contact: Option<String>,
    /// Staff member or system actor.
    pub allocated_by: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

impl TryFrom<AllocationLogRequest> for NewAllocationLog {
    type Error = BedError;

    fn try_from(req: AllocationLogRequest) -> Result<Self> {
        let (Some(hospital_id), Some(allocation_type), Some(action)) = (
            req.hospital_id,
            non_empty(req.allocation_type),
            non_empty(req.action),
        ) else {
            return Err(BedError::Validation(
                "Hospital ID, allocation type, and action are required".to_string(),
            ));
        };

        Ok(Self {
            hospital_id: HospitalId(hospital_id),
            ward_id: req.ward_id.map(WardId),
            room_id: req.room_id.map(RoomId),
            allocation_type: allocation_type.parse::<AllocationType>()?,
            action: action.parse::<AllocationAction>()?,
            patient_name: non_empty(req.patient_name),
            patient_contact: non_empty(req.patient_contact),
            allocated_by: non_empty(req.allocated_by),
            notes: non_empty(req.notes),
        })
    }
}
