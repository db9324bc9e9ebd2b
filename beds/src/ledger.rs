//! Capacity ledger: ward bed counters and the rules that move them.
//!
//! A ward's beds are always in exactly one of three states:
//!
//! ```text
//! total_beds == available_beds + occupied_beds + reserved_beds
//! ```
//!
//! Bookings move one bed between `available` and `reserved`
//! ([`BedCounts::reserve_one`], [`BedCounts::release_one`]). Hospital staff
//! edit `total`, `available` and `occupied` through [`WardUpsert`] and
//! [`WardCountsPatch`]; `reserved` belongs to bookings and is never written by
//! those edits.

use crate::error::{BedError, Result};
use crate::input::{self, non_empty};
use crate::types::{AcType, HospitalId, RoomConfig, Ward, WardType};
use serde::{Deserialize, Serialize};

/// Bed counters of one ward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BedCounts {
    /// Beds in the ward.
    pub total_beds: i32,
    /// Beds free for booking.
    pub available_beds: i32,
    /// Beds with an admitted patient.
    pub occupied_beds: i32,
    /// Beds held by confirmed bookings.
    pub reserved_beds: i32,
}

impl BedCounts {
    /// Whether every counter is non-negative and they add up to the total.
    #[must_use]
    pub const fn is_balanced(&self) -> bool {
        if self.total_beds < 0
            || self.available_beds < 0
            || self.occupied_beds < 0
            || self.reserved_beds < 0
        {
            return false;
        }
        match self.available_beds.checked_add(self.occupied_beds) {
            Some(sum) => match sum.checked_add(self.reserved_beds) {
                Some(sum) => sum == self.total_beds,
                None => false,
            },
            None => false,
        }
    }

    /// Move one bed from available to reserved.
    ///
    /// # Errors
    ///
    /// Returns [`BedError::CapacityExhausted`] when no bed is available.
    pub fn reserve_one(&mut self, ward_type: WardType) -> Result<()> {
        if self.available_beds <= 0 {
            return Err(BedError::CapacityExhausted { ward_type });
        }
        self.available_beds -= 1;
        self.reserved_beds += 1;
        Ok(())
    }

    /// Return one reserved bed to the available pool. `reserved` never drops
    /// below zero.
    pub fn release_one(&mut self) {
        self.available_beds = self.available_beds.saturating_add(1);
        self.reserved_beds = (self.reserved_beds - 1).max(0);
    }

    fn check(self) -> Result<Self> {
        if self.total_beds < 0
            || self.available_beds < 0
            || self.occupied_beds < 0
            || self.reserved_beds < 0
        {
            return Err(negative_counts());
        }
        if !self.is_balanced() {
            return Err(BedError::Validation(format!(
                "Bed counts do not add up: total {} != available {} + occupied {} + reserved {}",
                self.total_beds, self.available_beds, self.occupied_beds, self.reserved_beds
            )));
        }
        Ok(self)
    }
}

fn negative_counts() -> BedError {
    BedError::Validation("Bed counts cannot be negative".to_string())
}

fn out_of_range() -> BedError {
    BedError::Validation("Bed counts are out of range".to_string())
}

/// Reject any negative counter before it takes part in arithmetic.
fn ensure_non_negative(values: &[Option<i32>]) -> Result<()> {
    if values.iter().flatten().any(|&n| n < 0) {
        return Err(negative_counts());
    }
    Ok(())
}

/// `total - occupied - reserved`.
fn remaining(total: i32, occupied: i32, reserved: i32) -> Result<i32> {
    total
        .checked_sub(occupied)
        .and_then(|n| n.checked_sub(reserved))
        .ok_or_else(out_of_range)
}

// ============================================================================
// Ward lookup
// ============================================================================

/// How a booking request is matched to a ward row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WardSelector {
    /// Private room pool with a specific configuration.
    RoomConfig(RoomConfig),
    /// Any AC variant (ICU, emergency).
    AnyAcType,
    /// Exact AC variant.
    AcType(AcType),
}

/// Resolved key of the ward a booking draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WardLookup {
    /// Hospital.
    pub hospital_id: HospitalId,
    /// Ward category.
    pub ward_type: WardType,
    /// Remaining match rule.
    pub selector: WardSelector,
}

impl WardLookup {
    /// Apply the lookup rules:
    ///
    /// - `private_room` with a room configuration: keyed by configuration
    /// - `icu` / `emergency`: AC variant ignored
    /// - otherwise keyed by AC variant
    #[must_use]
    pub const fn resolve(
        hospital_id: HospitalId,
        ward_type: WardType,
        ac_type: AcType,
        room_config: Option<RoomConfig>,
    ) -> Self {
        let selector = match (ward_type, room_config) {
            (WardType::PrivateRoom, Some(config)) => WardSelector::RoomConfig(config),
            (WardType::Icu | WardType::Emergency, _) => WardSelector::AnyAcType,
            _ => WardSelector::AcType(ac_type),
        };
        Self {
            hospital_id,
            ward_type,
            selector,
        }
    }

    /// Whether `ward` is a candidate for this lookup.
    #[must_use]
    pub fn matches(&self, ward: &Ward) -> bool {
        if ward.hospital_id != self.hospital_id || ward.ward_type != self.ward_type {
            return false;
        }
        match self.selector {
            WardSelector::RoomConfig(config) => ward.room_config == Some(config),
            WardSelector::AnyAcType => true,
            WardSelector::AcType(ac_type) => ward.ac_type == ac_type,
        }
    }

    /// Pick the ward to reserve from: most available beds, then lowest id.
    pub fn pick<'a, I>(&self, wards: I) -> Option<&'a Ward>
    where
        I: IntoIterator<Item = &'a Ward>,
    {
        wards
            .into_iter()
            .filter(|ward| self.matches(ward))
            .min_by_key(|ward| (std::cmp::Reverse(ward.counts.available_beds), ward.id))
    }

    /// Pick the ward to release into when a booking carries no ward
    /// reference: most reserved beds, then lowest id.
    pub fn pick_for_release<'a, I>(&self, wards: I) -> Option<&'a Ward>
    where
        I: IntoIterator<Item = &'a Ward>,
    {
        wards
            .into_iter()
            .filter(|ward| self.matches(ward))
            .min_by_key(|ward| (std::cmp::Reverse(ward.counts.reserved_beds), ward.id))
    }
}

// ============================================================================
// Ward CRUD inputs
// ============================================================================

/// Ward create-or-update request as sent by hospital staff.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WardUpsertRequest {
    /// Hospital.
    #[serde(default, deserialize_with = "input::lenient_i64")]
    pub hospital_id: Option<i64>,
    /// Ward category.
    pub ward_type: Option<String>,
    /// AC variant, default `not_applicable`.
    pub ac_type: Option<String>,
    /// Private room configuration.
    pub room_config: Option<String>,
    /// Beds in the ward, default 0.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub total_beds: Option<i32>,
    /// Free beds. Derived when absent.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub available_beds: Option<i32>,
    /// Occupied beds, default 0.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub occupied_beds: Option<i32>,
    /// Older clients send occupied beds under this name. Added to
    /// `occupied_beds`; it never touches booking-held reservations.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub reserved_beds: Option<i32>,
}

/// Validated ward upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardUpsert {
    /// Hospital.
    pub hospital_id: HospitalId,
    /// Ward category.
    pub ward_type: WardType,
    /// AC variant (`not_applicable` for private room pools).
    pub ac_type: AcType,
    /// Room configuration (private room pools only).
    pub room_config: Option<RoomConfig>,
    /// Beds in the ward.
    pub total_beds: i32,
    /// Free beds, when given explicitly.
    pub available_beds: Option<i32>,
    /// Occupied beds, including the legacy alias.
    pub occupied_beds: i32,
}

impl TryFrom<WardUpsertRequest> for WardUpsert {
    type Error = BedError;

    fn try_from(req: WardUpsertRequest) -> Result<Self> {
        let (Some(hospital_id), Some(ward_type)) = (req.hospital_id, non_empty(req.ward_type))
        else {
            return Err(BedError::Validation(
                "Hospital ID and ward type are required".to_string(),
            ));
        };
        let ward_type: WardType = ward_type.parse()?;
        ensure_non_negative(&[
            req.total_beds,
            req.available_beds,
            req.occupied_beds,
            req.reserved_beds,
        ])?;
        let occupied_beds = req
            .occupied_beds
            .unwrap_or(0)
            .checked_add(req.reserved_beds.unwrap_or(0))
            .ok_or_else(out_of_range)?;
        let mut ac_type = non_empty(req.ac_type)
            .map(|s| s.parse::<AcType>())
            .transpose()?
            .unwrap_or_default();
        let mut room_config = non_empty(req.room_config)
            .map(|s| s.parse::<RoomConfig>())
            .transpose()?;

        if ward_type == WardType::PrivateRoom {
            ac_type = AcType::NotApplicable;
        } else {
            room_config = None;
        }

        Ok(Self {
            hospital_id: HospitalId(hospital_id),
            ward_type,
            ac_type,
            room_config,
            total_beds: req.total_beds.unwrap_or(0),
            available_beds: req.available_beds,
            occupied_beds,
        })
    }
}

impl WardUpsert {
    /// Counters the ward row will hold, given the booking-held reservations
    /// already on it (0 for a new row).
    ///
    /// # Errors
    ///
    /// Returns [`BedError::Validation`] when the counters are negative or do
    /// not add up.
    pub fn counts(&self, reserved_beds: i32) -> Result<BedCounts> {
        let available_beds = match self.available_beds {
            Some(available) => available,
            None => remaining(self.total_beds, self.occupied_beds, reserved_beds)?,
        };
        BedCounts {
            total_beds: self.total_beds,
            available_beds,
            occupied_beds: self.occupied_beds,
            reserved_beds,
        }
        .check()
    }

    /// Whether `ward` is the row this upsert targets.
    #[must_use]
    pub fn targets(&self, ward: &Ward) -> bool {
        ward.hospital_id == self.hospital_id
            && ward.ward_type == self.ward_type
            && ward.ac_type == self.ac_type
            && ward.room_config == self.room_config
    }
}

/// Partial ward counter update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct WardCountsPatch {
    /// New total.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub total_beds: Option<i32>,
    /// New available count. Derived from the others when absent.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub available_beds: Option<i32>,
    /// New occupied count.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub occupied_beds: Option<i32>,
    /// Legacy name for `occupied_beds`, used only when that is absent.
    #[serde(default, deserialize_with = "input::lenient_i32")]
    pub reserved_beds: Option<i32>,
}

impl WardCountsPatch {
    /// Apply the patch to the current counters.
    ///
    /// # Errors
    ///
    /// Returns [`BedError::Validation`] for an empty patch or when the result
    /// is negative or does not add up.
    pub fn apply(&self, current: BedCounts) -> Result<BedCounts> {
        let occupied = self.occupied_beds.or(self.reserved_beds);
        if self.total_beds.is_none() && self.available_beds.is_none() && occupied.is_none() {
            return Err(BedError::Validation("No fields to update".to_string()));
        }
        ensure_non_negative(&[
            self.total_beds,
            self.available_beds,
            self.occupied_beds,
            self.reserved_beds,
        ])?;

        let total_beds = self.total_beds.unwrap_or(current.total_beds);
        let occupied_beds = occupied.unwrap_or(current.occupied_beds);
        let available_beds = match self.available_beds {
            Some(available) => available,
            None if self.total_beds.is_some() || occupied.is_some() => {
                remaining(total_beds, occupied_beds, current.reserved_beds)?
            }
            None => current.available_beds,
        };

        BedCounts {
            total_beds,
            available_beds,
            occupied_beds,
            reserved_beds: current.reserved_beds,
        }
        .check()
    }
}
