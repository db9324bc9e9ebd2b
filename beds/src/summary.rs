//! Bed summary for a hospital's dashboard.

use crate::types::{AcType, PrivateRoom, RoomStatus, Ward, WardType};
use serde::Serialize;
use std::collections::BTreeMap;

/// Bed counts summed over wards sharing a ward type and AC variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WardStatistics {
    /// Ward category.
    pub ward_type: WardType,
    /// AC variant.
    pub ac_type: AcType,
    /// Sum of total beds.
    pub total_beds: i64,
    /// Sum of available beds.
    pub available_beds: i64,
    /// Sum of occupied beds.
    pub occupied_beds: i64,
    /// Sum of reserved beds.
    pub reserved_beds: i64,
}

/// Number of private rooms sharing a layout and status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomStatistics {
    /// Beds per room.
    pub bed_count: i16,
    /// AC variant.
    pub ac_type: AcType,
    /// Attached bathroom.
    pub has_attached_bathroom: bool,
    /// Occupancy status.
    pub status: RoomStatus,
    /// Rooms in this group.
    pub count: i64,
}

/// Ward bed totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TotalStatistics {
    /// Beds across all wards.
    pub total_ward_beds: i64,
    /// Available beds across all wards.
    pub available_ward_beds: i64,
}

/// Dashboard summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BedSummary {
    /// Per ward type and AC variant.
    pub ward_statistics: Vec<WardStatistics>,
    /// Per room layout and status.
    pub room_statistics: Vec<RoomStatistics>,
    /// Totals.
    pub total_statistics: TotalStatistics,
}

/// Summarise a hospital's wards and rooms. Groups are sorted by key.
#[must_use]
pub fn summarize(wards: &[Ward], rooms: &[PrivateRoom]) -> BedSummary {
    let mut ward_groups: BTreeMap<(WardType, AcType), WardStatistics> = BTreeMap::new();
    for ward in wards {
        let entry = ward_groups
            .entry((ward.ward_type, ward.ac_type))
            .or_insert_with(|| WardStatistics {
                ward_type: ward.ward_type,
                ac_type: ward.ac_type,
                total_beds: 0,
                available_beds: 0,
                occupied_beds: 0,
                reserved_beds: 0,
            });
        entry.total_beds += i64::from(ward.counts.total_beds);
        entry.available_beds += i64::from(ward.counts.available_beds);
        entry.occupied_beds += i64::from(ward.counts.occupied_beds);
        entry.reserved_beds += i64::from(ward.counts.reserved_beds);
    }

    let mut room_groups: BTreeMap<(i16, AcType, bool, RoomStatus), i64> = BTreeMap::new();
    for room in rooms {
        *room_groups
            .entry((room.bed_count, room.ac_type, room.has_attached_bathroom, room.status))
            .or_default() += 1;
    }

    let ward_statistics: Vec<WardStatistics> = ward_groups.into_values().collect();
    let total_statistics = TotalStatistics {
        total_ward_beds: ward_statistics.iter().map(|s| s.total_beds).sum(),
        available_ward_beds: ward_statistics.iter().map(|s| s.available_beds).sum(),
    };

    BedSummary {
        ward_statistics,
        room_statistics: room_groups
            .into_iter()
            .map(
                |((bed_count, ac_type, has_attached_bathroom, status), count)| RoomStatistics {
                    bed_count,
                    ac_type,
                    has_attached_bathroom,
                    status,
                    count,
                },
            )
            .collect(),
        total_statistics,
    }
}
