//! In-memory bed store.
//!
//! All tables sit behind one mutex, so every provider call is atomic the way
//! a database transaction would be.

use crate::error::{BedError, Result};
use crate::ledger::{BedCounts, WardCountsPatch, WardLookup, WardUpsert};
use crate::providers::{
    AllocationLogRepository, BookingFilter, BookingRepository, BookingTransition, Directory,
    NewAllocationLog, NewBooking, NewPrivateRoom, PrivateRoomRepository, ReleaseTarget,
    ReservedBooking, RoomPatch, TransitionOutcome, WardLedger,
};
use crate::types::{
    AcType, AllocationLogEntry, Booking, BookingId, BookingStatus, BookingWithHospital,
    BookingWithUser, HospitalId, LogId, PrivateRoom, RoomConfig, RoomId, RoomStatus, UserContact,
    UserId, Ward, WardId, WardType,
};
use chrono::Utc;
use pocketcare_web::ReadinessProbe;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct HospitalRecord {
    name: String,
    address: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    hospitals: BTreeMap<HospitalId, HospitalRecord>,
    users: BTreeMap<UserId, UserContact>,
    wards: BTreeMap<WardId, Ward>,
    rooms: BTreeMap<RoomId, PrivateRoom>,
    bookings: BTreeMap<BookingId, Booking>,
    logs: Vec<AllocationLogEntry>,
    next_id: i64,
    fail_log_appends: bool,
    drain_before_next_reserve: bool,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn ward_mut(&mut self, ward_id: WardId) -> Result<&mut Ward> {
        self.wards
            .get_mut(&ward_id)
            .ok_or_else(|| BedError::not_found("Ward", ward_id.get()))
    }

    fn room_number_taken(&self, hospital_id: HospitalId, room_number: &str, except: Option<RoomId>) -> bool {
        self.rooms.values().any(|room| {
            room.hospital_id == hospital_id
                && room.room_number == room_number
                && Some(room.id) != except
        })
    }
}

/// In-memory implementation of every bed provider trait.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBedStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryBedStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_tables<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| BedError::Store("in-memory store lock poisoned".to_string()))?;
        f(&mut tables)
    }

    // ========================================================================
    // Test setup helpers
    // ========================================================================

    /// Register a hospital.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn add_hospital(&self, hospital_id: HospitalId, name: &str) -> Result<()> {
        self.with_tables(|t| {
            t.hospitals.insert(
                hospital_id,
                HospitalRecord {
                    name: name.to_string(),
                    address: Some(format!("{name} Road")),
                    phone: None,
                },
            );
            Ok(())
        })
    }

    /// Register a user.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn add_user(&self, user_id: UserId, name: &str, email: &str) -> Result<()> {
        self.with_tables(|t| {
            t.users.insert(
                user_id,
                UserContact {
                    user_id,
                    name: name.to_string(),
                    email: email.to_string(),
                    phone: None,
                },
            );
            Ok(())
        })
    }

    /// Insert a ward row with the given counters, bypassing validation.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn seed_ward(
        &self,
        hospital_id: HospitalId,
        ward_type: WardType,
        ac_type: AcType,
        room_config: Option<RoomConfig>,
        counts: BedCounts,
    ) -> Result<WardId> {
        self.with_tables(|t| {
            let id = WardId(t.next_id());
            let now = Utc::now();
            t.wards.insert(
                id,
                Ward {
                    id,
                    hospital_id,
                    ward_type,
                    ac_type,
                    room_config,
                    counts,
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(id)
        })
    }

    /// Current state of a ward.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn ward(&self, ward_id: WardId) -> Result<Option<Ward>> {
        self.with_tables(|t| Ok(t.wards.get(&ward_id).cloned()))
    }

    /// Current state of a booking.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn booking(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        self.with_tables(|t| Ok(t.bookings.get(&booking_id).cloned()))
    }

    /// Number of stored bookings.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn booking_count(&self) -> Result<usize> {
        self.with_tables(|t| Ok(t.bookings.len()))
    }

    /// Overwrite a booking's status and ward reference, as found on rows
    /// written before bookings were confirmed on creation.
    ///
    /// # Errors
    ///
    /// Returns error if the booking does not exist or the lock is poisoned.
    pub fn set_legacy_booking(
        &self,
        booking_id: BookingId,
        status: BookingStatus,
        ward_id: Option<WardId>,
    ) -> Result<()> {
        self.with_tables(|t| {
            let booking = t
                .bookings
                .get_mut(&booking_id)
                .ok_or_else(|| BedError::not_found("Booking", booking_id.get()))?;
            booking.status = status;
            booking.ward_id = ward_id;
            Ok(())
        })
    }

    /// Make every allocation log append fail.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn fail_log_appends(&self, fail: bool) -> Result<()> {
        self.with_tables(|t| {
            t.fail_log_appends = fail;
            Ok(())
        })
    }

    /// Before the next reservation, move every available bed in the target
    /// ward to occupied, as a competing request would.
    ///
    /// # Errors
    ///
    /// Returns error if the store lock is poisoned.
    pub fn drain_before_next_reserve(&self) -> Result<()> {
        self.with_tables(|t| {
            t.drain_before_next_reserve = true;
            Ok(())
        })
    }
}

// ============================================================================
// Directory
// ============================================================================

impl Directory for InMemoryBedStore {
    async fn hospital_name(&self, hospital_id: HospitalId) -> Result<Option<String>> {
        self.with_tables(|t| Ok(t.hospitals.get(&hospital_id).map(|h| h.name.clone())))
    }

    async fn user_email(&self, user_id: UserId) -> Result<Option<String>> {
        self.with_tables(|t| Ok(t.users.get(&user_id).map(|u| u.email.clone())))
    }
}

// ============================================================================
// Wards
// ============================================================================

impl WardLedger for InMemoryBedStore {
    async fn list_wards(&self, hospital_id: HospitalId) -> Result<Vec<Ward>> {
        self.with_tables(|t| {
            let mut wards: Vec<Ward> = t
                .wards
                .values()
                .filter(|w| w.hospital_id == hospital_id)
                .cloned()
                .collect();
            wards.sort_by_key(|w| (w.ward_type.as_str(), w.ac_type.as_str(), w.room_config.map(RoomConfig::as_str)));
            Ok(wards)
        })
    }

    async fn find_ward(&self, lookup: &WardLookup) -> Result<Option<Ward>> {
        self.with_tables(|t| Ok(lookup.pick(t.wards.values()).cloned()))
    }

    async fn get_ward(&self, ward_id: WardId) -> Result<Option<Ward>> {
        self.with_tables(|t| Ok(t.wards.get(&ward_id).cloned()))
    }

    async fn upsert_ward(&self, upsert: &WardUpsert) -> Result<WardId> {
        self.with_tables(|t| {
            let now = Utc::now();
            if let Some(ward) = t.wards.values_mut().find(|w| upsert.targets(w)) {
                ward.counts = upsert.counts(ward.counts.reserved_beds)?;
                ward.updated_at = now;
                return Ok(ward.id);
            }

            let counts = upsert.counts(0)?;
            let id = WardId(t.next_id());
            t.wards.insert(
                id,
                Ward {
                    id,
                    hospital_id: upsert.hospital_id,
                    ward_type: upsert.ward_type,
                    ac_type: upsert.ac_type,
                    room_config: upsert.room_config,
                    counts,
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(id)
        })
    }

    async fn update_ward_counts(&self, ward_id: WardId, patch: &WardCountsPatch) -> Result<Ward> {
        self.with_tables(|t| {
            let ward = t.ward_mut(ward_id)?;
            ward.counts = patch.apply(ward.counts)?;
            ward.updated_at = Utc::now();
            Ok(ward.clone())
        })
    }

    async fn delete_ward(&self, ward_id: WardId) -> Result<()> {
        self.with_tables(|t| {
            if !t.wards.contains_key(&ward_id) {
                return Err(BedError::not_found("Ward", ward_id.get()));
            }
            let held = t.bookings.values().any(|booking| {
                booking.ward_id == Some(ward_id) && booking.status == BookingStatus::Confirmed
            });
            if held {
                return Err(BedError::ward_in_use());
            }
            t.wards.remove(&ward_id);
            for booking in t.bookings.values_mut() {
                if booking.ward_id == Some(ward_id) {
                    booking.ward_id = None;
                }
            }
            for entry in &mut t.logs {
                if entry.ward_id == Some(ward_id) {
                    entry.ward_id = None;
                }
            }
            Ok(())
        })
    }
}

// ============================================================================
// Bookings
// ============================================================================

impl BookingRepository for InMemoryBedStore {
    async fn create_confirmed_booking(
        &self,
        booking: &NewBooking,
        lookup: &WardLookup,
    ) -> Result<ReservedBooking> {
        self.with_tables(|t| {
            if std::mem::take(&mut t.drain_before_next_reserve) {
                if let Some(ward_id) = lookup.pick(t.wards.values()).map(|w| w.id) {
                    let ward = t.ward_mut(ward_id)?;
                    ward.counts.occupied_beds += ward.counts.available_beds;
                    ward.counts.available_beds = 0;
                }
            }

            let ward_id = t
                .wards
                .values()
                .filter(|w| w.counts.available_beds > 0)
                .filter(|w| lookup.matches(w))
                .min_by_key(|w| (std::cmp::Reverse(w.counts.available_beds), w.id))
                .map(|w| w.id)
                .ok_or(BedError::CapacityExhausted {
                    ward_type: booking.ward_type,
                })?;

            let now = Utc::now();
            let ward = t.ward_mut(ward_id)?;
            ward.counts.reserve_one(booking.ward_type)?;
            ward.updated_at = now;

            let booking_id = BookingId(t.next_id());
            t.bookings.insert(
                booking_id,
                Booking {
                    id: booking_id,
                    user_id: booking.user_id,
                    hospital_id: booking.hospital_id,
                    ward_id: Some(ward_id),
                    ward_type: booking.ward_type,
                    ac_type: booking.ac_type,
                    room_config: booking.room_config,
                    patient_name: booking.patient_name.clone(),
                    patient_age: booking.patient_age,
                    patient_gender: booking.patient_gender,
                    patient_phone: booking.patient_phone.clone(),
                    patient_email: booking.patient_email.clone(),
                    emergency_contact: booking.emergency_contact.clone(),
                    preferred_date: booking.preferred_date,
                    expected_discharge_date: booking.expected_discharge_date,
                    admission_reason: booking.admission_reason.clone(),
                    doctor_name: booking.doctor_name.clone(),
                    special_requirements: booking.special_requirements.clone(),
                    status: BookingStatus::Confirmed,
                    notes: booking.notes.clone(),
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(ReservedBooking {
                booking_id,
                ward_id,
            })
        })
    }

    async fn find_user_booking(&self, booking_id: BookingId, user_id: UserId) -> Result<Option<Booking>> {
        self.with_tables(|t| {
            Ok(t.bookings
                .get(&booking_id)
                .filter(|b| b.user_id == user_id)
                .cloned())
        })
    }

    async fn find_hospital_booking(
        &self,
        booking_id: BookingId,
        hospital_id: HospitalId,
    ) -> Result<Option<Booking>> {
        self.with_tables(|t| {
            Ok(t.bookings
                .get(&booking_id)
                .filter(|b| b.hospital_id == hospital_id)
                .cloned())
        })
    }

    async fn transition_booking(&self, transition: &BookingTransition) -> Result<TransitionOutcome> {
        self.with_tables(|t| {
            let Some(booking) = t.bookings.get_mut(&transition.booking_id) else {
                return Ok(TransitionOutcome::Stale);
            };
            if booking.status != transition.from {
                return Ok(TransitionOutcome::Stale);
            }
            let now = Utc::now();
            booking.status = transition.to;
            if let Some(notes) = &transition.notes {
                booking.notes = Some(notes.clone());
            }
            booking.updated_at = now;

            let target = match transition.release {
                None => None,
                Some(ReleaseTarget::Ward(ward_id)) => t.wards.contains_key(&ward_id).then_some(ward_id),
                Some(ReleaseTarget::Lookup(lookup)) => {
                    lookup.pick_for_release(t.wards.values()).map(|w| w.id)
                }
            };
            if let Some(ward_id) = target {
                let ward = t.ward_mut(ward_id)?;
                ward.counts.release_one();
                ward.updated_at = now;
            }
            Ok(TransitionOutcome::Applied { released: target })
        })
    }

    async fn list_user_bookings(&self, user_id: UserId) -> Result<Vec<BookingWithHospital>> {
        self.with_tables(|t| {
            let mut rows: Vec<BookingWithHospital> = t
                .bookings
                .values()
                .filter(|b| b.user_id == user_id)
                .filter_map(|b| {
                    t.hospitals.get(&b.hospital_id).map(|h| BookingWithHospital {
                        booking: b.clone(),
                        hospital_name: h.name.clone(),
                        hospital_address: h.address.clone(),
                        hospital_phone: h.phone.clone(),
                    })
                })
                .collect();
            rows.sort_by(|a, b| {
                (b.booking.created_at, b.booking.id).cmp(&(a.booking.created_at, a.booking.id))
            });
            Ok(rows)
        })
    }

    async fn list_hospital_bookings(
        &self,
        hospital_id: HospitalId,
        filter: &BookingFilter,
    ) -> Result<Vec<BookingWithUser>> {
        self.with_tables(|t| {
            let mut rows: Vec<BookingWithUser> = t
                .bookings
                .values()
                .filter(|b| b.hospital_id == hospital_id)
                .filter(|b| filter.status.is_none_or(|s| b.status == s))
                .filter(|b| filter.ward_type.is_none_or(|w| b.ward_type == w))
                .filter_map(|b| {
                    t.users.get(&b.user_id).map(|u| BookingWithUser {
                        booking: b.clone(),
                        user: u.clone(),
                    })
                })
                .collect();
            rows.sort_by(|a, b| {
                (b.booking.created_at, b.booking.id).cmp(&(a.booking.created_at, a.booking.id))
            });
            Ok(rows)
        })
    }
}

// ============================================================================
// Private rooms
// ============================================================================

impl PrivateRoomRepository for InMemoryBedStore {
    async fn list_rooms(&self, hospital_id: HospitalId, status: Option<RoomStatus>) -> Result<Vec<PrivateRoom>> {
        self.with_tables(|t| {
            let mut rooms: Vec<PrivateRoom> = t
                .rooms
                .values()
                .filter(|r| r.hospital_id == hospital_id)
                .filter(|r| status.is_none_or(|s| r.status == s))
                .cloned()
                .collect();
            rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
            Ok(rooms)
        })
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Option<PrivateRoom>> {
        self.with_tables(|t| Ok(t.rooms.get(&room_id).cloned()))
    }

    async fn create_room(&self, room: &NewPrivateRoom) -> Result<RoomId> {
        self.with_tables(|t| {
            if t.room_number_taken(room.hospital_id, &room.room_number, None) {
                return Err(BedError::Conflict(
                    "A room with this number already exists".to_string(),
                ));
            }
            let id = RoomId(t.next_id());
            let now = Utc::now();
            t.rooms.insert(
                id,
                PrivateRoom {
                    id,
                    hospital_id: room.hospital_id,
                    room_number: room.room_number.clone(),
                    bed_count: room.bed_count,
                    has_attached_bathroom: room.has_attached_bathroom,
                    ac_type: room.ac_type,
                    status: room.status,
                    daily_rate: room.daily_rate,
                    patient_name: None,
                    patient_contact: None,
                    admission_date: None,
                    expected_discharge_date: None,
                    notes: room.notes.clone(),
                    created_at: now,
                    updated_at: now,
                },
            );
            Ok(id)
        })
    }

    async fn update_room(&self, room_id: RoomId, patch: &RoomPatch) -> Result<()> {
        self.with_tables(|t| {
            let hospital_id = t
                .rooms
                .get(&room_id)
                .map(|r| r.hospital_id)
                .ok_or_else(|| BedError::not_found("Room", room_id.get()))?;
            if let Some(number) = &patch.room_number {
                if t.room_number_taken(hospital_id, number, Some(room_id)) {
                    return Err(BedError::Conflict(
                        "A room with this number already exists".to_string(),
                    ));
                }
            }

            let room = t
                .rooms
                .get_mut(&room_id)
                .ok_or_else(|| BedError::not_found("Room", room_id.get()))?;
            let patch = patch.clone();
            if let Some(number) = patch.room_number {
                room.room_number = number;
            }
            if let Some(bed_count) = patch.bed_count {
                room.bed_count = bed_count;
            }
            if let Some(bathroom) = patch.has_attached_bathroom {
                room.has_attached_bathroom = bathroom;
            }
            if let Some(ac_type) = patch.ac_type {
                room.ac_type = ac_type;
            }
            if let Some(status) = patch.status {
                room.status = status;
            }
            if let Some(rate) = patch.daily_rate {
                room.daily_rate = rate;
            }
            patch.patient_name.apply_to(&mut room.patient_name);
            patch.patient_contact.apply_to(&mut room.patient_contact);
            patch.admission_date.apply_to(&mut room.admission_date);
            patch
                .expected_discharge_date
                .apply_to(&mut room.expected_discharge_date);
            patch.notes.apply_to(&mut room.notes);
            room.updated_at = Utc::now();
            Ok(())
        })
    }

    async fn delete_room(&self, room_id: RoomId) -> Result<()> {
        self.with_tables(|t| {
            t.rooms
                .remove(&room_id)
                .map(|_| ())
                .ok_or_else(|| BedError::not_found("Room", room_id.get()))
        })
    }
}

// ============================================================================
// Allocation log
// ============================================================================

impl AllocationLogRepository for InMemoryBedStore {
    async fn append_log(&self, entry: &NewAllocationLog) -> Result<LogId> {
        self.with_tables(|t| {
            if t.fail_log_appends {
                return Err(BedError::Store("allocation log unavailable".to_string()));
            }
            let id = LogId(t.next_id());
            t.logs.push(AllocationLogEntry {
                id,
                hospital_id: entry.hospital_id,
                ward_id: entry.ward_id,
                room_id: entry.room_id,
                allocation_type: entry.allocation_type,
                action: entry.action,
                patient_name: entry.patient_name.clone(),
                patient_contact: entry.patient_contact.clone(),
                allocated_by: entry.allocated_by.clone(),
                notes: entry.notes.clone(),
                created_at: Utc::now(),
            });
            Ok(id)
        })
    }

    async fn list_logs(&self, hospital_id: HospitalId, limit: i64) -> Result<Vec<AllocationLogEntry>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        self.with_tables(|t| {
            Ok(t.logs
                .iter()
                .rev()
                .filter(|e| e.hospital_id == hospital_id)
                .take(limit)
                .cloned()
                .collect())
        })
    }
}

impl ReadinessProbe for InMemoryBedStore {
    fn component(&self) -> &'static str {
        "bed_store"
    }

    async fn probe(&self) -> std::result::Result<(), String> {
        self.with_tables(|_| Ok(())).map_err(|e| e.to_string())
    }
}
