//! Ward capacity repository trait.

use crate::error::Result;
use crate::ledger::{WardCountsPatch, WardLookup, WardUpsert};
use crate::types::{HospitalId, Ward, WardId};
use std::future::Future;

/// Ward capacity rows.
///
/// Bed reservations and releases are not exposed here: they are always
/// paired with a booking write and live on
/// [`BookingRepository`](super::BookingRepository).
pub trait WardLedger: Send + Sync {
    /// All wards of a hospital, ordered by ward type, AC type, room config.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_wards(&self, hospital_id: HospitalId)
    -> impl Future<Output = Result<Vec<Ward>>> + Send;

    /// Ward a booking would draw from: the matching row with the most
    /// available beds, ties broken by lowest id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn find_ward(&self, lookup: &WardLookup) -> impl Future<Output = Result<Option<Ward>>> + Send;

    /// Ward by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn get_ward(&self, ward_id: WardId) -> impl Future<Output = Result<Option<Ward>>> + Send;

    /// Update the ward matching the upsert's key, or insert it.
    ///
    /// Booking-held `reserved_beds` on an existing row are preserved.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The resulting counters break the ledger invariant → `BedError::Validation`
    /// - The store query fails
    fn upsert_ward(&self, upsert: &WardUpsert) -> impl Future<Output = Result<WardId>> + Send;

    /// Partially update a ward's counters.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ward not found → `BedError::NotFound`
    /// - Empty patch or unbalanced result → `BedError::Validation`
    /// - The store query fails
    fn update_ward_counts(
        &self,
        ward_id: WardId,
        patch: &WardCountsPatch,
    ) -> impl Future<Output = Result<Ward>> + Send;

    /// Delete a ward.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Ward not found → `BedError::NotFound`
    /// - A confirmed booking still holds a bed in it → `BedError::Conflict`
    /// - The store query fails
    fn delete_ward(&self, ward_id: WardId) -> impl Future<Output = Result<()>> + Send;
}
