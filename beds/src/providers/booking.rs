//! Booking repository trait.

use super::{
    BookingFilter, BookingTransition, NewBooking, ReservedBooking, TransitionOutcome,
};
use crate::error::Result;
use crate::ledger::WardLookup;
use crate::types::{
    Booking, BookingId, BookingWithHospital, BookingWithUser, HospitalId, UserId,
};
use std::future::Future;

/// User bed bookings.
///
/// # Implementation Notes
///
/// - `create_confirmed_booking` and `transition_booking` change a booking and
///   a ward counter together; both changes commit or neither does
/// - Status changes are compare-and-swap on the previously observed status
pub trait BookingRepository: Send + Sync {
    /// Reserve one bed in the ward selected by `lookup` and insert the
    /// booking as `confirmed`, atomically.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No matching ward has an available bed → `BedError::CapacityExhausted`
    ///   (nothing is written)
    /// - The store query fails
    fn create_confirmed_booking(
        &self,
        booking: &NewBooking,
        lookup: &WardLookup,
    ) -> impl Future<Output = Result<ReservedBooking>> + Send;

    /// Booking owned by a user.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn find_user_booking(
        &self,
        booking_id: BookingId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// Booking placed at a hospital.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn find_hospital_booking(
        &self,
        booking_id: BookingId,
        hospital_id: HospitalId,
    ) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// Change a booking's status if it still equals `transition.from`, and
    /// release one bed into `transition.release` in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn transition_booking(
        &self,
        transition: &BookingTransition,
    ) -> impl Future<Output = Result<TransitionOutcome>> + Send;

    /// A user's bookings, newest first, with hospital details.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_user_bookings(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<BookingWithHospital>>> + Send;

    /// A hospital's bookings, newest first, with the booking user's details.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_hospital_bookings(
        &self,
        hospital_id: HospitalId,
        filter: &BookingFilter,
    ) -> impl Future<Output = Result<Vec<BookingWithUser>>> + Send;
}
