//! Private room repository trait.

use super::{NewPrivateRoom, RoomPatch};
use crate::error::Result;
use crate::types::{HospitalId, PrivateRoom, RoomId, RoomStatus};
use std::future::Future;

/// Private room inventory.
pub trait PrivateRoomRepository: Send + Sync {
    /// Rooms of a hospital ordered by room number, optionally by status.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_rooms(
        &self,
        hospital_id: HospitalId,
        status: Option<RoomStatus>,
    ) -> impl Future<Output = Result<Vec<PrivateRoom>>> + Send;

    /// Room by id.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn get_room(&self, room_id: RoomId) -> impl Future<Output = Result<Option<PrivateRoom>>> + Send;

    /// Insert a room.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The room number is taken in this hospital → `BedError::Conflict`
    /// - The store query fails
    fn create_room(&self, room: &NewPrivateRoom) -> impl Future<Output = Result<RoomId>> + Send;

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Room not found → `BedError::NotFound`
    /// - The new room number is taken → `BedError::Conflict`
    /// - The store query fails
    fn update_room(
        &self,
        room_id: RoomId,
        patch: &RoomPatch,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a room.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Room not found → `BedError::NotFound`
    /// - The store query fails
    fn delete_room(&self, room_id: RoomId) -> impl Future<Output = Result<()>> + Send;
}
