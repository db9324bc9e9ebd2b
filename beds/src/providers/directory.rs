//! Read access to records owned by the accounts service.

use crate::error::Result;
use crate::types::{HospitalId, UserId};
use std::future::Future;

/// Hospital and user lookups.
///
/// The bed service does not own `hospitals` or `users`; it only needs to
/// confirm a hospital exists and to default a booking's contact email.
pub trait Directory: Send + Sync {
    /// Hospital display name, or `None` if the hospital does not exist.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn hospital_name(
        &self,
        hospital_id: HospitalId,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Registered email of a user, or `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn user_email(&self, user_id: UserId) -> impl Future<Output = Result<Option<String>>> + Send;
}
