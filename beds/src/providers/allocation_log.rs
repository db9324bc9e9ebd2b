//! Allocation log repository trait.

use super::NewAllocationLog;
use crate::error::Result;
use crate::types::{AllocationLogEntry, HospitalId, LogId};
use std::future::Future;

/// Append-only allocation audit trail. Entries are never updated.
pub trait AllocationLogRepository: Send + Sync {
    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn append_log(&self, entry: &NewAllocationLog) -> impl Future<Output = Result<LogId>> + Send;

    /// Most recent entries of a hospital, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_logs(
        &self,
        hospital_id: HospitalId,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<AllocationLogEntry>>> + Send;
}
