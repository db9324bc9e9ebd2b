//! Allocation log.

use super::{PostgresBedStore, decode};
use crate::error::{BedError, Result};
use crate::providers::{AllocationLogRepository, NewAllocationLog};
use crate::types::{AllocationLogEntry, HospitalId, LogId, RoomId, WardId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
struct LogRow {
    id: i64,
    hospital_id: i64,
    ward_id: Option<i64>,
    room_id: Option<i64>,
    allocation_type: String,
    action: String,
    patient_name: Option<String>,
    patient_contact: Option<String>,
    allocated_by: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for AllocationLogEntry {
    type Error = BedError;

    fn try_from(row: LogRow) -> Result<Self> {
        Ok(Self {
            id: LogId(row.id),
            hospital_id: HospitalId(row.hospital_id),
            ward_id: row.ward_id.map(WardId),
            room_id: row.room_id.map(RoomId),
            allocation_type: decode(&row.allocation_type)?,
            action: decode(&row.action)?,
            patient_name: row.patient_name,
            patient_contact: row.patient_contact,
            allocated_by: row.allocated_by,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

impl AllocationLogRepository for PostgresBedStore {
    #[tracing::instrument(skip(self, entry), fields(hospital_id = %entry.hospital_id, action = %entry.action), level = "debug", err)]
    async fn append_log(&self, entry: &NewAllocationLog) -> Result<LogId> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO bed_allocation_logs \
             (hospital_id, ward_id, room_id, allocation_type, action, \
              patient_name, patient_contact, allocated_by, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id",
        )
        .bind(entry.hospital_id.get())
        .bind(entry.ward_id.map(WardId::get))
        .bind(entry.room_id.map(RoomId::get))
        .bind(entry.allocation_type.as_str())
        .bind(entry.action.as_str())
        .bind(&entry.patient_name)
        .bind(&entry.patient_contact)
        .bind(&entry.allocated_by)
        .bind(&entry.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(LogId(id))
    }

    async fn list_logs(&self, hospital_id: HospitalId, limit: i64) -> Result<Vec<AllocationLogEntry>> {
        let rows = sqlx::query_as::<_, LogRow>(
            "SELECT id, hospital_id, ward_id, room_id, allocation_type, action, \
                    patient_name, patient_contact, allocated_by, notes, created_at \
             FROM bed_allocation_logs \
             WHERE hospital_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2",
        )
        .bind(hospital_id.get())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AllocationLogEntry::try_from).collect()
    }
}
