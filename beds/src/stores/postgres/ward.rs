//! Ward capacity rows.

use super::{PostgresBedStore, decode, decode_opt, push_lookup};
use crate::error::{BedError, Result};
use crate::ledger::{BedCounts, WardCountsPatch, WardLookup, WardUpsert};
use crate::providers::WardLedger;
use crate::types::{BookingStatus, HospitalId, Ward, WardId};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, QueryBuilder};

pub(super) const WARD_COLUMNS: &str = "id, hospital_id, ward_type, ac_type, room_config, \
     total_beds, available_beds, occupied_beds, reserved_beds, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(super) struct WardRow {
    id: i64,
    hospital_id: i64,
    ward_type: String,
    ac_type: String,
    room_config: Option<String>,
    total_beds: i32,
    available_beds: i32,
    occupied_beds: i32,
    reserved_beds: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WardRow> for Ward {
    type Error = BedError;

    fn try_from(row: WardRow) -> Result<Self> {
        Ok(Self {
            id: WardId(row.id),
            hospital_id: HospitalId(row.hospital_id),
            ward_type: decode(&row.ward_type)?,
            ac_type: decode(&row.ac_type)?,
            room_config: decode_opt(row.room_config.as_deref())?,
            counts: BedCounts {
                total_beds: row.total_beds,
                available_beds: row.available_beds,
                occupied_beds: row.occupied_beds,
                reserved_beds: row.reserved_beds,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl WardLedger for PostgresBedStore {
    async fn list_wards(&self, hospital_id: HospitalId) -> Result<Vec<Ward>> {
        let rows = sqlx::query_as::<_, WardRow>(&format!(
            "SELECT {WARD_COLUMNS} FROM bed_wards WHERE hospital_id = $1 \
             ORDER BY ward_type, ac_type, room_config NULLS FIRST, id"
        ))
        .bind(hospital_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Ward::try_from).collect()
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    async fn find_ward(&self, lookup: &WardLookup) -> Result<Option<Ward>> {
        let mut qb = QueryBuilder::new(format!("SELECT {WARD_COLUMNS} FROM bed_wards WHERE "));
        push_lookup(&mut qb, lookup);
        qb.push(" ORDER BY available_beds DESC, id LIMIT 1");

        qb.build_query_as::<WardRow>()
            .fetch_optional(&self.pool)
            .await?
            .map(Ward::try_from)
            .transpose()
    }

    async fn get_ward(&self, ward_id: WardId) -> Result<Option<Ward>> {
        sqlx::query_as::<_, WardRow>(&format!("SELECT {WARD_COLUMNS} FROM bed_wards WHERE id = $1"))
            .bind(ward_id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(Ward::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    async fn upsert_ward(&self, upsert: &WardUpsert) -> Result<WardId> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, WardRow>(&format!(
            "SELECT {WARD_COLUMNS} FROM bed_wards \
             WHERE hospital_id = $1 AND ward_type = $2 AND ac_type = $3 \
               AND room_config IS NOT DISTINCT FROM $4 \
             FOR UPDATE"
        ))
        .bind(upsert.hospital_id.get())
        .bind(upsert.ward_type.as_str())
        .bind(upsert.ac_type.as_str())
        .bind(upsert.room_config.map(|c| c.as_str()))
        .fetch_optional(&mut *tx)
        .await?;

        let ward_id = if let Some(row) = existing {
            let counts = upsert.counts(row.reserved_beds)?;
            sqlx::query(
                "UPDATE bed_wards \
                 SET total_beds = $2, available_beds = $3, occupied_beds = $4, updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(row.id)
            .bind(counts.total_beds)
            .bind(counts.available_beds)
            .bind(counts.occupied_beds)
            .execute(&mut *tx)
            .await?;
            row.id
        } else {
            let counts = upsert.counts(0)?;
            sqlx::query_scalar::<_, i64>(
                "INSERT INTO bed_wards \
                 (hospital_id, ward_type, ac_type, room_config, \
                  total_beds, available_beds, occupied_beds, reserved_beds) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, 0) \
                 RETURNING id",
            )
            .bind(upsert.hospital_id.get())
            .bind(upsert.ward_type.as_str())
            .bind(upsert.ac_type.as_str())
            .bind(upsert.room_config.map(|c| c.as_str()))
            .bind(counts.total_beds)
            .bind(counts.available_beds)
            .bind(counts.occupied_beds)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;
        tracing::debug!(ward_id, "Ward upserted");
        Ok(WardId(ward_id))
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    async fn update_ward_counts(&self, ward_id: WardId, patch: &WardCountsPatch) -> Result<Ward> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, WardRow>(&format!(
            "SELECT {WARD_COLUMNS} FROM bed_wards WHERE id = $1 FOR UPDATE"
        ))
        .bind(ward_id.get())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| BedError::not_found("Ward", ward_id.get()))?;

        let current = Ward::try_from(row)?;
        let counts = patch.apply(current.counts)?;

        let updated = sqlx::query_as::<_, WardRow>(&format!(
            "UPDATE bed_wards \
             SET total_beds = $2, available_beds = $3, occupied_beds = $4, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {WARD_COLUMNS}"
        ))
        .bind(ward_id.get())
        .bind(counts.total_beds)
        .bind(counts.available_beds)
        .bind(counts.occupied_beds)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ward::try_from(updated)
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    async fn delete_ward(&self, ward_id: WardId) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Reservations lock the ward row before inserting a booking.
        sqlx::query_scalar::<_, i64>("SELECT id FROM bed_wards WHERE id = $1 FOR UPDATE")
            .bind(ward_id.get())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| BedError::not_found("Ward", ward_id.get()))?;

        let held = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_bed_bookings WHERE ward_id = $1 AND status = $2)",
        )
        .bind(ward_id.get())
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_one(&mut *tx)
        .await?;
        if held {
            return Err(BedError::ward_in_use());
        }

        sqlx::query("DELETE FROM bed_wards WHERE id = $1")
            .bind(ward_id.get())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
