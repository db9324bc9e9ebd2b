//! Private room inventory.

use super::{PostgresBedStore, decode};
use crate::error::{BedError, Result};
use crate::providers::{FieldUpdate, NewPrivateRoom, PrivateRoomRepository, RoomPatch};
use crate::types::{HospitalId, PrivateRoom, RoomId, RoomStatus};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, QueryBuilder};

const ROOM_COLUMNS: &str = "id, hospital_id, room_number, bed_count, has_attached_bathroom, \
     ac_type, status, daily_rate, patient_name, patient_contact, admission_date, \
     expected_discharge_date, notes, created_at, updated_at";

#[derive(Debug, FromRow)]
struct RoomRow {
    id: i64,
    hospital_id: i64,
    room_number: String,
    bed_count: i16,
    has_attached_bathroom: bool,
    ac_type: String,
    status: String,
    daily_rate: f64,
    patient_name: Option<String>,
    patient_contact: Option<String>,
    admission_date: Option<NaiveDate>,
    expected_discharge_date: Option<NaiveDate>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for PrivateRoom {
    type Error = BedError;

    fn try_from(row: RoomRow) -> Result<Self> {
        Ok(Self {
            id: RoomId(row.id),
            hospital_id: HospitalId(row.hospital_id),
            room_number: row.room_number,
            bed_count: row.bed_count,
            has_attached_bathroom: row.has_attached_bathroom,
            ac_type: decode(&row.ac_type)?,
            status: decode(&row.status)?,
            daily_rate: row.daily_rate,
            patient_name: row.patient_name,
            patient_contact: row.patient_contact,
            admission_date: row.admission_date,
            expected_discharge_date: row.expected_discharge_date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl PrivateRoomRepository for PostgresBedStore {
    async fn list_rooms(&self, hospital_id: HospitalId, status: Option<RoomStatus>) -> Result<Vec<PrivateRoom>> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {ROOM_COLUMNS} FROM private_rooms WHERE hospital_id = "
        ));
        qb.push_bind(hospital_id.get());
        if let Some(status) = status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        qb.push(" ORDER BY room_number");

        let rows = qb.build_query_as::<RoomRow>().fetch_all(&self.pool).await?;
        rows.into_iter().map(PrivateRoom::try_from).collect()
    }

    async fn get_room(&self, room_id: RoomId) -> Result<Option<PrivateRoom>> {
        sqlx::query_as::<_, RoomRow>(&format!("SELECT {ROOM_COLUMNS} FROM private_rooms WHERE id = $1"))
            .bind(room_id.get())
            .fetch_optional(&self.pool)
            .await?
            .map(PrivateRoom::try_from)
            .transpose()
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    async fn create_room(&self, room: &NewPrivateRoom) -> Result<RoomId> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO private_rooms \
             (hospital_id, room_number, bed_count, has_attached_bathroom, ac_type, status, daily_rate, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING id",
        )
        .bind(room.hospital_id.get())
        .bind(&room.room_number)
        .bind(room.bed_count)
        .bind(room.has_attached_bathroom)
        .bind(room.ac_type.as_str())
        .bind(room.status.as_str())
        .bind(room.daily_rate)
        .bind(&room.notes)
        .fetch_one(&self.pool)
        .await?;

        Ok(RoomId(id))
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    async fn update_room(&self, room_id: RoomId, patch: &RoomPatch) -> Result<()> {
        if patch.is_empty() {
            return Err(BedError::Validation("No fields to update".to_string()));
        }

        let mut qb = QueryBuilder::new("UPDATE private_rooms SET ");
        let mut set = qb.separated(", ");

        if let Some(room_number) = &patch.room_number {
            set.push("room_number = ").push_bind_unseparated(room_number.clone());
        }
        if let Some(bed_count) = patch.bed_count {
            set.push("bed_count = ").push_bind_unseparated(bed_count);
        }
        if let Some(bathroom) = patch.has_attached_bathroom {
            set.push("has_attached_bathroom = ").push_bind_unseparated(bathroom);
        }
        if let Some(ac_type) = patch.ac_type {
            set.push("ac_type = ").push_bind_unseparated(ac_type.as_str());
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        if let Some(rate) = patch.daily_rate {
            set.push("daily_rate = ").push_bind_unseparated(rate);
        }

        match &patch.patient_name {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                set.push("patient_name = NULL");
            }
            FieldUpdate::Set(name) => {
                set.push("patient_name = ").push_bind_unseparated(name.clone());
            }
        }
        match &patch.patient_contact {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                set.push("patient_contact = NULL");
            }
            FieldUpdate::Set(contact) => {
                set.push("patient_contact = ").push_bind_unseparated(contact.clone());
            }
        }
        match patch.admission_date {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                set.push("admission_date = NULL");
            }
            FieldUpdate::Set(date) => {
                set.push("admission_date = ").push_bind_unseparated(date);
            }
        }
        match patch.expected_discharge_date {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                set.push("expected_discharge_date = NULL");
            }
            FieldUpdate::Set(date) => {
                set.push("expected_discharge_date = ").push_bind_unseparated(date);
            }
        }
        match &patch.notes {
            FieldUpdate::Keep => {}
            FieldUpdate::Clear => {
                set.push("notes = NULL");
            }
            FieldUpdate::Set(notes) => {
                set.push("notes = ").push_bind_unseparated(notes.clone());
            }
        }
        set.push("updated_at = NOW()");

        qb.push(" WHERE id = ").push_bind(room_id.get());

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(BedError::not_found("Room", room_id.get()));
        }
        Ok(())
    }

    async fn delete_room(&self, room_id: RoomId) -> Result<()> {
        let result = sqlx::query("DELETE FROM private_rooms WHERE id = $1")
            .bind(room_id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(BedError::not_found("Room", room_id.get()));
        }
        Ok(())
    }
}
