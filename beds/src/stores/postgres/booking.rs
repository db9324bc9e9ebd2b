//! User bed bookings.
//!
//! A booking and the ward counter it holds are always written in the same
//! transaction.

use super::{PostgresBedStore, decode, decode_opt, push_lookup};
use crate::error::{BedError, Result};
use crate::ledger::WardLookup;
use crate::providers::{
    BookingFilter, BookingRepository, BookingTransition, NewBooking, ReleaseTarget,
    ReservedBooking, TransitionOutcome,
};
use crate::types::{
    Booking, BookingId, BookingStatus, BookingWithHospital, BookingWithUser, HospitalId,
    UserContact, UserId, WardId,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgConnection, QueryBuilder};

const BOOKING_COLUMNS: &str = "b.id, b.user_id, b.hospital_id, b.ward_id, b.ward_type, b.ac_type, \
     b.room_config, b.patient_name, b.patient_age, b.patient_gender, b.patient_phone, \
     b.patient_email, b.emergency_contact, b.preferred_date, b.expected_discharge_date, \
     b.admission_reason, b.doctor_name, b.special_requirements, b.status, b.notes, \
     b.created_at, b.updated_at";

const RELEASE_SET: &str = "UPDATE bed_wards \
     SET available_beds = available_beds + 1, \
         reserved_beds = GREATEST(reserved_beds - 1, 0), \
         updated_at = NOW() ";

#[derive(Debug, FromRow)]
struct BookingRow {
    id: i64,
    user_id: i64,
    hospital_id: i64,
    ward_id: Option<i64>,
    ward_type: String,
    ac_type: String,
    room_config: Option<String>,
    patient_name: String,
    patient_age: Option<i32>,
    patient_gender: Option<String>,
    patient_phone: String,
    patient_email: Option<String>,
    emergency_contact: Option<String>,
    preferred_date: NaiveDate,
    expected_discharge_date: Option<NaiveDate>,
    admission_reason: Option<String>,
    doctor_name: Option<String>,
    special_requirements: Option<String>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BedError;

    fn try_from(row: BookingRow) -> Result<Self> {
        Ok(Self {
            id: BookingId(row.id),
            user_id: UserId(row.user_id),
            hospital_id: HospitalId(row.hospital_id),
            ward_id: row.ward_id.map(WardId),
            ward_type: decode(&row.ward_type)?,
            ac_type: decode(&row.ac_type)?,
            room_config: decode_opt(row.room_config.as_deref())?,
            patient_name: row.patient_name,
            patient_age: row.patient_age,
            patient_gender: decode_opt(row.patient_gender.as_deref())?,
            patient_phone: row.patient_phone,
            patient_email: row.patient_email,
            emergency_contact: row.emergency_contact,
            preferred_date: row.preferred_date,
            expected_discharge_date: row.expected_discharge_date,
            admission_reason: row.admission_reason,
            doctor_name: row.doctor_name,
            special_requirements: row.special_requirements,
            status: decode(&row.status)?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct BookingHospitalRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    hospital_name: String,
    hospital_address: Option<String>,
    hospital_phone: Option<String>,
}

impl TryFrom<BookingHospitalRow> for BookingWithHospital {
    type Error = BedError;

    fn try_from(row: BookingHospitalRow) -> Result<Self> {
        Ok(Self {
            booking: Booking::try_from(row.booking)?,
            hospital_name: row.hospital_name,
            hospital_address: row.hospital_address,
            hospital_phone: row.hospital_phone,
        })
    }
}

#[derive(Debug, FromRow)]
struct BookingUserRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    user_name: String,
    user_email: String,
    user_phone: Option<String>,
}

impl TryFrom<BookingUserRow> for BookingWithUser {
    type Error = BedError;

    fn try_from(row: BookingUserRow) -> Result<Self> {
        let booking = Booking::try_from(row.booking)?;
        Ok(Self {
            user: UserContact {
                user_id: booking.user_id,
                name: row.user_name,
                email: row.user_email,
                phone: row.user_phone,
            },
            booking,
        })
    }
}

impl PostgresBedStore {
    async fn find_booking_by(
        &self,
        booking_id: BookingId,
        owner_column: &str,
        owner_id: i64,
    ) -> Result<Option<Booking>> {
        sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM user_bed_bookings b \
             WHERE b.id = $1 AND b.{owner_column} = $2"
        ))
        .bind(booking_id.get())
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Booking::try_from)
        .transpose()
    }
}

/// Release one bed into `target`. Returns the ward credited, if any.
async fn release_bed(conn: &mut PgConnection, target: ReleaseTarget) -> Result<Option<WardId>> {
    let released = match target {
        ReleaseTarget::Ward(ward_id) => {
            sqlx::query_scalar::<_, i64>(&format!("{RELEASE_SET} WHERE id = $1 RETURNING id"))
                .bind(ward_id.get())
                .fetch_optional(&mut *conn)
                .await?
        }
        ReleaseTarget::Lookup(lookup) => {
            let mut qb = QueryBuilder::new(format!(
                "{RELEASE_SET} WHERE id = (SELECT id FROM bed_wards WHERE "
            ));
            push_lookup(&mut qb, &lookup);
            qb.push(" ORDER BY reserved_beds DESC, id LIMIT 1 FOR UPDATE) RETURNING id");
            qb.build_query_scalar::<i64>()
                .fetch_optional(&mut *conn)
                .await?
        }
    };
    Ok(released.map(WardId))
}

impl BookingRepository for PostgresBedStore {
    #[tracing::instrument(skip(self, booking), fields(hospital_id = %booking.hospital_id), err)]
    async fn create_confirmed_booking(
        &self,
        booking: &NewBooking,
        lookup: &WardLookup,
    ) -> Result<ReservedBooking> {
        let mut tx = self.pool.begin().await?;

        let mut qb = QueryBuilder::new(
            "UPDATE bed_wards \
             SET available_beds = available_beds - 1, \
                 reserved_beds = reserved_beds + 1, \
                 updated_at = NOW() \
             WHERE id = (SELECT id FROM bed_wards WHERE ",
        );
        push_lookup(&mut qb, lookup);
        qb.push(
            " AND available_beds > 0 ORDER BY available_beds DESC, id LIMIT 1 FOR UPDATE) \
             AND available_beds > 0 \
             RETURNING id",
        );

        let Some(ward_id) = qb
            .build_query_scalar::<i64>()
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Err(BedError::CapacityExhausted {
                ward_type: booking.ward_type,
            });
        };

        let booking_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO user_bed_bookings \
             (user_id, hospital_id, ward_id, ward_type, ac_type, room_config, \
              patient_name, patient_age, patient_gender, patient_phone, patient_email, \
              emergency_contact, preferred_date, expected_discharge_date, admission_reason, \
              doctor_name, special_requirements, notes, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
             RETURNING id",
        )
        .bind(booking.user_id.get())
        .bind(booking.hospital_id.get())
        .bind(ward_id)
        .bind(booking.ward_type.as_str())
        .bind(booking.ac_type.as_str())
        .bind(booking.room_config.map(|c| c.as_str()))
        .bind(&booking.patient_name)
        .bind(booking.patient_age)
        .bind(booking.patient_gender.map(|g| g.as_str()))
        .bind(&booking.patient_phone)
        .bind(&booking.patient_email)
        .bind(&booking.emergency_contact)
        .bind(booking.preferred_date)
        .bind(booking.expected_discharge_date)
        .bind(&booking.admission_reason)
        .bind(&booking.doctor_name)
        .bind(&booking.special_requirements)
        .bind(&booking.notes)
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ReservedBooking {
            booking_id: BookingId(booking_id),
            ward_id: WardId(ward_id),
        })
    }

    async fn find_user_booking(&self, booking_id: BookingId, user_id: UserId) -> Result<Option<Booking>> {
        self.find_booking_by(booking_id, "user_id", user_id.get()).await
    }

    async fn find_hospital_booking(
        &self,
        booking_id: BookingId,
        hospital_id: HospitalId,
    ) -> Result<Option<Booking>> {
        self.find_booking_by(booking_id, "hospital_id", hospital_id.get())
            .await
    }

    #[tracing::instrument(skip(self), level = "debug", err)]
    async fn transition_booking(&self, transition: &BookingTransition) -> Result<TransitionOutcome> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE user_bed_bookings \
             SET status = $3, notes = COALESCE($4, notes), updated_at = NOW() \
             WHERE id = $1 AND status = $2",
        )
        .bind(transition.booking_id.get())
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .bind(&transition.notes)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(TransitionOutcome::Stale);
        }

        let released = match transition.release {
            Some(target) => release_bed(&mut *tx, target).await?,
            None => None,
        };

        tx.commit().await?;
        Ok(TransitionOutcome::Applied { released })
    }

    async fn list_user_bookings(&self, user_id: UserId) -> Result<Vec<BookingWithHospital>> {
        let rows = sqlx::query_as::<_, BookingHospitalRow>(&format!(
            "SELECT {BOOKING_COLUMNS}, \
                    h.name AS hospital_name, h.address AS hospital_address, h.phone AS hospital_phone \
             FROM user_bed_bookings b \
             JOIN hospitals h ON h.id = b.hospital_id \
             WHERE b.user_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(BookingWithHospital::try_from).collect()
    }

    async fn list_hospital_bookings(
        &self,
        hospital_id: HospitalId,
        filter: &BookingFilter,
    ) -> Result<Vec<BookingWithUser>> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {BOOKING_COLUMNS}, \
                    u.name AS user_name, u.email AS user_email, u.phone AS user_phone \
             FROM user_bed_bookings b \
             JOIN users u ON u.id = b.user_id \
             WHERE b.hospital_id = "
        ));
        qb.push_bind(hospital_id.get());
        if let Some(status) = filter.status {
            qb.push(" AND b.status = ").push_bind(status.as_str());
        }
        if let Some(ward_type) = filter.ward_type {
            qb.push(" AND b.ward_type = ").push_bind(ward_type.as_str());
        }
        qb.push(" ORDER BY b.created_at DESC, b.id DESC");

        let rows = qb
            .build_query_as::<BookingUserRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(BookingWithUser::try_from).collect()
    }
}
