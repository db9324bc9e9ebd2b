//! PostgreSQL bed store.
//!
//! Implements every provider trait over one `PgPool`. Rows are read into
//! flat `FromRow` structs and converted into domain types with `TryFrom`;
//! an enum column holding an unknown value is a store error.
//!
//! # Example
//!
//! ```no_run
//! use pocketcare_beds::stores::PostgresBedStore;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/pocketcare").await?;
//! let store = PostgresBedStore::new(pool);
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

mod allocation_log;
mod booking;
mod directory;
mod room;
mod ward;

use crate::error::{BedError, Result};
use crate::ledger::{WardLookup, WardSelector};
use crate::types::ParseEnumError;
use pocketcare_web::ReadinessProbe;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::str::FromStr;

/// PostgreSQL implementation of [`BedStore`](crate::providers::BedStore).
#[derive(Clone)]
pub struct PostgresBedStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresBedStore {
    /// Create a new store over `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BedError::Store(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl ReadinessProbe for PostgresBedStore {
    fn component(&self) -> &'static str {
        "database"
    }

    async fn probe(&self) -> std::result::Result<(), String> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| format!("Database unreachable: {e}"))
    }
}

/// Parse a stored enum column.
fn decode<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    value.parse().map_err(|e| BedError::corrupt_row(&e))
}

/// Parse an optional stored enum column.
fn decode_opt<T>(value: Option<&str>) -> Result<Option<T>>
where
    T: FromStr<Err = ParseEnumError>,
{
    value.map(decode).transpose()
}

/// Append the ward lookup predicate (no leading `AND`).
fn push_lookup(qb: &mut QueryBuilder<'_, Postgres>, lookup: &WardLookup) {
    qb.push("hospital_id = ")
        .push_bind(lookup.hospital_id.get())
        .push(" AND ward_type = ")
        .push_bind(lookup.ward_type.as_str());
    match lookup.selector {
        WardSelector::RoomConfig(config) => {
            qb.push(" AND room_config = ").push_bind(config.as_str());
        }
        WardSelector::AnyAcType => {}
        WardSelector::AcType(ac_type) => {
            qb.push(" AND ac_type = ").push_bind(ac_type.as_str());
        }
    }
}
