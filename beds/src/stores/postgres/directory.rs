//! Hospital and user lookups.

use super::PostgresBedStore;
use crate::error::Result;
use crate::providers::Directory;
use crate::types::{HospitalId, UserId};

impl Directory for PostgresBedStore {
    async fn hospital_name(&self, hospital_id: HospitalId) -> Result<Option<String>> {
        let name = sqlx::query_scalar::<_, String>("SELECT name FROM hospitals WHERE id = $1")
            .bind(hospital_id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(name)
    }

    async fn user_email(&self, user_id: UserId) -> Result<Option<String>> {
        let email = sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1")
            .bind(user_id.get())
            .fetch_optional(&self.pool)
            .await?;
        Ok(email)
    }
}
