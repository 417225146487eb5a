//! User repository implementation
//!
//! User accounts are administered by an out-of-scope module; the core only
//! needs existence checks and lookups.

use sqlx::PgPool;

use crate::models::user::User;
use crate::utils::errors::AfishaError;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a user exists
    pub async fn exists(&self, id: i64) -> Result<bool, AfishaError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AfishaError> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Batch lookup used by list enrichment
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, AfishaError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users =
            sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(users)
    }
}
