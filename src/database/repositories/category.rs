//! Category repository implementation
//!
//! Categories are administered by an out-of-scope module; the core only
//! needs existence checks and lookups.

use sqlx::PgPool;

use crate::models::category::Category;
use crate::utils::errors::AfishaError;

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: PgPool,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Check whether a category exists
    pub async fn exists(&self, id: i64) -> Result<bool, AfishaError> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    /// Find category by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AfishaError> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Batch lookup used by list enrichment
    pub async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Category>, AfishaError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }
}
