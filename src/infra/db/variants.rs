use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateVariantParams, RepoError, UpdateVariantParams, VariantsRepo, VariantsWriteRepo,
    },
    domain::entities::VariantRecord,
};

use super::{PostgresRepositories, contains_pattern, map_sqlx_error};

#[derive(sqlx::FromRow)]
pub(super) struct VariantRow {
    pub(super) id: i64,
    pub(super) color: String,
    pub(super) size: String,
    pub(super) stock: i32,
    pub(super) sku: String,
    pub(super) product_id: i64,
    pub(super) created_at: OffsetDateTime,
    pub(super) updated_at: Option<OffsetDateTime>,
}

impl From<VariantRow> for VariantRecord {
    fn from(row: VariantRow) -> Self {
        Self {
            id: row.id,
            color: row.color,
            size: row.size,
            stock: row.stock,
            sku: row.sku,
            product_id: row.product_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl VariantsRepo for PostgresRepositories {
    async fn list_variants(&self) -> Result<Vec<VariantRecord>, RepoError> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, color, size, stock, sku, product_id, created_at, updated_at
            FROM variants
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(VariantRecord::from).collect())
    }

    async fn find_variant(&self, id: i64) -> Result<Option<VariantRecord>, RepoError> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, color, size, stock, sku, product_id, created_at, updated_at
            FROM variants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(VariantRecord::from))
    }

    async fn find_variant_by_combination(
        &self,
        product_id: i64,
        color: &str,
        size: &str,
    ) -> Result<Option<VariantRecord>, RepoError> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, color, size, stock, sku, product_id, created_at, updated_at
            FROM variants
            WHERE product_id = $1 AND color = $2 AND size = $3
            "#,
        )
        .bind(product_id)
        .bind(color)
        .bind(size)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(VariantRecord::from))
    }

    async fn search_variants(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<VariantRecord>, RepoError> {
        let rows = sqlx::query_as::<_, VariantRow>(
            r#"
            SELECT id, color, size, stock, sku, product_id, created_at, updated_at
            FROM variants
            WHERE sku ILIKE $1
            ORDER BY sku ASC
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(term))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(VariantRecord::from).collect())
    }
}

#[async_trait]
impl VariantsWriteRepo for PostgresRepositories {
    async fn create_variant(&self, params: CreateVariantParams) -> Result<VariantRecord, RepoError> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            INSERT INTO variants (color, size, stock, sku, product_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, color, size, stock, sku, product_id, created_at, updated_at
            "#,
        )
        .bind(&params.color)
        .bind(&params.size)
        .bind(params.stock)
        .bind(&params.sku)
        .bind(params.product_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_variant(&self, params: UpdateVariantParams) -> Result<VariantRecord, RepoError> {
        let row = sqlx::query_as::<_, VariantRow>(
            r#"
            UPDATE variants
            SET color = $2, size = $3, stock = $4, sku = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, color, size, stock, sku, product_id, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(&params.color)
        .bind(&params.size)
        .bind(params.stock)
        .bind(&params.sku)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(row.into())
    }

    async fn delete_variant(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM variants WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
