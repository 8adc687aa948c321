use async_trait::async_trait;

use crate::{
    application::repos::{
        CategoriesRepo, CategoriesWriteRepo, CategoryCascade, CategoryUpdate, CreateCategoryParams,
        RepoError, UpdateCategoryParams,
    },
    domain::entities::CategoryRecord,
};

use super::{PostgresRepositories, contains_pattern, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    logo: String,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            logo: row.logo,
        }
    }
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, logo
            FROM categories
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, logo
            FROM categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, logo
            FROM categories
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn search_categories(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name, logo
            FROM categories
            WHERE name ILIKE $1
            ORDER BY name ASC
            LIMIT $2
            "#,
        )
        .bind(contains_pattern(term))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }
}

#[async_trait]
impl CategoriesWriteRepo for PostgresRepositories {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO categories (name, logo)
            VALUES ($1, $2)
            RETURNING id, name, logo
            "#,
        )
        .bind(&params.name)
        .bind(&params.logo)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryUpdate, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE categories
            SET name = $2, logo = $3
            WHERE id = $1
            RETURNING id, name, logo
            "#,
        )
        .bind(params.id)
        .bind(&params.name)
        .bind(&params.logo)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        let product_ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM products WHERE category_id = $1 ORDER BY id",
        )
        .bind(params.id)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(CategoryUpdate {
            category: row.into(),
            product_ids,
        })
    }

    async fn delete_category(&self, id: i64) -> Result<CategoryCascade, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        // Collect what the foreign keys are about to cascade away.
        let product_ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM products WHERE category_id = $1 ORDER BY id FOR UPDATE",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let variant_ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM variants WHERE product_id = ANY($1) ORDER BY id",
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;

        Ok(CategoryCascade {
            product_ids,
            variant_ids,
        })
    }
}
