use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{Executor, Postgres};
use time::OffsetDateTime;

use crate::{
    application::repos::{
        CreateProductParams, ProductsRepo, ProductsWriteRepo, RepoError, UpdateProductParams,
    },
    domain::{
        entities::{CategoryRecord, ProductRecord, VariantRecord},
        sku::generate_sku,
    },
};

use super::{PostgresRepositories, contains_pattern, map_sqlx_error, variants::VariantRow};

const PRODUCT_SELECT: &str = r#"
    SELECT
        p.id,
        p.name,
        p.description,
        p.price,
        p.sale_price,
        p.image_url,
        p.active,
        p.created_at,
        p.updated_at,
        c.id AS category_id,
        c.name AS category_name,
        c.logo AS category_logo
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    description: String,
    price: f64,
    sale_price: Option<f64>,
    image_url: String,
    active: bool,
    created_at: OffsetDateTime,
    updated_at: Option<OffsetDateTime>,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_logo: Option<String>,
}

impl ProductRow {
    fn into_record(self, variants: Vec<VariantRecord>) -> ProductRecord {
        let category = match (self.category_id, self.category_name, self.category_logo) {
            (Some(id), Some(name), Some(logo)) => Some(CategoryRecord { id, name, logo }),
            _ => None,
        };

        ProductRecord {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            sale_price: self.sale_price,
            image_url: self.image_url,
            active: self.active,
            category,
            variants,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Loads the variants of every row and assembles the output records in row order.
async fn hydrate<'e, E>(executor: E, rows: Vec<ProductRow>) -> Result<Vec<ProductRecord>, RepoError>
where
    E: Executor<'e, Database = Postgres>,
{
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let variant_rows = sqlx::query_as::<_, VariantRow>(
        r#"
        SELECT id, color, size, stock, sku, product_id, created_at, updated_at
        FROM variants
        WHERE product_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(&ids)
    .fetch_all(executor)
    .await
    .map_err(map_sqlx_error)?;

    let mut by_product: HashMap<i64, Vec<VariantRecord>> = HashMap::new();
    for row in variant_rows {
        by_product
            .entry(row.product_id)
            .or_default()
            .push(row.into());
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let variants = by_product.remove(&row.id).unwrap_or_default();
            row.into_record(variants)
        })
        .collect())
}

impl PostgresRepositories {
    async fn load_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(hydrate(self.pool(), vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} ORDER BY p.id"))
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        hydrate(self.pool(), rows).await
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        self.load_product(id).await
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<ProductRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.name = $1"))
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        match row {
            Some(row) => Ok(hydrate(self.pool(), vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn search_products(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_SELECT} WHERE p.name ILIKE $1 ORDER BY p.name ASC LIMIT $2"
        ))
        .bind(contains_pattern(term))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        hydrate(self.pool(), rows).await
    }
}

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn create_product(&self, params: CreateProductParams) -> Result<ProductRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let product_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO products
                (name, description, price, sale_price, image_url, active, category_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.price)
        .bind(params.sale_price)
        .bind(&params.image_url)
        .bind(params.active)
        .bind(params.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        for variant in &params.variants {
            sqlx::query(
                r#"
                INSERT INTO variants (color, size, stock, sku, product_id)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&variant.color)
            .bind(&variant.size)
            .bind(variant.stock)
            .bind(generate_sku(product_id, &variant.color, &variant.size))
            .bind(product_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let product = hydrate(&mut *tx, vec![row])
            .await?
            .pop()
            .ok_or(RepoError::NotFound)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(product)
    }

    async fn update_product(&self, params: UpdateProductParams) -> Result<ProductRecord, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2,
                description = $3,
                price = $4,
                sale_price = $5,
                image_url = $6,
                active = $7,
                category_id = $8,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(params.id)
        .bind(&params.name)
        .bind(&params.description)
        .bind(params.price)
        .bind(params.sale_price)
        .bind(&params.image_url)
        .bind(params.active)
        .bind(params.category_id)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(params.id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        let product = hydrate(&mut *tx, vec![row])
            .await?
            .pop()
            .ok_or(RepoError::NotFound)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(product)
    }

    async fn delete_product(&self, id: i64) -> Result<Vec<i64>, RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let variant_ids = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM variants WHERE product_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(variant_ids)
    }
}
