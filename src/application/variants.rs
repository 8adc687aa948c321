use std::sync::Arc;

use tracing::info;

use crate::application::catalog::CatalogPolicy;
use crate::application::error::CatalogError;
use crate::application::repos::{
    CreateVariantParams, ProductsRepo, UpdateVariantParams, VariantsRepo, VariantsWriteRepo,
};
use crate::application::retry::retry_on_sku_collision;
use crate::cache::{CacheInvalidator, InvalidationPlan, ResourceKind, VariantCache};
use crate::domain::commands::{NewProductVariant, VariantPatch};
use crate::domain::entities::VariantRecord;
use crate::domain::sku::generate_sku;

const KIND: ResourceKind = ResourceKind::Variant;

#[derive(Clone)]
pub struct VariantService {
    reader: Arc<dyn VariantsRepo>,
    writer: Arc<dyn VariantsWriteRepo>,
    products: Arc<dyn ProductsRepo>,
    cache: VariantCache,
    invalidator: CacheInvalidator,
    policy: CatalogPolicy,
}

impl VariantService {
    pub fn new(
        reader: Arc<dyn VariantsRepo>,
        writer: Arc<dyn VariantsWriteRepo>,
        products: Arc<dyn ProductsRepo>,
        cache: VariantCache,
        invalidator: CacheInvalidator,
        policy: CatalogPolicy,
    ) -> Self {
        Self {
            reader,
            writer,
            products,
            cache,
            invalidator,
            policy,
        }
    }

    pub async fn list(&self) -> Result<Vec<VariantRecord>, CatalogError> {
        if let Some(cached) = self.cache.get_list().await {
            return Ok(cached);
        }

        let variants = self.reader.list_variants().await?;
        self.cache.set_list(&variants, None).await;
        Ok(variants)
    }

    pub async fn get(&self, id: i64) -> Result<VariantRecord, CatalogError> {
        if let Some(cached) = self.cache.get_by_id(id).await {
            return Ok(cached);
        }

        let variant = self
            .reader
            .find_variant(id)
            .await?
            .ok_or_else(|| CatalogError::missing(KIND, id))?;
        self.cache.set_by_id(&variant, None).await;
        Ok(variant)
    }

    /// Case-insensitive SKU search, ascending by SKU.
    pub async fn search(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> Result<Vec<VariantRecord>, CatalogError> {
        let query = self.policy.search_query(term, limit)?;

        if query.cacheable
            && let Some(cached) = self.cache.get_search(&query.term).await
        {
            return Ok(cached);
        }

        let variants = self
            .reader
            .search_variants(&query.term, query.limit)
            .await?;
        if variants.is_empty() {
            return Err(CatalogError::no_matches(KIND, &query.term));
        }
        if query.cacheable {
            self.cache.set_search(&variants, &query.term, None).await;
        }
        Ok(variants)
    }

    pub async fn create(&self, input: NewProductVariant) -> Result<VariantRecord, CatalogError> {
        let input = input.validate()?;

        if self.products.find_product(input.product_id).await?.is_none() {
            return Err(CatalogError::missing(ResourceKind::Product, input.product_id));
        }
        self.ensure_unique_combination(input.product_id, &input.color, &input.size, None)
            .await?;

        let writer = self.writer.clone();
        let variant = retry_on_sku_collision(self.policy.sku_max_attempts, move |_| {
            let writer = writer.clone();
            let params = CreateVariantParams {
                product_id: input.product_id,
                sku: generate_sku(input.product_id, &input.color, &input.size),
                color: input.color.clone(),
                size: input.size.clone(),
                stock: input.stock,
            };
            async move { writer.create_variant(params).await }
        })
        .await
        .map_err(|err| CatalogError::from_repo(KIND, err))?;

        let plan =
            InvalidationPlan::for_create(KIND).merge(owning_product_plan(variant.product_id));
        self.invalidator.apply(&plan).await;
        self.cache.set_by_id(&variant, None).await;

        info!(
            target = "catalog::application::variants",
            variant_id = variant.id,
            product_id = variant.product_id,
            sku = %variant.sku,
            "Variant created"
        );
        Ok(variant)
    }

    /// Applies `patch`; a new SKU is generated when color or size changes.
    pub async fn update(&self, id: i64, patch: VariantPatch) -> Result<VariantRecord, CatalogError> {
        let patch = patch.validate()?;

        let existing = self
            .reader
            .find_variant(id)
            .await?
            .ok_or_else(|| CatalogError::missing(KIND, id))?;

        let color = patch.color.unwrap_or_else(|| existing.color.clone());
        let size = patch.size.unwrap_or_else(|| existing.size.clone());
        let stock = patch.stock.unwrap_or(existing.stock);
        let identity_changed = color != existing.color || size != existing.size;

        if identity_changed {
            self.ensure_unique_combination(existing.product_id, &color, &size, Some(id))
                .await?;
        }

        let writer = self.writer.clone();
        let product_id = existing.product_id;
        let current_sku = existing.sku;
        let variant = retry_on_sku_collision(self.policy.sku_max_attempts, move |_| {
            let writer = writer.clone();
            let sku = if identity_changed {
                generate_sku(product_id, &color, &size)
            } else {
                current_sku.clone()
            };
            let params = UpdateVariantParams {
                id,
                color: color.clone(),
                size: size.clone(),
                stock,
                sku,
            };
            async move { writer.update_variant(params).await }
        })
        .await
        .map_err(|err| CatalogError::from_repo(KIND, err))?;

        let plan = InvalidationPlan::for_update(KIND, id).merge(owning_product_plan(product_id));
        self.invalidator.apply(&plan).await;
        self.cache.set_by_id(&variant, None).await;

        info!(
            target = "catalog::application::variants",
            variant_id = id,
            sku_regenerated = identity_changed,
            "Variant updated"
        );
        Ok(variant)
    }

    pub async fn delete(&self, id: i64) -> Result<(), CatalogError> {
        let existing = self
            .reader
            .find_variant(id)
            .await?
            .ok_or_else(|| CatalogError::missing(KIND, id))?;

        self.writer
            .delete_variant(id)
            .await
            .map_err(|err| CatalogError::from_repo(KIND, err))?;

        let plan =
            InvalidationPlan::for_delete(KIND, id).merge(owning_product_plan(existing.product_id));
        self.invalidator.apply(&plan).await;

        info!(
            target = "catalog::application::variants",
            variant_id = id,
            "Variant deleted"
        );
        Ok(())
    }

    async fn ensure_unique_combination(
        &self,
        product_id: i64,
        color: &str,
        size: &str,
        exclude: Option<i64>,
    ) -> Result<(), CatalogError> {
        let clash = self
            .reader
            .find_variant_by_combination(product_id, color, size)
            .await?
            .filter(|other| Some(other.id) != exclude);

        match clash {
            Some(other) => Err(CatalogError::conflict(
                KIND,
                format!(
                    "product {product_id} already has a {color}/{size} variant (id {})",
                    other.id
                ),
            )),
            None => Ok(()),
        }
    }
}

/// Products inline their variants, so a variant write stales its product.
fn owning_product_plan(product_id: i64) -> InvalidationPlan {
    InvalidationPlan::new()
        .listing(ResourceKind::Product)
        .entity(ResourceKind::Product, product_id)
        .searches(ResourceKind::Product)
}
