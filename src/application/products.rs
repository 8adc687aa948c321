use std::collections::HashSet;
use std::sync::Arc;

use tracing::info;

use crate::application::catalog::CatalogPolicy;
use crate::application::error::CatalogError;
use crate::application::repos::{
    CategoriesRepo, CreateProductParams, NewVariantParams, ProductsRepo, ProductsWriteRepo,
    UpdateProductParams,
};
use crate::application::retry::retry_on_sku_collision;
use crate::cache::{CacheInvalidator, InvalidationPlan, ProductCache, ResourceKind};
use crate::domain::commands::{NewProduct, ProductPatch};
use crate::domain::entities::ProductRecord;
use crate::domain::error::DomainError;

const KIND: ResourceKind = ResourceKind::Product;

#[derive(Clone)]
pub struct ProductService {
    reader: Arc<dyn ProductsRepo>,
    writer: Arc<dyn ProductsWriteRepo>,
    categories: Arc<dyn CategoriesRepo>,
    cache: ProductCache,
    invalidator: CacheInvalidator,
    policy: CatalogPolicy,
}

impl ProductService {
    pub fn new(
        reader: Arc<dyn ProductsRepo>,
        writer: Arc<dyn ProductsWriteRepo>,
        categories: Arc<dyn CategoriesRepo>,
        cache: ProductCache,
        invalidator: CacheInvalidator,
        policy: CatalogPolicy,
    ) -> Self {
        Self {
            reader,
            writer,
            categories,
            cache,
            invalidator,
            policy,
        }
    }

    pub async fn list(&self) -> Result<Vec<ProductRecord>, CatalogError> {
        if let Some(cached) = self.cache.get_list().await {
            return Ok(cached);
        }

        let products = self.reader.list_products().await?;
        self.cache.set_list(&products, None).await;
        Ok(products)
    }

    pub async fn get(&self, id: i64) -> Result<ProductRecord, CatalogError> {
        if let Some(cached) = self.cache.get_by_id(id).await {
            return Ok(cached);
        }

        let product = self
            .reader
            .find_product(id)
            .await?
            .ok_or_else(|| CatalogError::missing(KIND, id))?;
        self.cache.set_by_id(&product, None).await;
        Ok(product)
    }

    /// Case-insensitive name search, ascending by name.
    pub async fn search(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> Result<Vec<ProductRecord>, CatalogError> {
        let query = self.policy.search_query(term, limit)?;

        if query.cacheable
            && let Some(cached) = self.cache.get_search(&query.term).await
        {
            return Ok(cached);
        }

        let products = self
            .reader
            .search_products(&query.term, query.limit)
            .await?;
        if products.is_empty() {
            return Err(CatalogError::no_matches(KIND, &query.term));
        }
        if query.cacheable {
            self.cache.set_search(&products, &query.term, None).await;
        }
        Ok(products)
    }

    /// Creates the product and its inline variants in one transaction.
    pub async fn create(&self, input: NewProduct) -> Result<ProductRecord, CatalogError> {
        let input = input.validate()?;

        self.ensure_category(input.category_id).await?;
        if self.reader.find_product_by_name(&input.name).await?.is_some() {
            return Err(CatalogError::conflict(
                KIND,
                format!("a product named `{}` already exists", input.name),
            ));
        }
        ensure_distinct_variants(&input)?;

        let params = CreateProductParams {
            name: input.name,
            description: input.description,
            price: input.price,
            sale_price: input.sale_price,
            image_url: input.image_url,
            active: input.active,
            category_id: input.category_id,
            variants: input
                .variants
                .into_iter()
                .map(|variant| NewVariantParams {
                    color: variant.color,
                    size: variant.size,
                    stock: variant.stock,
                })
                .collect(),
        };

        let writer = self.writer.clone();
        let product = retry_on_sku_collision(self.policy.sku_max_attempts, move |_| {
            let writer = writer.clone();
            let params = params.clone();
            async move { writer.create_product(params).await }
        })
        .await
        .map_err(|err| CatalogError::from_repo(KIND, err))?;

        let mut plan = InvalidationPlan::for_create(KIND);
        if !product.variants.is_empty() {
            plan = plan.merge(InvalidationPlan::for_create(ResourceKind::Variant));
        }
        self.invalidator.apply(&plan).await;
        self.cache.set_by_id(&product, None).await;

        info!(
            target = "catalog::application::products",
            product_id = product.id,
            variants = product.variants.len(),
            "Product created"
        );
        Ok(product)
    }

    pub async fn update(&self, id: i64, patch: ProductPatch) -> Result<ProductRecord, CatalogError> {
        let patch = patch.validate()?;

        let existing = self
            .reader
            .find_product(id)
            .await?
            .ok_or_else(|| CatalogError::missing(KIND, id))?;

        if let Some(category_id) = patch.category_id
            && existing.category_id() != Some(category_id)
        {
            self.ensure_category(category_id).await?;
        }

        if let Some(name) = patch.name.as_deref()
            && name != existing.name
            && let Some(other) = self.reader.find_product_by_name(name).await?
            && other.id != id
        {
            return Err(CatalogError::conflict(
                KIND,
                format!("a product named `{name}` already exists"),
            ));
        }

        let params = merge_patch(existing, patch).ok_or_else(|| {
            DomainError::validation("category_id", "product has no category; supply one")
        })?;
        let product = self
            .writer
            .update_product(params)
            .await
            .map_err(|err| CatalogError::from_repo(KIND, err))?;

        self.invalidator
            .apply(&InvalidationPlan::for_update(KIND, id))
            .await;
        self.cache.set_by_id(&product, None).await;

        info!(
            target = "catalog::application::products",
            product_id = id,
            "Product updated"
        );
        Ok(product)
    }

    /// Deletes the product together with its variants.
    pub async fn delete(&self, id: i64) -> Result<(), CatalogError> {
        if self.reader.find_product(id).await?.is_none() {
            return Err(CatalogError::missing(KIND, id));
        }

        let variant_ids = self
            .writer
            .delete_product(id)
            .await
            .map_err(|err| CatalogError::from_repo(KIND, err))?;

        let variant_count = variant_ids.len();
        let mut plan = InvalidationPlan::for_delete(KIND, id);
        if variant_count > 0 {
            plan = plan
                .listing(ResourceKind::Variant)
                .searches(ResourceKind::Variant)
                .entities(ResourceKind::Variant, variant_ids);
        }
        self.invalidator.apply(&plan).await;

        info!(
            target = "catalog::application::products",
            product_id = id,
            variants_removed = variant_count,
            "Product deleted"
        );
        Ok(())
    }

    async fn ensure_category(&self, category_id: i64) -> Result<(), CatalogError> {
        match self.categories.find_category(category_id).await? {
            Some(_) => Ok(()),
            None => Err(CatalogError::missing(ResourceKind::Category, category_id)),
        }
    }
}

/// Rejects inline variants that repeat a color and size pair.
fn ensure_distinct_variants(input: &NewProduct) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for variant in &input.variants {
        if !seen.insert((variant.color.as_str(), variant.size.as_str())) {
            return Err(CatalogError::conflict(
                ResourceKind::Variant,
                format!(
                    "variant {}/{} is listed more than once",
                    variant.color, variant.size
                ),
            ));
        }
    }
    Ok(())
}

/// Applies the fields present in `patch`; `None` when the row has no
/// category and the patch does not supply one.
fn merge_patch(existing: ProductRecord, patch: ProductPatch) -> Option<UpdateProductParams> {
    let category_id = patch.category_id.or(existing.category_id())?;
    Some(UpdateProductParams {
        id: existing.id,
        name: patch.name.unwrap_or(existing.name),
        description: patch.description.unwrap_or(existing.description),
        price: patch.price.unwrap_or(existing.price),
        sale_price: patch.sale_price.unwrap_or(existing.sale_price),
        image_url: patch.image_url.unwrap_or(existing.image_url),
        active: patch.active.unwrap_or(existing.active),
        category_id,
    })
}
