use std::sync::Arc;

use tracing::info;

use crate::application::catalog::CatalogPolicy;
use crate::application::error::CatalogError;
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CategoryUpdate, CreateCategoryParams,
    UpdateCategoryParams,
};
use crate::cache::{CacheInvalidator, CategoryCache, InvalidationPlan, ResourceKind};
use crate::domain::commands::{CategoryPatch, NewCategory};
use crate::domain::entities::CategoryRecord;

const KIND: ResourceKind = ResourceKind::Category;

#[derive(Clone)]
pub struct CategoryService {
    reader: Arc<dyn CategoriesRepo>,
    writer: Arc<dyn CategoriesWriteRepo>,
    cache: CategoryCache,
    invalidator: CacheInvalidator,
    policy: CatalogPolicy,
}

impl CategoryService {
    pub fn new(
        reader: Arc<dyn CategoriesRepo>,
        writer: Arc<dyn CategoriesWriteRepo>,
        cache: CategoryCache,
        invalidator: CacheInvalidator,
        policy: CatalogPolicy,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            invalidator,
            policy,
        }
    }

    pub async fn list(&self) -> Result<Vec<CategoryRecord>, CatalogError> {
        if let Some(cached) = self.cache.get_list().await {
            return Ok(cached);
        }

        let categories = self.reader.list_categories().await?;
        self.cache.set_list(&categories, None).await;
        Ok(categories)
    }

    pub async fn get(&self, id: i64) -> Result<CategoryRecord, CatalogError> {
        if let Some(cached) = self.cache.get_by_id(id).await {
            return Ok(cached);
        }

        let category = self
            .reader
            .find_category(id)
            .await?
            .ok_or_else(|| CatalogError::missing(KIND, id))?;
        self.cache.set_by_id(&category, None).await;
        Ok(category)
    }

    /// Case-insensitive name search, ascending by name.
    pub async fn search(
        &self,
        term: &str,
        limit: Option<u32>,
    ) -> Result<Vec<CategoryRecord>, CatalogError> {
        let query = self.policy.search_query(term, limit)?;

        if query.cacheable
            && let Some(cached) = self.cache.get_search(&query.term).await
        {
            return Ok(cached);
        }

        let categories = self
            .reader
            .search_categories(&query.term, query.limit)
            .await?;
        if categories.is_empty() {
            return Err(CatalogError::no_matches(KIND, &query.term));
        }
        if query.cacheable {
            self.cache.set_search(&categories, &query.term, None).await;
        }
        Ok(categories)
    }

    pub async fn create(&self, input: NewCategory) -> Result<CategoryRecord, CatalogError> {
        let input = input.validate()?;

        if self
            .reader
            .find_category_by_name(&input.name)
            .await?
            .is_some()
        {
            return Err(CatalogError::conflict(
                KIND,
                format!("a category named `{}` already exists", input.name),
            ));
        }

        let category = self
            .writer
            .create_category(CreateCategoryParams {
                name: input.name,
                logo: input.logo,
            })
            .await
            .map_err(|err| CatalogError::from_repo(KIND, err))?;

        self.invalidator
            .apply(&InvalidationPlan::for_create(KIND))
            .await;
        self.cache.set_by_id(&category, None).await;

        info!(
            target = "catalog::application::categories",
            category_id = category.id,
            "Category created"
        );
        Ok(category)
    }

    pub async fn update(
        &self,
        id: i64,
        patch: CategoryPatch,
    ) -> Result<CategoryRecord, CatalogError> {
        let patch = patch.validate()?;

        let existing = self
            .reader
            .find_category(id)
            .await?
            .ok_or_else(|| CatalogError::missing(KIND, id))?;

        if let Some(name) = patch.name.as_deref()
            && name != existing.name
            && let Some(other) = self.reader.find_category_by_name(name).await?
            && other.id != id
        {
            return Err(CatalogError::conflict(
                KIND,
                format!("a category named `{name}` already exists"),
            ));
        }

        let params = merge_patch(existing, patch);
        let CategoryUpdate {
            category,
            product_ids,
        } = self
            .writer
            .update_category(params)
            .await
            .map_err(|err| CatalogError::from_repo(KIND, err))?;

        // Products embed their category, so their entries go stale too.
        let plan = InvalidationPlan::for_update(KIND, id).merge(products_plan(product_ids));
        self.invalidator.apply(&plan).await;
        self.cache.set_by_id(&category, None).await;

        info!(
            target = "catalog::application::categories",
            category_id = id,
            "Category updated"
        );
        Ok(category)
    }

    /// Deletes the category together with its products and their variants.
    pub async fn delete(&self, id: i64) -> Result<(), CatalogError> {
        if self.reader.find_category(id).await?.is_none() {
            return Err(CatalogError::missing(KIND, id));
        }

        let cascade = self
            .writer
            .delete_category(id)
            .await
            .map_err(|err| CatalogError::from_repo(KIND, err))?;

        let product_count = cascade.product_ids.len();
        let variant_count = cascade.variant_ids.len();
        let mut plan = InvalidationPlan::for_delete(KIND, id).merge(products_plan(cascade.product_ids));
        if variant_count > 0 {
            plan = plan
                .listing(ResourceKind::Variant)
                .searches(ResourceKind::Variant)
                .entities(ResourceKind::Variant, cascade.variant_ids);
        }
        self.invalidator.apply(&plan).await;

        info!(
            target = "catalog::application::categories",
            category_id = id,
            products_removed = product_count,
            variants_removed = variant_count,
            "Category deleted"
        );
        Ok(())
    }
}

fn merge_patch(existing: CategoryRecord, patch: CategoryPatch) -> UpdateCategoryParams {
    UpdateCategoryParams {
        id: existing.id,
        name: patch.name.unwrap_or(existing.name),
        logo: patch.logo.unwrap_or(existing.logo),
    }
}

/// Product listing and searches, plus the entries of the given products.
fn products_plan(product_ids: Vec<i64>) -> InvalidationPlan {
    InvalidationPlan::new()
        .listing(ResourceKind::Product)
        .searches(ResourceKind::Product)
        .entities(ResourceKind::Product, product_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_unpatched_fields() {
        let existing = CategoryRecord {
            id: 4,
            name: "Shirts".to_string(),
            logo: "shirts.svg".to_string(),
        };
        let params = merge_patch(
            existing,
            CategoryPatch {
                logo: Some("tees.svg".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(params.id, 4);
        assert_eq!(params.name, "Shirts");
        assert_eq!(params.logo, "tees.svg");
    }
}
