//! Wiring and shared policy for the catalog services.

use std::num::NonZeroU32;
use std::sync::Arc;

use crate::application::categories::CategoryService;
use crate::application::products::ProductService;
use crate::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, ProductsRepo, ProductsWriteRepo, VariantsRepo,
    VariantsWriteRepo,
};
use crate::application::variants::VariantService;
use crate::cache::{CacheInvalidator, CacheStore, CatalogCaches};
use crate::domain::error::DomainError;

pub const DEFAULT_SEARCH_LIMIT: NonZeroU32 = non_zero(20);
pub const DEFAULT_SEARCH_LIMIT_MAX: NonZeroU32 = non_zero(100);
pub const DEFAULT_SKU_MAX_ATTEMPTS: NonZeroU32 = non_zero(5);

const fn non_zero(value: u32) -> NonZeroU32 {
    match NonZeroU32::new(value) {
        Some(value) => value,
        None => panic!("policy defaults must be non-zero"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogPolicy {
    pub search_limit_default: NonZeroU32,
    pub search_limit_max: NonZeroU32,
    pub sku_max_attempts: NonZeroU32,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            search_limit_default: DEFAULT_SEARCH_LIMIT,
            search_limit_max: DEFAULT_SEARCH_LIMIT_MAX,
            sku_max_attempts: DEFAULT_SKU_MAX_ATTEMPTS,
        }
    }
}

impl From<&crate::config::CatalogSettings> for CatalogPolicy {
    fn from(settings: &crate::config::CatalogSettings) -> Self {
        Self {
            search_limit_default: settings.search_limit_default,
            search_limit_max: settings.search_limit_max,
            sku_max_attempts: settings.sku_max_attempts,
        }
    }
}

/// A normalized search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub limit: u32,
    /// Only default-limit searches share the cached entry for a term.
    pub cacheable: bool,
}

impl CatalogPolicy {
    pub fn search_query(&self, term: &str, limit: Option<u32>) -> Result<SearchQuery, DomainError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(DomainError::validation("q", "search term must not be empty"));
        }

        let default = self.search_limit_default.get();
        let limit = limit
            .unwrap_or(default)
            .clamp(1, self.search_limit_max.get().max(default));

        Ok(SearchQuery {
            term: term.to_string(),
            limit,
            cacheable: limit == default,
        })
    }
}

/// The three catalog services sharing one cache store.
#[derive(Clone)]
pub struct CatalogServices {
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub variants: Arc<VariantService>,
}

impl CatalogServices {
    pub fn from_repositories<R>(repos: Arc<R>, store: CacheStore, policy: CatalogPolicy) -> Self
    where
        R: CategoriesRepo
            + CategoriesWriteRepo
            + ProductsRepo
            + ProductsWriteRepo
            + VariantsRepo
            + VariantsWriteRepo
            + 'static,
    {
        let caches = CatalogCaches::new(store.clone());
        let invalidator = CacheInvalidator::new(store);

        let categories_read: Arc<dyn CategoriesRepo> = repos.clone();
        let categories_write: Arc<dyn CategoriesWriteRepo> = repos.clone();
        let products_read: Arc<dyn ProductsRepo> = repos.clone();
        let products_write: Arc<dyn ProductsWriteRepo> = repos.clone();
        let variants_read: Arc<dyn VariantsRepo> = repos.clone();
        let variants_write: Arc<dyn VariantsWriteRepo> = repos;

        let categories = Arc::new(CategoryService::new(
            categories_read.clone(),
            categories_write,
            caches.categories.clone(),
            invalidator.clone(),
            policy,
        ));
        let products = Arc::new(ProductService::new(
            products_read.clone(),
            products_write,
            categories_read,
            caches.products.clone(),
            invalidator.clone(),
            policy,
        ));
        let variants = Arc::new(VariantService::new(
            variants_read,
            variants_write,
            products_read,
            caches.variants,
            invalidator,
            policy,
        ));

        Self {
            categories,
            products,
            variants,
        }
    }
}
