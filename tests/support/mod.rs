//! Shared fixtures: an in-memory catalog store that mirrors the Postgres
//! schema's constraints and cascades, and a cache backend that can be made
//! to fail on demand.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;

use catalog::application::catalog::{CatalogPolicy, CatalogServices};
use catalog::application::repos::{
    CategoriesRepo, CategoriesWriteRepo, CategoryCascade, CategoryUpdate, CreateCategoryParams,
    CreateProductParams, CreateVariantParams, ProductsRepo, ProductsWriteRepo, RepoError,
    StoreHealth, UpdateCategoryParams, UpdateProductParams, UpdateVariantParams, VariantsRepo,
    VariantsWriteRepo, constraints,
};
use catalog::cache::{CacheBackend, CacheBackendError, CacheConfig, CacheStore, MemoryBackend};
use catalog::domain::entities::{CategoryRecord, ProductRecord, VariantRecord};
use catalog::domain::sku::generate_sku;

#[derive(Debug, Clone)]
struct StoredProduct {
    id: i64,
    name: String,
    description: String,
    price: f64,
    sale_price: Option<f64>,
    image_url: String,
    active: bool,
    category_id: i64,
    created_at: OffsetDateTime,
    updated_at: Option<OffsetDateTime>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    categories: BTreeMap<i64, CategoryRecord>,
    products: BTreeMap<i64, StoredProduct>,
    variants: BTreeMap<i64, VariantRecord>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product_record(&self, stored: &StoredProduct) -> ProductRecord {
        ProductRecord {
            id: stored.id,
            name: stored.name.clone(),
            description: stored.description.clone(),
            price: stored.price,
            sale_price: stored.sale_price,
            image_url: stored.image_url.clone(),
            active: stored.active,
            category: self.categories.get(&stored.category_id).cloned(),
            variants: self
                .variants
                .values()
                .filter(|variant| variant.product_id == stored.id)
                .cloned()
                .collect(),
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }

    fn sku_taken(&self, sku: &str, exclude: Option<i64>) -> bool {
        self.variants
            .values()
            .any(|variant| variant.sku == sku && Some(variant.id) != exclude)
    }

    fn combination_taken(&self, product_id: i64, color: &str, size: &str, exclude: Option<i64>) -> bool {
        self.variants.values().any(|variant| {
            variant.product_id == product_id
                && variant.color == color
                && variant.size == size
                && Some(variant.id) != exclude
        })
    }
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

fn matches_term(value: &str, term: &str) -> bool {
    value.to_lowercase().contains(&term.to_lowercase())
}

/// In-memory stand-in for the Postgres adapter.
///
/// Unique constraints, foreign keys and cascades behave like the schema in
/// `migrations/`. Every trait call counts as one store round trip.
#[derive(Default)]
pub struct FakeStore {
    tables: Mutex<Tables>,
    unavailable: AtomicBool,
    outage_after_update: AtomicBool,
    calls: AtomicUsize,
    forced_sku_collisions: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every subsequent call fails as if the database went away.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The store goes away right after the next update commits.
    pub fn fail_after_next_update(&self) {
        self.outage_after_update.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The next `count` SKU inserts fail on the SKU unique constraint.
    pub fn force_sku_collisions(&self, count: usize) {
        self.forced_sku_collisions.store(count, Ordering::SeqCst);
    }

    pub async fn product_count(&self) -> usize {
        self.tables.lock().await.products.len()
    }

    pub async fn variant_count(&self) -> usize {
        self.tables.lock().await.variants.len()
    }

    fn enter(&self) -> Result<(), RepoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection refused"));
        }
        Ok(())
    }

    fn committed_update(&self) {
        if self.outage_after_update.swap(false, Ordering::SeqCst) {
            self.unavailable.store(true, Ordering::SeqCst);
        }
    }

    fn take_sku_collision(&self) -> bool {
        self.forced_sku_collisions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl CategoriesRepo for FakeStore {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.enter()?;
        Ok(self.tables.lock().await.categories.values().cloned().collect())
    }

    async fn find_category(&self, id: i64) -> Result<Option<CategoryRecord>, RepoError> {
        self.enter()?;
        Ok(self.tables.lock().await.categories.get(&id).cloned())
    }

    async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .categories
            .values()
            .find(|category| category.name == name)
            .cloned())
    }

    async fn search_categories(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<CategoryRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        let mut found: Vec<CategoryRecord> = tables
            .categories
            .values()
            .filter(|category| matches_term(&category.name, term))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl CategoriesWriteRepo for FakeStore {
    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        if tables.categories.values().any(|c| c.name == params.name) {
            return Err(duplicate(constraints::CATEGORY_NAME));
        }
        let id = tables.allocate_id();
        let record = CategoryRecord {
            id,
            name: params.name,
            logo: params.logo,
        };
        tables.categories.insert(id, record.clone());
        Ok(record)
    }

    async fn update_category(
        &self,
        params: UpdateCategoryParams,
    ) -> Result<CategoryUpdate, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        if tables
            .categories
            .values()
            .any(|c| c.name == params.name && c.id != params.id)
        {
            return Err(duplicate(constraints::CATEGORY_NAME));
        }
        let category = tables
            .categories
            .get_mut(&params.id)
            .ok_or(RepoError::NotFound)?;
        category.name = params.name;
        category.logo = params.logo;
        let category = category.clone();
        let product_ids = tables
            .products
            .values()
            .filter(|product| product.category_id == params.id)
            .map(|product| product.id)
            .collect();
        self.committed_update();
        Ok(CategoryUpdate {
            category,
            product_ids,
        })
    }

    async fn delete_category(&self, id: i64) -> Result<CategoryCascade, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        if tables.categories.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        let product_ids: Vec<i64> = tables
            .products
            .values()
            .filter(|product| product.category_id == id)
            .map(|product| product.id)
            .collect();
        let variant_ids: Vec<i64> = tables
            .variants
            .values()
            .filter(|variant| product_ids.contains(&variant.product_id))
            .map(|variant| variant.id)
            .collect();
        for product_id in &product_ids {
            tables.products.remove(product_id);
        }
        for variant_id in &variant_ids {
            tables.variants.remove(variant_id);
        }
        Ok(CategoryCascade {
            product_ids,
            variant_ids,
        })
    }
}

#[async_trait]
impl ProductsRepo for FakeStore {
    async fn list_products(&self) -> Result<Vec<ProductRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .values()
            .map(|stored| tables.product_record(stored))
            .collect())
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .get(&id)
            .map(|stored| tables.product_record(stored)))
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<ProductRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .products
            .values()
            .find(|stored| stored.name == name)
            .map(|stored| tables.product_record(stored)))
    }

    async fn search_products(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<ProductRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        let mut found: Vec<ProductRecord> = tables
            .products
            .values()
            .filter(|stored| matches_term(&stored.name, term))
            .map(|stored| tables.product_record(stored))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl ProductsWriteRepo for FakeStore {
    async fn create_product(
        &self,
        params: CreateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        if tables.products.values().any(|p| p.name == params.name) {
            return Err(duplicate(constraints::PRODUCT_NAME));
        }
        if !tables.categories.contains_key(&params.category_id) {
            return Err(RepoError::InvalidInput {
                message: "products_category_id_fkey".to_string(),
            });
        }
        if !params.variants.is_empty() && self.take_sku_collision() {
            return Err(duplicate(constraints::VARIANT_SKU));
        }

        let now = OffsetDateTime::now_utc();
        let product_id = tables.allocate_id();
        tables.products.insert(
            product_id,
            StoredProduct {
                id: product_id,
                name: params.name,
                description: params.description,
                price: params.price,
                sale_price: params.sale_price,
                image_url: params.image_url,
                active: params.active,
                category_id: params.category_id,
                created_at: now,
                updated_at: None,
            },
        );
        for variant in params.variants {
            let id = tables.allocate_id();
            tables.variants.insert(
                id,
                VariantRecord {
                    id,
                    sku: generate_sku(product_id, &variant.color, &variant.size),
                    color: variant.color,
                    size: variant.size,
                    stock: variant.stock,
                    product_id,
                    created_at: now,
                    updated_at: None,
                },
            );
        }

        let stored = tables
            .products
            .get(&product_id)
            .cloned()
            .ok_or(RepoError::NotFound)?;
        Ok(tables.product_record(&stored))
    }

    async fn update_product(
        &self,
        params: UpdateProductParams,
    ) -> Result<ProductRecord, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        if tables
            .products
            .values()
            .any(|p| p.name == params.name && p.id != params.id)
        {
            return Err(duplicate(constraints::PRODUCT_NAME));
        }
        let stored = tables
            .products
            .get_mut(&params.id)
            .ok_or(RepoError::NotFound)?;
        stored.name = params.name;
        stored.description = params.description;
        stored.price = params.price;
        stored.sale_price = params.sale_price;
        stored.image_url = params.image_url;
        stored.active = params.active;
        stored.category_id = params.category_id;
        stored.updated_at = Some(OffsetDateTime::now_utc());
        let stored = stored.clone();
        self.committed_update();
        Ok(tables.product_record(&stored))
    }

    async fn delete_product(&self, id: i64) -> Result<Vec<i64>, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        if tables.products.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }
        let variant_ids: Vec<i64> = tables
            .variants
            .values()
            .filter(|variant| variant.product_id == id)
            .map(|variant| variant.id)
            .collect();
        for variant_id in &variant_ids {
            tables.variants.remove(variant_id);
        }
        Ok(variant_ids)
    }
}

#[async_trait]
impl VariantsRepo for FakeStore {
    async fn list_variants(&self) -> Result<Vec<VariantRecord>, RepoError> {
        self.enter()?;
        Ok(self.tables.lock().await.variants.values().cloned().collect())
    }

    async fn find_variant(&self, id: i64) -> Result<Option<VariantRecord>, RepoError> {
        self.enter()?;
        Ok(self.tables.lock().await.variants.get(&id).cloned())
    }

    async fn find_variant_by_combination(
        &self,
        product_id: i64,
        color: &str,
        size: &str,
    ) -> Result<Option<VariantRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .variants
            .values()
            .find(|v| v.product_id == product_id && v.color == color && v.size == size)
            .cloned())
    }

    async fn search_variants(
        &self,
        term: &str,
        limit: u32,
    ) -> Result<Vec<VariantRecord>, RepoError> {
        self.enter()?;
        let tables = self.tables.lock().await;
        let mut found: Vec<VariantRecord> = tables
            .variants
            .values()
            .filter(|variant| matches_term(&variant.sku, term))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.sku.cmp(&b.sku));
        found.truncate(limit as usize);
        Ok(found)
    }
}

#[async_trait]
impl VariantsWriteRepo for FakeStore {
    async fn create_variant(
        &self,
        params: CreateVariantParams,
    ) -> Result<VariantRecord, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        if !tables.products.contains_key(&params.product_id) {
            return Err(RepoError::InvalidInput {
                message: "variants_product_id_fkey".to_string(),
            });
        }
        if self.take_sku_collision() || tables.sku_taken(&params.sku, None) {
            return Err(duplicate(constraints::VARIANT_SKU));
        }
        if tables.combination_taken(params.product_id, &params.color, &params.size, None) {
            return Err(duplicate(constraints::VARIANT_COMBINATION));
        }
        let id = tables.allocate_id();
        let record = VariantRecord {
            id,
            color: params.color,
            size: params.size,
            stock: params.stock,
            sku: params.sku,
            product_id: params.product_id,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        tables.variants.insert(id, record.clone());
        Ok(record)
    }

    async fn update_variant(
        &self,
        params: UpdateVariantParams,
    ) -> Result<VariantRecord, RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        let product_id = tables
            .variants
            .get(&params.id)
            .map(|variant| variant.product_id)
            .ok_or(RepoError::NotFound)?;
        if tables.sku_taken(&params.sku, Some(params.id)) {
            return Err(duplicate(constraints::VARIANT_SKU));
        }
        if tables.combination_taken(product_id, &params.color, &params.size, Some(params.id)) {
            return Err(duplicate(constraints::VARIANT_COMBINATION));
        }
        let variant = tables
            .variants
            .get_mut(&params.id)
            .ok_or(RepoError::NotFound)?;
        variant.color = params.color;
        variant.size = params.size;
        variant.stock = params.stock;
        variant.sku = params.sku;
        variant.updated_at = Some(OffsetDateTime::now_utc());
        Ok(variant.clone())
    }

    async fn delete_variant(&self, id: i64) -> Result<(), RepoError> {
        self.enter()?;
        let mut tables = self.tables.lock().await;
        tables
            .variants
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl StoreHealth for FakeStore {
    async fn ping(&self) -> Result<(), RepoError> {
        self.enter()
    }
}

/// Memory backend whose every command can be made to fail.
#[derive(Default)]
pub struct FlakyBackend {
    inner: MemoryBackend,
    failing: AtomicBool,
}

impl FlakyBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    fn check(&self) -> Result<(), CacheBackendError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CacheBackendError::unavailable("connection reset by peer"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for FlakyBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheBackendError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheBackendError> {
        self.check()?;
        self.inner.delete_pattern(pattern).await
    }
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub cache: Arc<FlakyBackend>,
    pub catalog: CatalogServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let store = FakeStore::new();
        let cache = FlakyBackend::new();
        let cache_store = CacheStore::new(cache.clone(), config);
        let catalog =
            CatalogServices::from_repositories(store.clone(), cache_store, CatalogPolicy::default());
        Self {
            store,
            cache,
            catalog,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
