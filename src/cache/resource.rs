//! Typed caches for each catalog resource.
//!
//! Every kind caches three shapes: the full listing, single entities by id and
//! search results by lowercased term. Search results with no rows are never
//! stored so a freshly inserted match is visible on the next search.

use std::marker::PhantomData;
use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::domain::entities::{CategoryRecord, ProductRecord, VariantRecord};

use super::keys::ResourceKind;
use super::store::CacheStore;

pub const METRIC_CACHE_HIT: &str = "catalog_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "catalog_cache_miss_total";

/// An output representation that can live in the cache.
pub trait Cacheable: Serialize + DeserializeOwned + Send + Sync {
    const KIND: ResourceKind;

    fn cache_id(&self) -> i64;
}

impl Cacheable for CategoryRecord {
    const KIND: ResourceKind = ResourceKind::Category;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl Cacheable for ProductRecord {
    const KIND: ResourceKind = ResourceKind::Product;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

impl Cacheable for VariantRecord {
    const KIND: ResourceKind = ResourceKind::Variant;

    fn cache_id(&self) -> i64 {
        self.id
    }
}

pub struct ResourceCache<T> {
    store: CacheStore,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

pub type CategoryCache = ResourceCache<CategoryRecord>;
pub type ProductCache = ResourceCache<ProductRecord>;
pub type VariantCache = ResourceCache<VariantRecord>;

impl<T: Cacheable> ResourceCache<T> {
    pub fn new(store: CacheStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub async fn get_list(&self) -> Option<Vec<T>> {
        let value = self.store.get(&T::KIND.list_key()).await;
        record_lookup(T::KIND, "list", value.is_some());
        value
    }

    pub async fn set_list(&self, items: &[T], ttl: Option<Duration>) {
        self.store.set(&T::KIND.list_key(), items, ttl).await;
    }

    pub async fn get_by_id(&self, id: i64) -> Option<T> {
        let value = self.store.get(&T::KIND.entity_key(id)).await;
        record_lookup(T::KIND, "entity", value.is_some());
        value
    }

    pub async fn set_by_id(&self, entity: &T, ttl: Option<Duration>) {
        self.store
            .set(&T::KIND.entity_key(entity.cache_id()), entity, ttl)
            .await;
    }

    pub async fn get_search(&self, term: &str) -> Option<Vec<T>> {
        let value = self.store.get(&T::KIND.search_key(term)).await;
        record_lookup(T::KIND, "search", value.is_some());
        value
    }

    pub async fn set_search(&self, items: &[T], term: &str, ttl: Option<Duration>) {
        if items.is_empty() {
            debug!(
                target = "catalog::cache::resource",
                resource = T::KIND.collection(),
                term,
                "Skipping cache population for empty search result"
            );
            return;
        }
        self.store.set(&T::KIND.search_key(term), items, ttl).await;
    }
}

fn record_lookup(kind: ResourceKind, scope: &'static str, hit: bool) {
    let name = if hit {
        METRIC_CACHE_HIT
    } else {
        METRIC_CACHE_MISS
    };
    counter!(name, "resource" => kind.collection(), "scope" => scope).increment(1);
}

/// One typed cache per resource kind over the same store.
#[derive(Clone)]
pub struct CatalogCaches {
    pub categories: CategoryCache,
    pub products: ProductCache,
    pub variants: VariantCache,
}

impl CatalogCaches {
    pub fn new(store: CacheStore) -> Self {
        Self {
            categories: ResourceCache::new(store.clone()),
            products: ResourceCache::new(store.clone()),
            variants: ResourceCache::new(store),
        }
    }
}
