//! Catalog cache-aside layer.
//!
//! Entries are JSON projections of store rows kept in a shared key-value
//! backend (Redis, or an in-process map for single-node runs). The store is
//! always the source of truth; every entry expires after its TTL and is purged
//! after any write that may have changed it.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! default_ttl_seconds = 600
//! key_prefix = ""
//! ```

mod backend;
mod config;
mod invalidation;
mod keys;
mod memory;
mod redis;
mod resource;
mod store;

pub use backend::{CacheBackend, CacheBackendError};
pub use config::{CacheConfig, DEFAULT_TTL};
pub use invalidation::{CacheInvalidator, CacheTarget, InvalidationPlan, InvalidationReport};
pub use keys::{
    LIST_SUFFIX, ResourceKind, SEARCH_PATTERN_SUFFIX, SEARCH_SEGMENT, make_key, make_search_key,
};
pub use memory::MemoryBackend;
pub use self::redis::RedisBackend;
pub use resource::{
    CatalogCaches, Cacheable, CategoryCache, ProductCache, ResourceCache, VariantCache,
};
pub use store::CacheStore;

/// Metric names emitted by the cache layer.
pub mod metric_names {
    pub use super::invalidation::METRIC_CACHE_INVALIDATION as CACHE_INVALIDATION;
    pub use super::resource::{METRIC_CACHE_HIT as CACHE_HIT, METRIC_CACHE_MISS as CACHE_MISS};
    pub use super::store::METRIC_CACHE_ERROR as CACHE_ERROR;
}
