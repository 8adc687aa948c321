//! JSON cache store over a shared backend.
//!
//! Reads never fail: backend errors and payloads that no longer match the
//! expected shape are reported as misses. Population failures are logged and
//! swallowed. Deletes surface their errors so invalidation can report them.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use super::backend::{CacheBackend, CacheBackendError};
use super::config::CacheConfig;

pub const METRIC_CACHE_ERROR: &str = "catalog_cache_error_total";

#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn default_ttl(&self) -> Duration {
        self.config.default_ttl
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.config.enabled {
            return None;
        }

        let key = self.config.prefixed(key);
        let payload = match self.backend.get(&key).await {
            Ok(Some(payload)) => payload,
            Ok(None) => return None,
            Err(err) => {
                record_error("get");
                warn!(
                    target = "catalog::cache::store",
                    key = %key,
                    error = %err,
                    "Cache read failed; treating as miss"
                );
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(value) => Some(value),
            Err(err) => {
                record_error("decode");
                warn!(
                    target = "catalog::cache::store",
                    key = %key,
                    error = %err,
                    "Cached payload has an unexpected shape; treating as miss"
                );
                None
            }
        }
    }

    /// Stores `value` under `key`, falling back to the configured TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        if !self.config.enabled {
            return;
        }

        let key = self.config.prefixed(key);
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                record_error("encode");
                warn!(
                    target = "catalog::cache::store",
                    key = %key,
                    error = %err,
                    "Failed to encode cache payload"
                );
                return;
            }
        };

        let ttl = ttl.unwrap_or(self.config.default_ttl);
        if let Err(err) = self.backend.set(&key, payload, ttl).await {
            record_error("set");
            warn!(
                target = "catalog::cache::store",
                key = %key,
                error = %err,
                "Cache population failed"
            );
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        if !self.config.enabled {
            return Ok(());
        }

        let key = self.config.prefixed(key);
        self.backend.delete(&key).await.inspect_err(|_| {
            record_error("delete");
        })
    }

    /// Removes every key matching `{resource}:{pattern_suffix}`.
    pub async fn delete_by_pattern(
        &self,
        resource: &str,
        pattern_suffix: &str,
    ) -> Result<usize, CacheBackendError> {
        if !self.config.enabled {
            return Ok(0);
        }

        let pattern = self.config.prefixed(&format!("{resource}:{pattern_suffix}"));
        let removed = self
            .backend
            .delete_pattern(&pattern)
            .await
            .inspect_err(|_| record_error("delete_pattern"))?;

        debug!(
            target = "catalog::cache::store",
            pattern = %pattern,
            removed,
            "Purged cache keys by pattern"
        );
        Ok(removed)
    }
}

fn record_error(op: &'static str) {
    counter!(METRIC_CACHE_ERROR, "op" => op).increment(1);
}
