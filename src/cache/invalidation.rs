//! Post-write cache purging.
//!
//! A write builds an [`InvalidationPlan`] naming every entry its mutation may
//! have made stale, then hands it to [`CacheInvalidator::apply`] after the
//! store commit. Failures are logged and counted but never fail the write;
//! the TTL bounds how long a missed purge can be observed.

use metrics::counter;
use tracing::{debug, warn};

use super::keys::{ResourceKind, SEARCH_PATTERN_SUFFIX};
use super::store::CacheStore;

pub const METRIC_CACHE_INVALIDATION: &str = "catalog_cache_invalidation_total";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTarget {
    List(ResourceKind),
    Entity(ResourceKind, i64),
    Searches(ResourceKind),
}

impl CacheTarget {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::List(kind) | Self::Entity(kind, _) | Self::Searches(kind) => *kind,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvalidationPlan {
    targets: Vec<CacheTarget>,
}

impl InvalidationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listing and search entries of `kind`. Creates touch nothing else.
    pub fn for_create(kind: ResourceKind) -> Self {
        Self::new().listing(kind).searches(kind)
    }

    /// Listing, search and the single entry for `id`.
    pub fn for_update(kind: ResourceKind, id: i64) -> Self {
        Self::new().listing(kind).entity(kind, id).searches(kind)
    }

    pub fn for_delete(kind: ResourceKind, id: i64) -> Self {
        Self::for_update(kind, id)
    }

    pub fn listing(self, kind: ResourceKind) -> Self {
        self.push(CacheTarget::List(kind))
    }

    pub fn entity(self, kind: ResourceKind, id: i64) -> Self {
        self.push(CacheTarget::Entity(kind, id))
    }

    pub fn entities(self, kind: ResourceKind, ids: impl IntoIterator<Item = i64>) -> Self {
        ids.into_iter()
            .fold(self, |plan, id| plan.entity(kind, id))
    }

    pub fn searches(self, kind: ResourceKind) -> Self {
        self.push(CacheTarget::Searches(kind))
    }

    /// Appends the targets of `other` not already planned.
    pub fn merge(self, other: InvalidationPlan) -> Self {
        other.targets.into_iter().fold(self, Self::push)
    }

    pub fn targets(&self) -> &[CacheTarget] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    fn push(mut self, target: CacheTarget) -> Self {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
        self
    }
}

/// Outcome of applying a plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationReport {
    pub purged_targets: usize,
    pub failed_targets: usize,
}

#[derive(Clone)]
pub struct CacheInvalidator {
    store: CacheStore,
}

impl CacheInvalidator {
    pub fn new(store: CacheStore) -> Self {
        Self { store }
    }

    pub async fn apply(&self, plan: &InvalidationPlan) -> InvalidationReport {
        let mut report = InvalidationReport::default();

        for target in plan.targets() {
            let result = match target {
                CacheTarget::List(kind) => self.store.delete(&kind.list_key()).await,
                CacheTarget::Entity(kind, id) => self.store.delete(&kind.entity_key(*id)).await,
                CacheTarget::Searches(kind) => self
                    .store
                    .delete_by_pattern(kind.collection(), SEARCH_PATTERN_SUFFIX)
                    .await
                    .map(|_| ()),
            };

            match result {
                Ok(()) => {
                    report.purged_targets += 1;
                    counter!(METRIC_CACHE_INVALIDATION, "resource" => target.kind().collection())
                        .increment(1);
                }
                Err(err) => {
                    report.failed_targets += 1;
                    warn!(
                        target = "catalog::cache::invalidation",
                        cache_target = ?target,
                        error = %err,
                        "Cache invalidation failed; entry stays until its TTL expires"
                    );
                }
            }
        }

        debug!(
            target = "catalog::cache::invalidation",
            purged = report.purged_targets,
            failed = report.failed_targets,
            "Applied cache invalidation plan"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::cache::backend::CacheBackend;
    use crate::cache::config::CacheConfig;
    use crate::cache::memory::MemoryBackend;

    const TTL: Duration = Duration::from_secs(60);

    #[test]
    fn plans_deduplicate_targets() {
        let plan = InvalidationPlan::for_update(ResourceKind::Product, 4)
            .merge(InvalidationPlan::for_create(ResourceKind::Product))
            .entities(ResourceKind::Product, [4, 5]);

        assert_eq!(
            plan.targets(),
            &[
                CacheTarget::List(ResourceKind::Product),
                CacheTarget::Entity(ResourceKind::Product, 4),
                CacheTarget::Searches(ResourceKind::Product),
                CacheTarget::Entity(ResourceKind::Product, 5),
            ]
        );
    }

    #[test]
    fn create_plan_leaves_entities_alone() {
        let plan = InvalidationPlan::for_create(ResourceKind::Variant);
        assert!(
            !plan
                .targets()
                .iter()
                .any(|target| matches!(target, CacheTarget::Entity(..)))
        );
    }

    #[tokio::test]
    async fn apply_purges_listing_entity_and_searches_only() {
        let backend = Arc::new(MemoryBackend::new());
        for key in [
            "products:all",
            "product:1",
            "product:2",
            "products:search:tee",
            "products:search:shirt",
            "categories:all",
        ] {
            backend.set(key, "[]".to_string(), TTL).await.unwrap();
        }

        let invalidator =
            CacheInvalidator::new(CacheStore::new(backend.clone(), CacheConfig::default()));
        let report = invalidator
            .apply(&InvalidationPlan::for_delete(ResourceKind::Product, 1))
            .await;

        assert_eq!(
            report,
            InvalidationReport {
                purged_targets: 3,
                failed_targets: 0
            }
        );
        assert_eq!(
            backend.keys(),
            vec!["categories:all".to_string(), "product:2".to_string()]
        );
    }
}
