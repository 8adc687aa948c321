//! Process-local backend.
//!
//! Mirrors the Redis semantics the catalog relies on (TTL, glob deletes) so a
//! single instance can run without an external cache.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::backend::{CacheBackend, CacheBackendError};

struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Entry>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let now = Instant::now();
        self.entries
            .get(key)
            .map(|entry| entry.is_live(now))
            .unwrap_or(false)
    }

    /// Live keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_live(now))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError> {
        let now = Instant::now();
        let value = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
            Some(_) => None,
            None => return Ok(None),
        };
        // Expired: drop it lazily. The read guard is released above.
        self.entries
            .remove_if(key, |_, entry| !entry.is_live(Instant::now()));
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheBackendError> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheBackendError> {
        let now = Instant::now();
        let mut removed = 0;
        self.entries.retain(|key, entry| {
            if glob_match(pattern, key) {
                if entry.is_live(now) {
                    removed += 1;
                }
                false
            } else {
                true
            }
        });
        Ok(removed)
    }
}

/// Redis-style glob supporting `*` and `?`.
pub(crate) fn glob_match(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let candidate: Vec<char> = candidate.chars().collect();

    let (mut p, mut c) = (0, 0);
    let mut star: Option<usize> = None;
    let mut resume = 0;

    while c < candidate.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == candidate[c]) {
            p += 1;
            c += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            resume = c;
            p += 1;
        } else if let Some(star_at) = star {
            p = star_at + 1;
            resume += 1;
            c = resume;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}
