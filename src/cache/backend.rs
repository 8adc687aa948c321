//! Key-value backends with per-entry expiration.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheBackendError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache command `{command}` failed: {message}")]
    Command {
        command: &'static str,
        message: String,
    },
}

impl CacheBackendError {
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::Unavailable(err.to_string())
    }

    pub fn command(command: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Command {
            command,
            message: err.to_string(),
        }
    }
}

/// Shared external cache. Values are opaque text payloads.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Returns `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError>;

    /// Overwrites unconditionally and refreshes the expiration.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheBackendError>;

    /// No-op when the key is absent.
    async fn delete(&self, key: &str) -> Result<(), CacheBackendError>;

    /// Deletes every key matching the glob `pattern` in one batch and returns
    /// how many were removed. Zero matches is not an error.
    async fn delete_pattern(&self, pattern: &str) -> Result<usize, CacheBackendError>;
}
