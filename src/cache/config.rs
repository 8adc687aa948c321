//! Cache configuration.
//!
//! Controls whether the cache is consulted at all, the default expiration and
//! the key namespace, via the `[cache]` table of `catalog.toml`.

use std::time::Duration;

pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// When false every read is a miss and every write a no-op.
    pub enabled: bool,
    /// Expiration applied when a caller passes no explicit TTL.
    pub default_ttl: Duration,
    /// Prepended verbatim to every key.
    pub key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_ttl: DEFAULT_TTL,
            key_prefix: String::new(),
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            default_ttl: Duration::from_secs(u64::from(settings.default_ttl_seconds.get())),
            key_prefix: settings.key_prefix.clone(),
        }
    }
}

impl CacheConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn prefixed(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.key_prefix, key)
        }
    }
}
