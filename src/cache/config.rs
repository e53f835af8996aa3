//! Cache configuration.
//!
//! Controls the content caches via `finblog.toml`:
//!
//! ```toml
//! [cache]
//! enabled = true
//! list_ttl_secs = 300
//! detail_ttl_secs = 600
//! category_ttl_secs = 600
//! list_capacity = 512
//! ```

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_LIST_TTL_SECS: u64 = 300;
const DEFAULT_DETAIL_TTL_SECS: u64 = 600;
const DEFAULT_CATEGORY_TTL_SECS: u64 = 600;
const DEFAULT_LIST_CAPACITY: usize = 512;

/// TTL classes for each cache instance plus the global switch.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve reads from the in-process caches.
    pub enabled: bool,
    /// Lifetime of a cached post listing page.
    pub list_ttl_secs: u64,
    /// Lifetime of a cached single post.
    pub detail_ttl_secs: u64,
    /// Lifetime of the cached category list.
    pub category_ttl_secs: u64,
    /// Maximum number of cached listing pages; least recently used go first.
    pub list_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            list_ttl_secs: DEFAULT_LIST_TTL_SECS,
            detail_ttl_secs: DEFAULT_DETAIL_TTL_SECS,
            category_ttl_secs: DEFAULT_CATEGORY_TTL_SECS,
            list_capacity: DEFAULT_LIST_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            list_ttl_secs: settings.list_ttl.as_secs(),
            detail_ttl_secs: settings.detail_ttl.as_secs(),
            category_ttl_secs: settings.category_ttl.as_secs(),
            list_capacity: settings.list_capacity.get(),
        }
    }
}

impl CacheConfig {
    pub fn list_ttl(&self) -> Duration {
        Duration::from_secs(self.list_ttl_secs)
    }

    pub fn detail_ttl(&self) -> Duration {
        Duration::from_secs(self.detail_ttl_secs)
    }

    pub fn category_ttl(&self) -> Duration {
        Duration::from_secs(self.category_ttl_secs)
    }

    /// Listing page limit as `NonZeroUsize`, clamping to 1 if zero.
    pub fn list_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.list_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
