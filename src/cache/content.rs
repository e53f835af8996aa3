use std::sync::Arc;

use tracing::info;

use super::config::CacheConfig;
use super::scheduler::Scheduler;
use super::store::TtlCache;
use crate::application::pagination::PagedResult;
use crate::domain::entities::{CategoryRecord, PostRecord};

/// The cache instances shared by the read and write services.
///
/// Built once at startup and handed to each service; clones share entries.
#[derive(Clone)]
pub struct ContentCaches {
    pub post_lists: TtlCache<PagedResult<PostRecord>>,
    pub post_details: TtlCache<PostRecord>,
    pub categories: TtlCache<Vec<CategoryRecord>>,
}

impl ContentCaches {
    pub fn new(config: &CacheConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            post_lists: TtlCache::bounded(
                "post_lists",
                config.list_ttl(),
                config.list_capacity_non_zero(),
                scheduler.clone(),
            ),
            post_details: TtlCache::new("post_details", config.detail_ttl(), scheduler.clone()),
            categories: TtlCache::new("categories", config.category_ttl(), scheduler),
        }
    }

    /// `None` when caching is switched off, so services fall through to the repositories.
    pub fn from_config(config: &CacheConfig, scheduler: Arc<dyn Scheduler>) -> Option<Self> {
        if !config.enabled {
            info!(target = "finblog::cache", "Content caches disabled by configuration");
            return None;
        }
        Some(Self::new(config, scheduler))
    }

    /// Drop every cached value and cancel all pending expiry timers.
    pub fn flush_all(&self) {
        self.post_lists.flush();
        self.post_details.flush();
        self.categories.flush();
    }

    /// Live entries across all instances.
    pub fn entry_count(&self) -> usize {
        self.post_lists.size() + self.post_details.size() + self.categories.size()
    }
}
