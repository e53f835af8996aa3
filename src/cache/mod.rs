//! finblog content cache.
//!
//! In-process TTL caches in front of the post and category read paths:
//!
//! - **post_lists**: one entry per listing page and filter combination
//! - **post_details**: one entry per slug
//! - **categories**: the full category list
//!
//! Writes invalidate synchronously through [`ContentCaches::invalidate`].
//! Each process owns its caches; nothing is shared across processes.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! list_ttl_secs = 300
//! detail_ttl_secs = 600
//! list_capacity = 512
//! ```

mod config;
mod content;
mod invalidation;
mod keys;
mod lock;
mod scheduler;
mod store;

pub use config::CacheConfig;
pub use content::ContentCaches;
pub use invalidation::{CacheEvent, InvalidationPlan};
pub use keys::{CATEGORY_LIST_KEY, ContentKey, post_detail_key, post_list_key};
pub use scheduler::{ManualScheduler, Scheduler, TimerHandle, TimerTask, TokioScheduler};
pub use store::TtlCache;

pub(crate) use store::{
    METRIC_CACHE_EVICTED, METRIC_CACHE_EXPIRED, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATED,
    METRIC_CACHE_MISS,
};
