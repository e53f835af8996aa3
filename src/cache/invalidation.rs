//! Write-path invalidation.
//!
//! Every successful mutation is described as a [`CacheEvent`]. Events are
//! merged into an [`InvalidationPlan`] naming exactly which cache entries may
//! contain the changed data, and the plan is applied before the write returns.

use std::collections::BTreeSet;
use std::fmt;

use tracing::info;

use super::content::ContentCaches;
use super::keys::{CATEGORY_LIST_KEY, post_detail_key};

/// A committed change to stored content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    PostCreated { slug: String },
    PostUpdated { previous_slug: String, slug: String },
    PostDeleted { slug: String },
    CategoryCreated { slug: String },
    CategoryDeleted { slug: String },
}

/// Cache entries to drop for a batch of events.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    /// Any listing page may contain a changed post, so the whole list cache goes.
    pub flush_post_lists: bool,
    /// Detail keys for every slug a change touched.
    pub post_detail_keys: BTreeSet<String>,
    pub flush_categories: bool,
}

impl fmt::Display for InvalidationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InvalidationPlan {{ flush_post_lists: {}, post_details: {}, flush_categories: {} }}",
            self.flush_post_lists,
            self.post_detail_keys.len(),
            self.flush_categories,
        )
    }
}

impl InvalidationPlan {
    pub fn from_events(events: impl IntoIterator<Item = CacheEvent>) -> Self {
        let mut plan = Self::default();

        for event in events {
            match event {
                CacheEvent::PostCreated { slug } | CacheEvent::PostDeleted { slug } => {
                    plan.flush_post_lists = true;
                    plan.post_detail_keys.insert(post_detail_key(&slug));
                }
                CacheEvent::PostUpdated {
                    previous_slug,
                    slug,
                } => {
                    plan.flush_post_lists = true;
                    plan.post_detail_keys.insert(post_detail_key(&previous_slug));
                    plan.post_detail_keys.insert(post_detail_key(&slug));
                }
                CacheEvent::CategoryCreated { .. } => {
                    plan.flush_categories = true;
                }
                CacheEvent::CategoryDeleted { .. } => {
                    plan.flush_categories = true;
                    plan.flush_post_lists = true;
                }
            }
        }

        plan
    }

    pub fn is_empty(&self) -> bool {
        !self.flush_post_lists && self.post_detail_keys.is_empty() && !self.flush_categories
    }
}

impl ContentCaches {
    /// Drop every entry `event` may have made stale.
    pub fn invalidate(&self, event: CacheEvent) {
        let plan = InvalidationPlan::from_events([event]);
        self.apply(&plan);
    }

    pub fn apply(&self, plan: &InvalidationPlan) {
        if plan.is_empty() {
            return;
        }

        if plan.flush_post_lists {
            self.post_lists.flush();
        }
        for key in &plan.post_detail_keys {
            self.post_details.delete(key);
        }
        if plan.flush_categories {
            self.categories.delete(CATEGORY_LIST_KEY);
        }

        info!(target = "finblog::cache", %plan, "Applied cache invalidation");
    }
}
