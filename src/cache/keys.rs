//! Cache key definitions.
//!
//! Keys are derived deterministically from the read parameters. String
//! components are rendered with `Debug` quoting so that distinct parameter sets
//! can never collide (e.g. a category literally named `all` versus no category).

use std::fmt;

use crate::application::pagination::PageParams;
use crate::application::repos::{PostOrdering, PostQueryFilter, PublishedFilter};

/// Key of the single cached category listing.
pub const CATEGORY_LIST_KEY: &str = "categories:all";

/// Identifies one cached value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKey<'a> {
    /// One page of a filtered post listing.
    PostList {
        filter: &'a PostQueryFilter,
        ordering: PostOrdering,
        page: PageParams,
    },
    /// A single post looked up by slug.
    PostBySlug(&'a str),
    /// All categories.
    CategoryList,
}

impl fmt::Display for ContentKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKey::PostList {
                filter,
                ordering,
                page,
            } => {
                let prefix = match ordering {
                    PostOrdering::Recent => "posts:list",
                    PostOrdering::Popular => "posts:popular",
                };
                write!(f, "{prefix}:{}:{}:", page.page, page.page_size)?;
                match filter.category.as_deref() {
                    Some(category) => write!(f, "{category:?}")?,
                    None => f.write_str("all")?,
                }
                f.write_str(":")?;
                match filter.search.as_deref() {
                    Some(search) => write!(f, "{search:?}")?,
                    None => f.write_str("none")?,
                }
                let published = match filter.published {
                    PublishedFilter::Only => "published",
                    PublishedFilter::Hidden => "draft",
                    PublishedFilter::Any => "any",
                };
                write!(f, ":{published}:")?;
                match filter.id {
                    Some(id) => write!(f, "{id}"),
                    None => f.write_str("any"),
                }
            }
            ContentKey::PostBySlug(slug) => write!(f, "post:{slug:?}"),
            ContentKey::CategoryList => f.write_str(CATEGORY_LIST_KEY),
        }
    }
}

/// Cache key for one page of a post listing.
pub fn post_list_key(filter: &PostQueryFilter, ordering: PostOrdering, page: PageParams) -> String {
    ContentKey::PostList {
        filter,
        ordering,
        page,
    }
    .to_string()
}

/// Cache key for a single post.
pub fn post_detail_key(slug: &str) -> String {
    ContentKey::PostBySlug(slug).to_string()
}
