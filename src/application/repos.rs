//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{PageParams, PagedResult};
use crate::domain::entities::{CategoryRecord, PostRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    /// True when the store could not be reached or did not answer in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Timeout)
    }
}

/// Tri-state filter on the `published` flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PublishedFilter {
    /// Published posts only.
    Only,
    /// Unpublished posts only.
    Hidden,
    /// No constraint.
    #[default]
    Any,
}

impl PublishedFilter {
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Only => Some(true),
            Self::Hidden => Some(false),
            Self::Any => None,
        }
    }
}

/// Optional constraints on a post listing, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PostQueryFilter {
    pub category: Option<String>,
    pub published: PublishedFilter,
    /// Case-insensitive substring matched against title, excerpt and content.
    pub search: Option<String>,
    pub id: Option<Uuid>,
}

impl PostQueryFilter {
    /// Trim text filters and treat blank ones as absent.
    pub fn normalized(self) -> Self {
        Self {
            category: non_blank(self.category),
            search: non_blank(self.search),
            ..self
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PostOrdering {
    /// Newest first.
    #[default]
    Recent,
    /// Most viewed first, newest breaking ties.
    Popular,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct CreateCategoryParams {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// One page of posts matching `filter` together with the total match count.
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        ordering: PostOrdering,
        page: PageParams,
    ) -> Result<PagedResult<PostRecord>, RepoError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError>;

    /// Remove a post, returning the deleted row.
    async fn delete_post(&self, id: Uuid) -> Result<PostRecord, RepoError>;
}

#[async_trait]
pub trait AnalyticsRepo: Send + Sync {
    async fn record_post_view(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError>;

    async fn find_category_by_slug(&self, slug: &str)
    -> Result<Option<CategoryRecord>, RepoError>;

    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError>;

    async fn delete_category(&self, id: Uuid) -> Result<CategoryRecord, RepoError>;
}
