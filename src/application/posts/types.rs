use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{PublishedFilter, RepoError};
use crate::domain::slug::{SlugAsyncError, SlugError};

#[derive(Debug, Error)]
pub enum PostWriteError {
    #[error("`{0}` is missing or invalid")]
    Validation(&'static str),
    #[error("post not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for PostWriteError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

impl From<SlugAsyncError<RepoError>> for PostWriteError {
    fn from(err: SlugAsyncError<RepoError>) -> Self {
        match err {
            SlugAsyncError::Slug(SlugError::EmptyInput | SlugError::Unrepresentable { .. }) => {
                Self::Validation("title")
            }
            SlugAsyncError::Slug(SlugError::Exhausted { .. }) => Self::Validation("slug"),
            SlugAsyncError::Predicate(err) => Self::from(err),
        }
    }
}

/// Public listing request as received from a caller; normalized by the reader.
#[derive(Debug, Clone, Default)]
pub struct ListPostsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// Administrative listing; unlike [`ListPostsQuery`] it can see unpublished posts.
#[derive(Debug, Clone, Default)]
pub struct AdminPostsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub published: PublishedFilter,
    pub id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct CreatePostCommand {
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub published: bool,
}

#[derive(Debug, Clone)]
pub struct UpdatePostCommand {
    pub id: Uuid,
    /// New slug; the current one is kept when `None`.
    pub slug: Option<String>,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    pub published: bool,
}

pub fn ensure_non_empty(value: &str, field: &'static str) -> Result<(), PostWriteError> {
    if value.trim().is_empty() {
        return Err(PostWriteError::Validation(field));
    }
    Ok(())
}
