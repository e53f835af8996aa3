use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{categories::CategoryError, posts::PostWriteError, repos::RepoError},
    infra::error::InfraError,
};

/// Message of `error` followed by the messages of each of its sources.
pub fn error_chain(error: &dyn StdError) -> Vec<String> {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        messages.push(inner.to_string());
        current = inner.source();
    }
    messages
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(RepoError),
    #[error("resource not found")]
    NotFound,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// The failure came from a dependency rather than the request.
    pub fn is_unavailable(&self) -> bool {
        match self {
            AppError::Infra(InfraError::Database { .. }) => true,
            AppError::Repo(err) => err.is_unavailable(),
            _ => false,
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => AppError::NotFound,
            other => AppError::Repo(other),
        }
    }
}

impl From<PostWriteError> for AppError {
    fn from(err: PostWriteError) -> Self {
        match err {
            PostWriteError::Validation(field) => {
                AppError::validation(format!("`{field}` is missing or invalid"))
            }
            PostWriteError::NotFound => AppError::NotFound,
            PostWriteError::Repo(err) => AppError::from(err),
        }
    }
}

impl From<CategoryError> for AppError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::Validation(field) => {
                AppError::validation(format!("`{field}` is missing or invalid"))
            }
            CategoryError::NotFound => AppError::NotFound,
            CategoryError::Repo(err) => AppError::from(err),
        }
    }
}
