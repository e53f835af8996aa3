//! Category listing and maintenance.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CategoriesRepo, CreateCategoryParams, RepoError};
use crate::cache::{CATEGORY_LIST_KEY, CacheEvent, ContentCaches};
use crate::domain::entities::CategoryRecord;
use crate::domain::slug::{SlugAsyncError, SlugError, generate_unique_slug_async};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("`{0}` is missing or invalid")]
    Validation(&'static str),
    #[error("category not found")]
    NotFound,
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for CategoryError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound => Self::NotFound,
            other => Self::Repo(other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateCategoryCommand {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct CategoryService {
    repo: Arc<dyn CategoriesRepo>,
    cache: Option<ContentCaches>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoriesRepo>, cache: Option<ContentCaches>) -> Self {
        Self { repo, cache }
    }

    pub async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        if let Some(cache) = &self.cache
            && let Some(categories) = cache.categories.get(CATEGORY_LIST_KEY)
        {
            return Ok(categories);
        }

        let categories = self.repo.list_categories().await?;
        if let Some(cache) = &self.cache {
            cache
                .categories
                .set(CATEGORY_LIST_KEY, categories.clone(), None);
        }
        Ok(categories)
    }

    pub async fn create_category(
        &self,
        command: CreateCategoryCommand,
    ) -> Result<CategoryRecord, CategoryError> {
        let name = command.name.trim();
        if name.is_empty() {
            return Err(CategoryError::Validation("name"));
        }

        let repo = self.repo.clone();
        let slug = generate_unique_slug_async(name, move |candidate| {
            let repo = repo.clone();
            let candidate = candidate.to_string();
            async move {
                repo.find_category_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await
        .map_err(|err| match err {
            SlugAsyncError::Slug(SlugError::Exhausted { .. }) => CategoryError::Validation("slug"),
            SlugAsyncError::Slug(_) => CategoryError::Validation("name"),
            SlugAsyncError::Predicate(err) => CategoryError::from(err),
        })?;

        let description = command
            .description
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let category = self
            .repo
            .create_category(CreateCategoryParams {
                slug,
                name: name.to_string(),
                description,
            })
            .await?;

        self.invalidate(CacheEvent::CategoryCreated {
            slug: category.slug.clone(),
        });
        info!(
            target = "application::categories::create_category",
            category_id = %category.id,
            slug = %category.slug,
            "Category created"
        );

        Ok(category)
    }

    pub async fn delete_category(&self, id: Uuid) -> Result<CategoryRecord, CategoryError> {
        let removed = self.repo.delete_category(id).await?;

        self.invalidate(CacheEvent::CategoryDeleted {
            slug: removed.slug.clone(),
        });
        info!(
            target = "application::categories::delete_category",
            category_id = %removed.id,
            slug = %removed.slug,
            "Category deleted"
        );

        Ok(removed)
    }

    fn invalidate(&self, event: CacheEvent) {
        if let Some(cache) = &self.cache {
            cache.invalidate(event);
        }
    }
}
