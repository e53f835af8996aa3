use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, UpdatePostParams};
use crate::cache::{CacheEvent, ContentCaches};
use crate::domain::entities::PostRecord;
use crate::domain::slug::{derive_slug, generate_unique_slug_async};

use super::types::{CreatePostCommand, PostWriteError, UpdatePostCommand, ensure_non_empty};

/// Mutations on posts. Each successful write invalidates the affected cache
/// entries before returning; a failed write leaves the caches untouched.
#[derive(Clone)]
pub struct PostWriteService {
    reader: Arc<dyn PostsRepo>,
    writer: Arc<dyn PostsWriteRepo>,
    cache: Option<ContentCaches>,
}

impl PostWriteService {
    pub fn new(
        reader: Arc<dyn PostsRepo>,
        writer: Arc<dyn PostsWriteRepo>,
        cache: Option<ContentCaches>,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
        }
    }

    pub async fn create_post(
        &self,
        command: CreatePostCommand,
    ) -> Result<PostRecord, PostWriteError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.content, "content")?;
        ensure_non_empty(&command.category, "category")?;

        let reader = self.reader.clone();
        let slug = generate_unique_slug_async(&command.title, move |candidate| {
            let reader = reader.clone();
            let candidate = candidate.to_string();
            async move {
                reader
                    .find_by_slug(&candidate)
                    .await
                    .map(|existing| existing.is_none())
            }
        })
        .await?;

        let params = CreatePostParams {
            slug,
            title: command.title.trim().to_string(),
            excerpt: command.excerpt.trim().to_string(),
            content: command.content,
            category: command.category.trim().to_string(),
            published: command.published,
        };

        let post = self.writer.create_post(params).await?;

        self.invalidate(CacheEvent::PostCreated {
            slug: post.slug.clone(),
        });
        info!(
            target = "application::posts::create_post",
            post_id = %post.id,
            slug = %post.slug,
            "Post created"
        );

        Ok(post)
    }

    pub async fn update_post(
        &self,
        command: UpdatePostCommand,
    ) -> Result<PostRecord, PostWriteError> {
        ensure_non_empty(&command.title, "title")?;
        ensure_non_empty(&command.content, "content")?;
        ensure_non_empty(&command.category, "category")?;

        let existing = self
            .reader
            .find_by_id(command.id)
            .await?
            .ok_or(PostWriteError::NotFound)?;

        let slug = match command.slug.as_deref().map(str::trim) {
            Some(requested) if !requested.is_empty() => {
                derive_slug(requested).map_err(|_| PostWriteError::Validation("slug"))?
            }
            _ => existing.slug.clone(),
        };

        let params = UpdatePostParams {
            id: command.id,
            slug,
            title: command.title.trim().to_string(),
            excerpt: command.excerpt.trim().to_string(),
            content: command.content,
            category: command.category.trim().to_string(),
            published: command.published,
        };

        let post = self.writer.update_post(params).await?;

        self.invalidate(CacheEvent::PostUpdated {
            previous_slug: existing.slug,
            slug: post.slug.clone(),
        });
        info!(
            target = "application::posts::update_post",
            post_id = %post.id,
            slug = %post.slug,
            "Post updated"
        );

        Ok(post)
    }

    pub async fn delete_post(&self, id: Uuid) -> Result<PostRecord, PostWriteError> {
        let removed = self.writer.delete_post(id).await?;

        self.invalidate(CacheEvent::PostDeleted {
            slug: removed.slug.clone(),
        });
        info!(
            target = "application::posts::delete_post",
            post_id = %removed.id,
            slug = %removed.slug,
            "Post deleted"
        );

        Ok(removed)
    }

    fn invalidate(&self, event: CacheEvent) {
        if let Some(cache) = &self.cache {
            cache.invalidate(event);
        }
    }
}
