use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreatePostParams, PostsWriteRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};

use super::types::PostRow;

const INSERT_POST: &str = concat!(
    "INSERT INTO posts AS p \
     (id, slug, title, excerpt, content, category, published, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) \
     RETURNING ",
    post_columns!()
);

const UPDATE_POST: &str = concat!(
    "UPDATE posts AS p \
     SET slug = $2, title = $3, excerpt = $4, content = $5, category = $6, \
         published = $7, updated_at = $8 \
     WHERE p.id = $1 \
     RETURNING ",
    post_columns!()
);

const DELETE_POST: &str = concat!(
    "DELETE FROM posts AS p WHERE p.id = $1 RETURNING ",
    post_columns!()
);

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            slug,
            title,
            excerpt,
            content,
            category,
            published,
        } = params;

        let row = sqlx::query_as::<_, PostRow>(INSERT_POST)
            .bind(Uuid::new_v4())
            .bind(slug)
            .bind(title)
            .bind(excerpt)
            .bind(content)
            .bind(category)
            .bind(published)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        let UpdatePostParams {
            id,
            slug,
            title,
            excerpt,
            content,
            category,
            published,
        } = params;

        let row = sqlx::query_as::<_, PostRow>(UPDATE_POST)
            .bind(id)
            .bind(slug)
            .bind(title)
            .bind(excerpt)
            .bind(content)
            .bind(category)
            .bind(published)
            .bind(OffsetDateTime::now_utc())
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: Uuid) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(DELETE_POST)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?
            .ok_or(RepoError::NotFound)?;

        Ok(PostRecord::from(row))
    }
}
