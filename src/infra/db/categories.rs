use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CategoriesRepo, CreateCategoryParams, RepoError},
    domain::entities::CategoryRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    slug: String,
    name: String,
    description: Option<String>,
    created_at: OffsetDateTime,
}

impl From<CategoryRow> for CategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug, name, description, created_at FROM categories ORDER BY name, id",
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(CategoryRecord::from).collect())
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, slug, name, description, created_at FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(CategoryRecord::from))
    }

    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "INSERT INTO categories (id, slug, name, description, created_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id, slug, name, description, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(params.slug)
        .bind(params.name)
        .bind(params.description)
        .bind(OffsetDateTime::now_utc())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CategoryRecord::from(row))
    }

    async fn delete_category(&self, id: Uuid) -> Result<CategoryRecord, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "DELETE FROM categories WHERE id = $1 \
             RETURNING id, slug, name, description, created_at",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?
        .ok_or(RepoError::NotFound)?;

        Ok(CategoryRecord::from(row))
    }
}
