use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::application::pagination::{PageParams, PagedResult};
use crate::application::repos::{
    AnalyticsRepo, PostOrdering, PostQueryFilter, PostsRepo, RepoError,
};
use crate::domain::entities::PostRecord;
use crate::infra::db::{PostgresRepositories, map_sqlx_error};
use crate::infra::telemetry::METRIC_POST_LIST_QUERY_MS;

use super::SELECT_POSTS;
use super::query::{PostFilterClauses, build_count_query, build_page_query};
use super::types::PostRow;

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        ordering: PostOrdering,
        page: PageParams,
    ) -> Result<PagedResult<PostRecord>, RepoError> {
        let clauses = PostFilterClauses::from_filter(filter);
        let mut page_query = build_page_query(&clauses, ordering, page);
        let mut count_query = build_count_query(&clauses);

        let started = Instant::now();
        let (rows, total) = tokio::try_join!(
            page_query
                .build_query_as::<PostRow>()
                .fetch_all(self.pool()),
            count_query
                .build_query_scalar::<i64>()
                .fetch_one(self.pool()),
        )
        .map_err(map_sqlx_error)?;
        histogram!(METRIC_POST_LIST_QUERY_MS).record(started.elapsed().as_secs_f64() * 1000.0);

        debug!(
            target = "infra::db::posts::list_posts",
            filters = clauses.len(),
            page = page.page,
            page_size = page.page_size,
            total,
            "Listed posts"
        );

        let total = u64::try_from(total).unwrap_or_default();
        let items = rows.into_iter().map(PostRecord::from).collect();
        Ok(PagedResult::new(items, total, page))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_POSTS);
        qb.push(" WHERE p.slug = ");
        qb.push_bind(slug.to_string());

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PostRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_POSTS);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);

        let row = qb
            .build_query_as::<PostRow>()
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl AnalyticsRepo for PostgresRepositories {
    async fn record_post_view(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            debug!(
                target = "infra::db::posts::record_post_view",
                post_id = %id,
                "View not recorded; post no longer exists"
            );
        }
        Ok(())
    }
}
