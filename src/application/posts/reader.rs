use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::application::pagination::{PageLimits, PageParams, PagedResult};
use crate::application::repos::{
    AnalyticsRepo, PostOrdering, PostQueryFilter, PostsRepo, PublishedFilter, RepoError,
};
use crate::cache::{ContentCaches, post_detail_key, post_list_key};
use crate::domain::entities::PostRecord;

use super::types::{AdminPostsQuery, ListPostsQuery};

/// Cache-aware read path for posts.
#[derive(Clone)]
pub struct PostReadService {
    posts: Arc<dyn PostsRepo>,
    analytics: Arc<dyn AnalyticsRepo>,
    cache: Option<ContentCaches>,
    limits: PageLimits,
}

impl PostReadService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        analytics: Arc<dyn AnalyticsRepo>,
        cache: Option<ContentCaches>,
        limits: PageLimits,
    ) -> Self {
        Self {
            posts,
            analytics,
            cache,
            limits,
        }
    }

    /// Published posts, newest first.
    pub async fn list_posts(
        &self,
        query: ListPostsQuery,
    ) -> Result<PagedResult<PostRecord>, RepoError> {
        let (filter, page) = self.public_request(query);
        self.cached_list(filter, PostOrdering::Recent, page).await
    }

    /// Published posts, most viewed first.
    pub async fn list_popular_posts(
        &self,
        query: ListPostsQuery,
    ) -> Result<PagedResult<PostRecord>, RepoError> {
        let (filter, page) = self.public_request(query);
        self.cached_list(filter, PostOrdering::Popular, page).await
    }

    /// Listing with the full filter set, including unpublished posts.
    pub async fn list_admin_posts(
        &self,
        query: AdminPostsQuery,
    ) -> Result<PagedResult<PostRecord>, RepoError> {
        let page = self.limits.params(query.page, query.page_size);
        let filter = PostQueryFilter {
            category: query.category,
            published: query.published,
            search: query.search,
            id: query.id,
        };
        self.cached_list(filter, PostOrdering::Recent, page).await
    }

    /// A published post by slug, counting a view when the store is consulted.
    ///
    /// Views are only recorded on a cache miss, so reads served from cache
    /// under-count until the entry expires. The cached record keeps the view
    /// count observed at load time.
    pub async fn post_detail(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(None);
        }

        let key = post_detail_key(slug);
        if let Some(cache) = &self.cache
            && let Some(post) = cache.post_details.get(&key)
        {
            return Ok(Some(post));
        }

        let Some(post) = self.posts.find_by_slug(slug).await? else {
            debug!(target = "application::posts::post_detail", slug, "Post not found");
            return Ok(None);
        };
        if !post.published {
            return Ok(None);
        }

        self.analytics.record_post_view(post.id).await?;

        if let Some(cache) = &self.cache {
            cache.post_details.set(key, post.clone(), None);
        }
        Ok(Some(post))
    }

    /// Uncached lookup for editing; sees unpublished posts and records no view.
    pub async fn post_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        self.posts.find_by_id(id).await
    }

    fn public_request(&self, query: ListPostsQuery) -> (PostQueryFilter, PageParams) {
        let page = self.limits.params(query.page, query.page_size);
        let filter = PostQueryFilter {
            category: query.category,
            published: PublishedFilter::Only,
            search: query.search,
            id: None,
        };
        (filter, page)
    }

    /// Serve a listing page from cache, loading and storing it on a miss.
    ///
    /// A write that lands between the load and the `set` below leaves the
    /// pre-write page cached until its TTL runs out.
    async fn cached_list(
        &self,
        filter: PostQueryFilter,
        ordering: PostOrdering,
        page: PageParams,
    ) -> Result<PagedResult<PostRecord>, RepoError> {
        let filter = filter.normalized();

        let Some(cache) = &self.cache else {
            return self.posts.list_posts(&filter, ordering, page).await;
        };

        let key = post_list_key(&filter, ordering, page);
        if let Some(result) = cache.post_lists.get(&key) {
            return Ok(result);
        }

        let result = self.posts.list_posts(&filter, ordering, page).await?;
        cache.post_lists.set(key, result.clone(), None);
        Ok(result)
    }
}
