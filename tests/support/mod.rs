//! In-memory repositories shared by the integration tests.
//!
//! Filtering, ordering and pagination follow the Postgres adapter so cache
//! behaviour can be exercised without a database.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use finblog::application::categories::CategoryService;
use finblog::application::pagination::{PageLimits, PageParams, PagedResult};
use finblog::application::posts::{PostReadService, PostWriteService};
use finblog::application::repos::{
    AnalyticsRepo, CategoriesRepo, CreateCategoryParams, CreatePostParams, PostOrdering,
    PostQueryFilter, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use finblog::cache::{CacheConfig, ContentCaches, ManualScheduler};
use finblog::domain::entities::{CategoryRecord, PostRecord};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryStore {
    posts: Mutex<Vec<PostRecord>>,
    categories: Mutex<Vec<CategoryRecord>>,
    clock: AtomicUsize,
    fail_writes: AtomicBool,
    list_calls: AtomicUsize,
    slug_lookups: AtomicUsize,
    category_list_calls: AtomicUsize,
    views_recorded: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Insert a post directly, bypassing services and caches.
    pub fn seed_post(&self, slug: &str, category: &str, published: bool) -> PostRecord {
        let at = self.tick();
        let post = PostRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: format!("Title of {slug}"),
            excerpt: format!("Excerpt of {slug}"),
            content: format!("Body of {slug}"),
            category: category.to_string(),
            published,
            view_count: 0,
            created_at: at,
            updated_at: at,
        };
        lock(&self.posts).push(post.clone());
        post
    }

    pub fn seed_category(&self, slug: &str, name: &str) -> CategoryRecord {
        let category = CategoryRecord {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            name: name.to_string(),
            description: None,
            created_at: self.tick(),
        };
        lock(&self.categories).push(category.clone());
        category
    }

    pub fn set_view_count(&self, slug: &str, views: i64) {
        if let Some(post) = lock(&self.posts).iter_mut().find(|post| post.slug == slug) {
            post.view_count = views;
        }
    }

    pub fn view_count(&self, slug: &str) -> Option<i64> {
        lock(&self.posts)
            .iter()
            .find(|post| post.slug == slug)
            .map(|post| post.view_count)
    }

    /// Make every subsequent write fail as if the database were unreachable.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn slug_lookups(&self) -> usize {
        self.slug_lookups.load(Ordering::SeqCst)
    }

    pub fn category_list_calls(&self) -> usize {
        self.category_list_calls.load(Ordering::SeqCst)
    }

    pub fn views_recorded(&self) -> usize {
        self.views_recorded.load(Ordering::SeqCst)
    }

    fn tick(&self) -> OffsetDateTime {
        let step = self.clock.fetch_add(1, Ordering::SeqCst) as i64;
        OffsetDateTime::UNIX_EPOCH + time::Duration::hours(1_000) + time::Duration::seconds(step)
    }

    fn check_writable(&self) -> Result<(), RepoError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection refused"));
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn matches(filter: &PostQueryFilter, post: &PostRecord) -> bool {
    if let Some(category) = &filter.category
        && &post.category != category
    {
        return false;
    }
    if let Some(published) = filter.published.as_bool()
        && post.published != published
    {
        return false;
    }
    if let Some(id) = filter.id
        && post.id != id
    {
        return false;
    }
    if let Some(search) = &filter.search {
        let needle = search.to_lowercase();
        let hit = [&post.title, &post.excerpt, &post.content]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    true
}

#[async_trait]
impl PostsRepo for MemoryStore {
    async fn list_posts(
        &self,
        filter: &PostQueryFilter,
        ordering: PostOrdering,
        page: PageParams,
    ) -> Result<PagedResult<PostRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let mut matched: Vec<PostRecord> = lock(&self.posts)
            .iter()
            .filter(|post| matches(filter, post))
            .cloned()
            .collect();

        match ordering {
            PostOrdering::Recent => matched.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.id.cmp(&a.id))
            }),
            PostOrdering::Popular => matched.sort_by(|a, b| {
                b.view_count
                    .cmp(&a.view_count)
                    .then_with(|| b.created_at.cmp(&a.created_at))
                    .then_with(|| b.id.cmp(&a.id))
            }),
        }

        let total = matched.len() as u64;
        let items = matched
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();

        Ok(PagedResult::new(items, total, page))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<PostRecord>, RepoError> {
        self.slug_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(lock(&self.posts)
            .iter()
            .find(|post| post.slug == slug)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        Ok(lock(&self.posts).iter().find(|post| post.id == id).cloned())
    }
}

#[async_trait]
impl PostsWriteRepo for MemoryStore {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        self.check_writable()?;
        let at = self.tick();
        let mut posts = lock(&self.posts);
        if posts.iter().any(|post| post.slug == params.slug) {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }

        let post = PostRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            title: params.title,
            excerpt: params.excerpt,
            content: params.content,
            category: params.category,
            published: params.published,
            view_count: 0,
            created_at: at,
            updated_at: at,
        };
        posts.push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        self.check_writable()?;
        let at = self.tick();
        let mut posts = lock(&self.posts);
        if posts
            .iter()
            .any(|post| post.slug == params.slug && post.id != params.id)
        {
            return Err(RepoError::Duplicate {
                constraint: "posts_slug_key".to_string(),
            });
        }

        let post = posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.slug = params.slug;
        post.title = params.title;
        post.excerpt = params.excerpt;
        post.content = params.content;
        post.category = params.category;
        post.published = params.published;
        post.updated_at = at;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> Result<PostRecord, RepoError> {
        self.check_writable()?;
        let mut posts = lock(&self.posts);
        let index = posts
            .iter()
            .position(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        Ok(posts.remove(index))
    }
}

#[async_trait]
impl AnalyticsRepo for MemoryStore {
    async fn record_post_view(&self, id: Uuid) -> Result<(), RepoError> {
        self.views_recorded.fetch_add(1, Ordering::SeqCst);
        if let Some(post) = lock(&self.posts).iter_mut().find(|post| post.id == id) {
            post.view_count += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl CategoriesRepo for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<CategoryRecord>, RepoError> {
        self.category_list_calls.fetch_add(1, Ordering::SeqCst);
        let mut categories = lock(&self.categories).clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<CategoryRecord>, RepoError> {
        Ok(lock(&self.categories)
            .iter()
            .find(|category| category.slug == slug)
            .cloned())
    }

    async fn create_category(
        &self,
        params: CreateCategoryParams,
    ) -> Result<CategoryRecord, RepoError> {
        self.check_writable()?;
        let category = CategoryRecord {
            id: Uuid::new_v4(),
            slug: params.slug,
            name: params.name,
            description: params.description,
            created_at: self.tick(),
        };
        lock(&self.categories).push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> Result<CategoryRecord, RepoError> {
        self.check_writable()?;
        let mut categories = lock(&self.categories);
        let index = categories
            .iter()
            .position(|category| category.id == id)
            .ok_or(RepoError::NotFound)?;
        Ok(categories.remove(index))
    }
}

/// Services wired to one store, sharing one set of caches on a manual clock.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: ManualScheduler,
    pub caches: ContentCaches,
    pub reader: PostReadService,
    pub writer: PostWriteService,
    pub categories: CategoryService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let store = MemoryStore::new();
        let clock = ManualScheduler::new();
        let caches = ContentCaches::new(&config, Arc::new(clock.clone()));
        Self::assemble(store, clock, caches)
    }

    /// Same store, no caches; the reference for what a cold read returns.
    pub fn uncached_reader(&self) -> PostReadService {
        PostReadService::new(self.store.clone(), self.store.clone(), None, PageLimits::default())
    }

    fn assemble(store: Arc<MemoryStore>, clock: ManualScheduler, caches: ContentCaches) -> Self {
        let reader = PostReadService::new(
            store.clone(),
            store.clone(),
            Some(caches.clone()),
            PageLimits::default(),
        );
        let writer = PostWriteService::new(store.clone(), store.clone(), Some(caches.clone()));
        let categories = CategoryService::new(store.clone(), Some(caches.clone()));
        Self {
            store,
            clock,
            caches,
            reader,
            writer,
            categories,
        }
    }
}
