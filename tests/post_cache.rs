mod support;

use std::time::Duration;

use finblog::application::categories::CreateCategoryCommand;
use finblog::application::posts::{
    AdminPostsQuery, CreatePostCommand, ListPostsQuery, PostWriteError, UpdatePostCommand,
};
use finblog::application::repos::PublishedFilter;
use finblog::cache::{CacheConfig, post_detail_key};

use support::Harness;

fn page(page: i64) -> ListPostsQuery {
    ListPostsQuery {
        page: Some(page),
        ..Default::default()
    }
}

fn new_post(title: &str, category: &str) -> CreatePostCommand {
    CreatePostCommand {
        title: title.to_string(),
        excerpt: String::new(),
        content: format!("{title} body"),
        category: category.to_string(),
        published: true,
    }
}

fn seed_markets(harness: &Harness, count: usize) {
    for n in 1..=count {
        harness
            .store
            .seed_post(&format!("markets-{n:02}"), "markets", true);
    }
}

#[tokio::test]
async fn warm_reads_match_cold_reads() {
    let harness = Harness::new();
    seed_markets(&harness, 7);
    for n in 1..=5 {
        harness
            .store
            .seed_post(&format!("crypto-{n:02}"), "crypto", n % 2 == 0);
    }
    harness.store.set_view_count("markets-03", 40);
    harness.store.set_view_count("crypto-02", 90);

    let queries = [
        ListPostsQuery::default(),
        ListPostsQuery {
            category: Some("crypto".into()),
            ..Default::default()
        },
        ListPostsQuery {
            search: Some("MARKETS-0".into()),
            page_size: Some(3),
            page: Some(2),
            ..Default::default()
        },
        ListPostsQuery {
            page: Some(0),
            page_size: Some(1_000),
            ..Default::default()
        },
    ];

    let cold = harness.uncached_reader();
    for query in queries {
        let first = harness.reader.list_posts(query.clone()).await.expect("first read");
        let warm = harness.reader.list_posts(query.clone()).await.expect("warm read");
        let reference = cold.list_posts(query.clone()).await.expect("cold read");
        assert_eq!(first, reference);
        assert_eq!(warm, reference);

        let popular = harness
            .reader
            .list_popular_posts(query.clone())
            .await
            .expect("popular read");
        let popular_warm = harness
            .reader
            .list_popular_posts(query.clone())
            .await
            .expect("popular warm read");
        assert_eq!(popular, popular_warm);
        assert_eq!(popular, cold.list_popular_posts(query).await.expect("cold popular"));
    }

    harness.caches.flush_all();
    let after_flush = harness
        .reader
        .list_posts(ListPostsQuery::default())
        .await
        .expect("read after flush");
    assert_eq!(
        after_flush,
        cold.list_posts(ListPostsQuery::default()).await.expect("cold read")
    );
}

#[tokio::test]
async fn repeated_list_is_served_from_cache() {
    let harness = Harness::new();
    seed_markets(&harness, 3);

    harness.reader.list_posts(page(1)).await.expect("first read");
    harness.reader.list_posts(page(1)).await.expect("second read");
    assert_eq!(harness.store.list_calls(), 1);

    // Whitespace-only filters share the unfiltered entry.
    harness
        .reader
        .list_posts(ListPostsQuery {
            page: Some(1),
            category: Some("   ".into()),
            search: Some(String::new()),
            ..Default::default()
        })
        .await
        .expect("blank filters");
    assert_eq!(harness.store.list_calls(), 1);

    harness
        .reader
        .list_popular_posts(page(1))
        .await
        .expect("popular read");
    assert_eq!(harness.store.list_calls(), 2);
}

#[tokio::test]
async fn new_post_shows_up_on_cached_pages() {
    let harness = Harness::new();
    seed_markets(&harness, 12);

    let first = harness.reader.list_posts(page(1)).await.expect("page 1");
    let second = harness.reader.list_posts(page(2)).await.expect("page 2");
    assert_eq!(first.items.len(), 9);
    assert_eq!(first.total_count, 12);
    assert_eq!(first.total_pages, 2);
    assert_eq!(second.items.len(), 3);

    let created = harness
        .writer
        .create_post(new_post("Rate cut odds climb", "markets"))
        .await
        .expect("create post");
    assert_eq!(created.slug, "rate-cut-odds-climb");
    assert_eq!(harness.caches.post_lists.size(), 0);

    let first = harness.reader.list_posts(page(1)).await.expect("page 1");
    let second = harness.reader.list_posts(page(2)).await.expect("page 2");
    assert_eq!(first.total_count, 13);
    assert_eq!(first.total_pages, 2);
    assert_eq!(first.items[0].id, created.id);
    assert_eq!(second.items.len(), 4);

    let third = harness.reader.list_posts(page(3)).await.expect("page 3");
    assert!(third.items.is_empty());
    assert_eq!(third.total_count, 13);
    assert_eq!(third.total_pages, 2);
    assert!(!third.has_next());
}

#[tokio::test]
async fn duplicate_titles_get_suffixed_slugs() {
    let harness = Harness::new();

    let first = harness
        .writer
        .create_post(new_post("Weekly wrap", "markets"))
        .await
        .expect("first post");
    let second = harness
        .writer
        .create_post(new_post("Weekly wrap", "markets"))
        .await
        .expect("second post");

    assert_eq!(first.slug, "weekly-wrap");
    assert_eq!(second.slug, "weekly-wrap-2");
}

#[tokio::test]
async fn blank_title_is_rejected_before_any_write() {
    let harness = Harness::new();
    harness.reader.list_posts(page(1)).await.expect("warm list");

    let err = harness
        .writer
        .create_post(new_post("   ", "markets"))
        .await
        .expect_err("blank title");
    assert!(matches!(err, PostWriteError::Validation("title")));
    assert_eq!(harness.caches.post_lists.size(), 1);
}

#[tokio::test]
async fn detail_counts_a_view_only_on_miss() {
    let harness = Harness::new();
    harness.store.seed_post("cpi-preview", "macro", true);

    let first = harness
        .reader
        .post_detail("cpi-preview")
        .await
        .expect("first read")
        .expect("post exists");
    let second = harness
        .reader
        .post_detail("  cpi-preview ")
        .await
        .expect("second read")
        .expect("post exists");

    assert_eq!(first, second);
    assert_eq!(harness.store.views_recorded(), 1);
    assert_eq!(harness.store.view_count("cpi-preview"), Some(1));

    harness.clock.advance(Duration::from_secs(600));
    assert!(!harness.caches.post_details.has(&post_detail_key("cpi-preview")));

    harness
        .reader
        .post_detail("cpi-preview")
        .await
        .expect("read after expiry")
        .expect("post exists");
    assert_eq!(harness.store.views_recorded(), 2);
}

#[tokio::test]
async fn uncached_detail_reads_count_every_view() {
    let harness = Harness::new();
    harness.store.seed_post("cpi-preview", "macro", true);
    let reader = harness.uncached_reader();

    for attempt in ["first read", "second read"] {
        reader
            .post_detail("cpi-preview")
            .await
            .expect(attempt)
            .expect("post exists");
    }

    assert_eq!(harness.store.views_recorded(), 2);
    assert_eq!(harness.store.view_count("cpi-preview"), Some(2));
    assert_eq!(harness.store.slug_lookups(), 2);
    assert!(harness.caches.post_details.is_empty());
}

#[tokio::test]
async fn missing_and_unpublished_posts_are_not_cached() {
    let harness = Harness::new();
    harness.store.seed_post("draft-note", "macro", false);

    for _ in 0..2 {
        assert!(
            harness
                .reader
                .post_detail("no-such-post")
                .await
                .expect("lookup")
                .is_none()
        );
        assert!(
            harness
                .reader
                .post_detail("draft-note")
                .await
                .expect("lookup")
                .is_none()
        );
    }

    assert_eq!(harness.store.slug_lookups(), 4);
    assert_eq!(harness.store.views_recorded(), 0);
    assert!(harness.caches.post_details.is_empty());
    assert!(harness.reader.post_detail("   ").await.expect("blank").is_none());
    assert_eq!(harness.store.slug_lookups(), 4);
}

#[tokio::test]
async fn failed_write_keeps_cached_entries() {
    let harness = Harness::new();
    seed_markets(&harness, 2);
    let before = harness.reader.list_posts(page(1)).await.expect("warm list");

    harness.store.fail_writes(true);
    let err = harness
        .writer
        .create_post(new_post("Bond rout", "markets"))
        .await
        .expect_err("write fails");
    assert!(matches!(err, PostWriteError::Repo(ref repo) if repo.is_unavailable()));

    let after = harness.reader.list_posts(page(1)).await.expect("cached list");
    assert_eq!(before, after);
    assert_eq!(harness.store.list_calls(), 1);
}

#[tokio::test]
async fn update_drops_old_and_new_detail_entries() {
    let harness = Harness::new();
    let seeded = harness.store.seed_post("old-slug", "markets", true);
    harness
        .reader
        .post_detail("old-slug")
        .await
        .expect("warm detail");
    harness.reader.list_posts(page(1)).await.expect("warm list");

    let updated = harness
        .writer
        .update_post(UpdatePostCommand {
            id: seeded.id,
            slug: Some("New Slug".into()),
            title: "Renamed".into(),
            excerpt: seeded.excerpt.clone(),
            content: seeded.content.clone(),
            category: seeded.category.clone(),
            published: true,
        })
        .await
        .expect("update");

    assert_eq!(updated.slug, "new-slug");
    assert!(harness.caches.post_details.is_empty());
    assert!(harness.caches.post_lists.is_empty());
    assert!(
        harness
            .reader
            .post_detail("old-slug")
            .await
            .expect("old slug lookup")
            .is_none()
    );
    let fresh = harness
        .reader
        .post_detail("new-slug")
        .await
        .expect("new slug lookup")
        .expect("post exists");
    assert_eq!(fresh.title, "Renamed");
}

#[tokio::test]
async fn update_of_missing_post_is_not_found() {
    let harness = Harness::new();

    let err = harness
        .writer
        .update_post(UpdatePostCommand {
            id: uuid::Uuid::new_v4(),
            slug: None,
            title: "Title".into(),
            excerpt: String::new(),
            content: "Body".into(),
            category: "markets".into(),
            published: true,
        })
        .await
        .expect_err("missing post");
    assert!(matches!(err, PostWriteError::NotFound));
}

#[tokio::test]
async fn delete_removes_post_from_cached_reads() {
    let harness = Harness::new();
    let doomed = harness.store.seed_post("doomed", "markets", true);
    harness.store.seed_post("survivor", "markets", true);

    harness.reader.post_detail("doomed").await.expect("warm detail");
    let before = harness.reader.list_posts(page(1)).await.expect("warm list");
    assert_eq!(before.total_count, 2);

    let removed = harness.writer.delete_post(doomed.id).await.expect("delete");
    assert_eq!(removed.slug, "doomed");

    assert!(harness.reader.post_detail("doomed").await.expect("lookup").is_none());
    let after = harness.reader.list_posts(page(1)).await.expect("list");
    assert_eq!(after.total_count, 1);
    assert_eq!(after.items[0].slug, "survivor");

    let err = harness
        .writer
        .delete_post(doomed.id)
        .await
        .expect_err("second delete");
    assert!(matches!(err, PostWriteError::NotFound));
}

#[tokio::test]
async fn list_entries_expire_after_their_ttl() {
    let harness = Harness::with_config(CacheConfig {
        list_ttl_secs: 30,
        ..Default::default()
    });
    seed_markets(&harness, 1);

    harness.reader.list_posts(page(1)).await.expect("warm list");
    harness.clock.advance(Duration::from_secs(29));
    harness.reader.list_posts(page(1)).await.expect("cached list");
    assert_eq!(harness.store.list_calls(), 1);

    harness.clock.advance(Duration::from_secs(1));
    assert_eq!(harness.clock.pending_timers(), 0);
    harness.reader.list_posts(page(1)).await.expect("reloaded list");
    assert_eq!(harness.store.list_calls(), 2);
}

#[tokio::test]
async fn admin_listing_sees_drafts_and_filters_by_id() {
    let harness = Harness::new();
    harness.store.seed_post("live", "markets", true);
    let draft = harness.store.seed_post("draft", "markets", false);

    let public = harness.reader.list_posts(page(1)).await.expect("public list");
    assert_eq!(public.total_count, 1);

    let drafts = harness
        .reader
        .list_admin_posts(AdminPostsQuery {
            published: PublishedFilter::Hidden,
            ..Default::default()
        })
        .await
        .expect("draft list");
    assert_eq!(drafts.total_count, 1);
    assert_eq!(drafts.items[0].id, draft.id);

    let everything = harness
        .reader
        .list_admin_posts(AdminPostsQuery::default())
        .await
        .expect("all posts");
    assert_eq!(everything.total_count, 2);

    let by_id = harness
        .reader
        .list_admin_posts(AdminPostsQuery {
            id: Some(draft.id),
            ..Default::default()
        })
        .await
        .expect("by id");
    assert_eq!(by_id.items, vec![draft]);
}

#[tokio::test]
async fn category_list_is_cached_until_a_category_changes() {
    let harness = Harness::new();
    harness.store.seed_category("markets", "Markets");

    let first = harness.categories.list_categories().await.expect("list");
    let second = harness.categories.list_categories().await.expect("list");
    assert_eq!(first, second);
    assert_eq!(harness.store.category_list_calls(), 1);

    let created = harness
        .categories
        .create_category(CreateCategoryCommand {
            name: "Personal Finance".into(),
            description: Some("  ".into()),
        })
        .await
        .expect("create category");
    assert_eq!(created.slug, "personal-finance");
    assert_eq!(created.description, None);

    let refreshed = harness.categories.list_categories().await.expect("list");
    assert_eq!(harness.store.category_list_calls(), 2);
    assert_eq!(refreshed.len(), 2);

    harness.store.seed_post("budgeting", "personal-finance", true);
    harness.reader.list_posts(page(1)).await.expect("warm list");
    harness
        .categories
        .delete_category(created.id)
        .await
        .expect("delete category");
    assert!(harness.caches.post_lists.is_empty());
    assert!(harness.caches.categories.is_empty());
}

#[tokio::test]
async fn disabled_caches_always_reach_the_store() {
    let harness = Harness::new();
    seed_markets(&harness, 2);
    let reader = harness.uncached_reader();

    reader.list_posts(page(1)).await.expect("first read");
    reader.list_posts(page(1)).await.expect("second read");
    assert_eq!(harness.store.list_calls(), 2);
    assert!(harness.caches.post_lists.is_empty());
}
