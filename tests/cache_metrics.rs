use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use finblog::cache::{ManualScheduler, TtlCache};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};

/// Counter totals keyed by `(metric name, cache label)`.
fn counters(snapshotter: &Snapshotter) -> HashMap<(String, String), u64> {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| {
            let DebugValue::Counter(count) = value else {
                return None;
            };
            let key = composite_key.key();
            let cache = key
                .labels()
                .find(|label| label.key() == "cache")
                .map(|label| label.value().to_string())
                .unwrap_or_default();
            Some(((key.name().to_string(), cache), count))
        })
        .collect()
}

#[test]
fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let clock = ManualScheduler::new();
        let cache: TtlCache<u32> =
            TtlCache::new("post_details", Duration::from_secs(10), Arc::new(clock.clone()));

        assert_eq!(cache.get("post:\"a\""), None);
        cache.set("post:\"a\"", 1, None);
        assert_eq!(cache.get("post:\"a\""), Some(1));
        cache.delete("post:\"a\"");

        cache.set("post:\"b\"", 2, None);
        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.get("post:\"b\""), None);

        cache.set("post:\"c\"", 3, None);
        cache.set("post:\"d\"", 4, None);
        cache.flush();
    });

    let counters = counters(&snapshotter);
    let names: HashSet<&str> = counters.keys().map(|(name, _)| name.as_str()).collect();
    for metric in [
        "finblog_cache_hit_total",
        "finblog_cache_miss_total",
        "finblog_cache_expired_total",
        "finblog_cache_invalidated_total",
    ] {
        assert!(names.contains(metric), "missing metric: {metric}");
    }

    let count = |name: &str| {
        counters
            .get(&(name.to_string(), "post_details".to_string()))
            .copied()
            .unwrap_or_default()
    };
    assert_eq!(count("finblog_cache_hit_total"), 1);
    assert_eq!(count("finblog_cache_miss_total"), 2);
    assert_eq!(count("finblog_cache_expired_total"), 1);
    assert_eq!(count("finblog_cache_invalidated_total"), 3);
}

#[test]
fn capacity_eviction_is_counted_apart_from_invalidation() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let clock = ManualScheduler::new();
        let capacity = NonZeroUsize::new(1).expect("non-zero");
        let cache: TtlCache<u32> = TtlCache::bounded(
            "post_lists",
            Duration::from_secs(5),
            capacity,
            Arc::new(clock.clone()),
        );
        cache.set("posts:list:1", 1, None);
        cache.set("posts:list:2", 2, None);
        clock.advance(Duration::from_secs(5));
    });

    let counters = counters(&snapshotter);
    let count = |name: &str| {
        counters
            .get(&(name.to_string(), "post_lists".to_string()))
            .copied()
            .unwrap_or_default()
    };
    assert_eq!(count("finblog_cache_evicted_total"), 1);
    assert_eq!(count("finblog_cache_expired_total"), 1);
    assert_eq!(count("finblog_cache_invalidated_total"), 0);
}

#[test]
fn overwrite_does_not_count_as_invalidation() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();

    metrics::with_local_recorder(&recorder, || {
        let clock = ManualScheduler::new();
        let cache: TtlCache<u32> =
            TtlCache::new("post_lists", Duration::from_secs(5), Arc::new(clock.clone()));
        cache.set("posts:list:1", 1, None);
        cache.set("posts:list:1", 2, None);
        clock.advance(Duration::from_secs(5));
    });

    let counters = counters(&snapshotter);
    assert_eq!(
        counters.get(&(
            "finblog_cache_expired_total".to_string(),
            "post_lists".to_string()
        )),
        Some(&1)
    );
    assert!(!counters.contains_key(&(
        "finblog_cache_invalidated_total".to_string(),
        "post_lists".to_string()
    )));
}
