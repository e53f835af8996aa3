use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

pub const METRIC_POST_LIST_QUERY_MS: &str = "finblog_post_list_query_ms";

/// Install a global tracing subscriber using the provided logging settings.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            crate::cache::METRIC_CACHE_HIT,
            Unit::Count,
            "Total number of content cache hits."
        );
        describe_counter!(
            crate::cache::METRIC_CACHE_MISS,
            Unit::Count,
            "Total number of content cache misses, including expired entries."
        );
        describe_counter!(
            crate::cache::METRIC_CACHE_EXPIRED,
            Unit::Count,
            "Total number of cache entries removed by their expiry timer."
        );
        describe_counter!(
            crate::cache::METRIC_CACHE_INVALIDATED,
            Unit::Count,
            "Total number of cache entries removed by delete or flush."
        );
        describe_counter!(
            crate::cache::METRIC_CACHE_EVICTED,
            Unit::Count,
            "Total number of cache entries dropped to stay within capacity."
        );
        describe_histogram!(
            METRIC_POST_LIST_QUERY_MS,
            Unit::Milliseconds,
            "Latency of the concurrent page and count queries behind a post listing."
        );
    });
}
