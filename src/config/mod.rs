//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{
    num::{NonZeroU32, NonZeroUsize},
    str::FromStr,
    time::Duration,
};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

pub use cli::{
    CategoriesArgs, CategoriesCommand, CliArgs, Command, ContentArgs, CreatePostArgs,
    ListPostsArgs, OptionalContentArgs, PageArgs, PostsArgs, PostsCommand, RuntimeOverrides,
    StatusArg, UpdatePostArgs,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "finblog";
const ENV_PREFIX: &str = "FINBLOG";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_CACHE_LIST_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_DETAIL_TTL_SECS: u64 = 600;
const DEFAULT_CACHE_CATEGORY_TTL_SECS: u64 = 600;
const DEFAULT_CACHE_LIST_CAPACITY: usize = 512;
const DEFAULT_PAGE_SIZE: u32 = 9;
const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub pagination: PaginationSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub list_ttl: Duration,
    pub detail_ttl: Duration,
    pub category_ttl: Duration,
    pub list_capacity: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct PaginationSettings {
    pub default_page_size: NonZeroU32,
    pub max_page_size: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    cache: RawCacheSettings,
    pagination: RawPaginationSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &RuntimeOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.cache_list_ttl_seconds {
            self.cache.list_ttl_secs = Some(ttl);
        }
        if let Some(ttl) = overrides.cache_detail_ttl_seconds {
            self.cache.detail_ttl_secs = Some(ttl);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            database,
            cache,
            pagination,
        } = raw;

        Ok(Self {
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            cache: build_cache_settings(cache)?,
            pagination: build_pagination_settings(pagination)?,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = database.url.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });

    let max_connections = non_zero_u32(
        database
            .max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
            .into(),
        "database.max_connections",
    )?;

    Ok(DatabaseSettings {
        url,
        max_connections,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let list_ttl = positive_seconds(
        cache.list_ttl_secs.unwrap_or(DEFAULT_CACHE_LIST_TTL_SECS),
        "cache.list_ttl_secs",
    )?;
    let detail_ttl = positive_seconds(
        cache.detail_ttl_secs.unwrap_or(DEFAULT_CACHE_DETAIL_TTL_SECS),
        "cache.detail_ttl_secs",
    )?;
    let category_ttl = positive_seconds(
        cache
            .category_ttl_secs
            .unwrap_or(DEFAULT_CACHE_CATEGORY_TTL_SECS),
        "cache.category_ttl_secs",
    )?;
    let list_capacity = NonZeroUsize::new(
        cache.list_capacity.unwrap_or(DEFAULT_CACHE_LIST_CAPACITY),
    )
    .ok_or_else(|| LoadError::invalid("cache.list_capacity", "must be greater than zero"))?;

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        list_ttl,
        detail_ttl,
        category_ttl,
        list_capacity,
    })
}

fn build_pagination_settings(
    pagination: RawPaginationSettings,
) -> Result<PaginationSettings, LoadError> {
    let default_page_size = non_zero_u32(
        pagination
            .default_page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .into(),
        "pagination.default_page_size",
    )?;
    let max_page_size = non_zero_u32(
        pagination.max_page_size.unwrap_or(DEFAULT_MAX_PAGE_SIZE).into(),
        "pagination.max_page_size",
    )?;

    if default_page_size > max_page_size {
        return Err(LoadError::invalid(
            "pagination.default_page_size",
            format!("must not exceed pagination.max_page_size ({max_page_size})"),
        ));
    }

    Ok(PaginationSettings {
        default_page_size,
        max_page_size,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    list_ttl_secs: Option<u64>,
    detail_ttl_secs: Option<u64>,
    category_ttl_secs: Option<u64>,
    list_capacity: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawPaginationSettings {
    default_page_size: Option<u32>,
    max_page_size: Option<u32>,
}

fn positive_seconds(value: u64, key: &'static str) -> Result<Duration, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
