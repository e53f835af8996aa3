use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the finblog binary.
#[derive(Debug, Parser)]
#[command(name = "finblog", version, about = "finblog content backend")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FINBLOG_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: RuntimeOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// Read and maintain posts.
    Posts(PostsArgs),
    /// Read and maintain categories.
    Categories(CategoriesArgs),
}

/// Settings overrides accepted by every subcommand.
#[derive(Debug, Args, Default, Clone)]
pub struct RuntimeOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL", global = true)]
    pub database_url: Option<String>,

    /// Override the database pool size.
    #[arg(long = "database-max-connections", value_name = "COUNT", global = true)]
    pub database_max_connections: Option<u32>,

    /// Toggle the in-process content caches.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enabled: Option<bool>,

    /// Override the lifetime of cached listing pages.
    #[arg(long = "cache-list-ttl-seconds", value_name = "SECONDS", global = true)]
    pub cache_list_ttl_seconds: Option<u64>,

    /// Override the lifetime of cached single posts.
    #[arg(long = "cache-detail-ttl-seconds", value_name = "SECONDS", global = true)]
    pub cache_detail_ttl_seconds: Option<u64>,
}

#[derive(Debug, Args, Clone)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub command: PostsCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum PostsCommand {
    /// List posts, newest first.
    List(ListPostsArgs),
    /// List published posts, most viewed first.
    Popular(PageArgs),
    /// Show a published post by slug and count the view.
    Show {
        #[arg(value_name = "SLUG")]
        slug: String,
    },
    /// Create a post; the slug is derived from the title.
    Create(CreatePostArgs),
    /// Update a post; omitted fields keep their current value.
    Update(UpdatePostArgs),
    /// Delete a post by id.
    Delete {
        #[arg(value_name = "ID")]
        id: Uuid,
    },
}

#[derive(Debug, Args, Default, Clone)]
pub struct PageArgs {
    /// 1-based page number.
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub page: Option<i64>,

    /// Posts per page.
    #[arg(long = "page-size", value_name = "N", allow_negative_numbers = true)]
    pub page_size: Option<i64>,

    /// Only posts in this category.
    #[arg(long, value_name = "SLUG")]
    pub category: Option<String>,

    /// Case-insensitive text matched against title, excerpt and content.
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    #[default]
    Published,
    Draft,
    Any,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListPostsArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Publication state to list; anything other than `published` bypasses the public view.
    #[arg(long, value_enum, default_value_t = StatusArg::Published)]
    pub status: StatusArg,

    /// Restrict to a single post id.
    #[arg(long, value_name = "ID")]
    pub id: Option<Uuid>,
}

#[derive(Debug, Args, Clone)]
pub struct CreatePostArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub excerpt: String,

    #[command(flatten)]
    pub content: ContentArgs,

    #[arg(long, value_name = "SLUG")]
    pub category: String,

    /// Publish immediately.
    #[arg(long)]
    pub published: bool,
}

#[derive(Debug, Args, Clone)]
pub struct UpdatePostArgs {
    #[arg(value_name = "ID")]
    pub id: Uuid,

    #[arg(long)]
    pub slug: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub excerpt: Option<String>,

    #[command(flatten)]
    pub content: OptionalContentArgs,

    #[arg(long, value_name = "SLUG")]
    pub category: Option<String>,

    #[arg(long, value_name = "BOOL", value_parser = BoolishValueParser::new())]
    pub published: Option<bool>,
}

#[derive(Debug, Args, Clone)]
#[group(required = true, multiple = false)]
pub struct ContentArgs {
    /// Post body inline.
    #[arg(long)]
    pub content: Option<String>,

    /// Read the post body from a file.
    #[arg(long = "content-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
#[group(required = false, multiple = false)]
pub struct OptionalContentArgs {
    /// Replacement post body.
    #[arg(long)]
    pub content: Option<String>,

    /// Read the replacement post body from a file.
    #[arg(long = "content-file", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct CategoriesArgs {
    #[command(subcommand)]
    pub command: CategoriesCommand,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CategoriesCommand {
    /// List all categories.
    List,
    /// Create a category; the slug is derived from the name.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a category by id.
    Delete {
        #[arg(value_name = "ID")]
        id: Uuid,
    },
}
