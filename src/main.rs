use std::{path::PathBuf, process, sync::Arc};

use finblog::{
    application::{
        categories::{CategoryService, CreateCategoryCommand},
        error::{AppError, error_chain},
        pagination::PageLimits,
        posts::{
            AdminPostsQuery, CreatePostCommand, ListPostsQuery, PostReadService, PostWriteService,
            UpdatePostCommand,
        },
        repos::{AnalyticsRepo, CategoriesRepo, PostsRepo, PostsWriteRepo, PublishedFilter},
    },
    cache::{CacheConfig, ContentCaches, TokioScheduler},
    config,
    infra::{db::PostgresRepositories, error::InfraError, telemetry},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

/// Exit status when a dependency such as the database is unavailable.
const EXIT_UNAVAILABLE: i32 = 69;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        let code = if error.is_unavailable() {
            EXIT_UNAVAILABLE
        } else {
            1
        };
        process::exit(code);
    }
}

fn report_application_error(error: &AppError) {
    let chain = error_chain(error).join(": ");

    if dispatcher::has_been_set() {
        error!(error = %chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %chain, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Migrate => run_migrate(&settings).await,
        config::Command::Posts(args) => {
            let app = ApplicationContext::build(&settings).await?;
            let outcome = run_posts(&app, args.command).await;
            app.shutdown();
            outcome
        }
        config::Command::Categories(args) => {
            let app = ApplicationContext::build(&settings).await?;
            let outcome = run_categories(&app, args.command).await;
            app.shutdown();
            outcome
        }
    }
}

async fn run_migrate(settings: &config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(settings).await?;
    PostgresRepositories::run_migrations(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;
    info!(target = "finblog::migrate", "Migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

struct ApplicationContext {
    reader: PostReadService,
    writer: PostWriteService,
    categories: CategoryService,
    caches: Option<ContentCaches>,
}

impl ApplicationContext {
    async fn build(settings: &config::Settings) -> Result<Self, AppError> {
        let repositories = init_repositories(settings).await?;
        repositories
            .health_check()
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

        let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
        let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
        let analytics_repo: Arc<dyn AnalyticsRepo> = repositories.clone();
        let categories_repo: Arc<dyn CategoriesRepo> = repositories;

        let cache_config = CacheConfig::from(&settings.cache);
        let caches = ContentCaches::from_config(&cache_config, Arc::new(TokioScheduler));
        let limits = PageLimits::from(&settings.pagination);

        Ok(Self {
            reader: PostReadService::new(
                posts_repo.clone(),
                analytics_repo,
                caches.clone(),
                limits,
            ),
            writer: PostWriteService::new(posts_repo, posts_write_repo, caches.clone()),
            categories: CategoryService::new(categories_repo, caches.clone()),
            caches,
        })
    }

    fn shutdown(&self) {
        if let Some(caches) = &self.caches {
            let entries = caches.entry_count();
            caches.flush_all();
            info!(target = "finblog::shutdown", entries, "Content caches flushed");
        }
    }
}

async fn run_posts(app: &ApplicationContext, command: config::PostsCommand) -> Result<(), AppError> {
    match command {
        config::PostsCommand::List(args) => {
            let config::ListPostsArgs { page, status, id } = args;
            let result = match (status, id) {
                (config::StatusArg::Published, None) => {
                    app.reader.list_posts(list_query(page)).await?
                }
                (status, id) => {
                    let published = match status {
                        config::StatusArg::Published => PublishedFilter::Only,
                        config::StatusArg::Draft => PublishedFilter::Hidden,
                        config::StatusArg::Any => PublishedFilter::Any,
                    };
                    app.reader
                        .list_admin_posts(AdminPostsQuery {
                            page: page.page,
                            page_size: page.page_size,
                            category: page.category,
                            search: page.search,
                            published,
                            id,
                        })
                        .await?
                }
            };
            print_json(&result)
        }
        config::PostsCommand::Popular(page) => {
            let result = app.reader.list_popular_posts(list_query(page)).await?;
            print_json(&result)
        }
        config::PostsCommand::Show { slug } => {
            let post = app
                .reader
                .post_detail(&slug)
                .await?
                .ok_or(AppError::NotFound)?;
            print_json(&post)
        }
        config::PostsCommand::Create(args) => {
            let content = resolve_content(args.content.content, args.content.content_file)
                .await?
                .unwrap_or_default();
            let post = app
                .writer
                .create_post(CreatePostCommand {
                    title: args.title,
                    excerpt: args.excerpt,
                    content,
                    category: args.category,
                    published: args.published,
                })
                .await?;
            print_json(&post)
        }
        config::PostsCommand::Update(args) => {
            let current = app
                .reader
                .post_by_id(args.id)
                .await?
                .ok_or(AppError::NotFound)?;
            let content = resolve_content(args.content.content, args.content.content_file).await?;
            let post = app
                .writer
                .update_post(UpdatePostCommand {
                    id: args.id,
                    slug: args.slug,
                    title: args.title.unwrap_or(current.title),
                    excerpt: args.excerpt.unwrap_or(current.excerpt),
                    content: content.unwrap_or(current.content),
                    category: args.category.unwrap_or(current.category),
                    published: args.published.unwrap_or(current.published),
                })
                .await?;
            print_json(&post)
        }
        config::PostsCommand::Delete { id } => {
            let removed = app.writer.delete_post(id).await?;
            print_json(&removed)
        }
    }
}

async fn run_categories(
    app: &ApplicationContext,
    command: config::CategoriesCommand,
) -> Result<(), AppError> {
    match command {
        config::CategoriesCommand::List => {
            let categories = app.categories.list_categories().await?;
            print_json(&categories)
        }
        config::CategoriesCommand::Create { name, description } => {
            let category = app
                .categories
                .create_category(CreateCategoryCommand { name, description })
                .await?;
            print_json(&category)
        }
        config::CategoriesCommand::Delete { id } => {
            let removed = app.categories.delete_category(id).await?;
            print_json(&removed)
        }
    }
}

fn list_query(page: config::PageArgs) -> ListPostsQuery {
    ListPostsQuery {
        page: page.page,
        page_size: page.page_size,
        category: page.category,
        search: page.search,
    }
}

async fn resolve_content(
    inline: Option<String>,
    file: Option<PathBuf>,
) -> Result<Option<String>, AppError> {
    match (inline, file) {
        (Some(content), _) => Ok(Some(content)),
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .map(Some)
            .map_err(|err| AppError::from(InfraError::from(err))),
        (None, None) => Ok(None),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))?;
    println!("{out}");
    Ok(())
}
