use std::{process, sync::Arc};

use rostra::{
    application::{
        error::AppError,
        feed::FeedService,
        posts::PostService,
        profile::ProfileService,
        repos::{CommentsRepo, FollowsRepo, GroupsRepo, PostsRepo, PostsWriteRepo, UsersRepo},
    },
    cache::{CacheConfig, CacheState, ResponseStore, SystemClock},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_startup_failure(&error);
        process::exit(1);
    }
}

fn report_startup_failure(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "startup failed");
        return;
    }

    // Telemetry never came up; emit through a one-off stderr subscriber.
    let fallback = tracing_fmt().with_max_level(Level::ERROR).finish();
    dispatcher::with_default(&Dispatch::new(fallback), || {
        error!(error = %error, "startup failed");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) =
        config::load_with_cli().map_err(|err| AppError::config(err.to_string()))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let http_state = build_http_state(repositories, &settings);

    let router = http::build_router(http_state);

    let listener = tokio::net::TcpListener::bind(settings.server.public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target: "rostra::serve",
        addr = %settings.server.public_addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

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
        .map_err(|err| AppError::from(InfraError::connect(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));
    repositories
        .health_check()
        .await
        .map_err(|err| AppError::from(InfraError::connect(err.to_string())))?;

    Ok(repositories)
}

fn build_http_state(repositories: Arc<PostgresRepositories>, settings: &config::Settings) -> HttpState {
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        users_repo.clone(),
        follows_repo.clone(),
    ));
    let posts = Arc::new(PostService::new(
        posts_repo,
        posts_write_repo,
        comments_repo,
    ));
    let profiles = Arc::new(ProfileService::new(users_repo.clone(), follows_repo));

    let cache_config = CacheConfig::from(&settings.cache);
    let cache = if cache_config.enabled {
        let store = Arc::new(ResponseStore::new(&cache_config, Arc::new(SystemClock)));
        Some(CacheState {
            config: cache_config,
            store,
        })
    } else {
        None
    };

    HttpState {
        feed,
        posts,
        profiles,
        groups: groups_repo,
        users: users_repo,
        cache,
    }
}
