use std::{future::IntoFuture, process, sync::Arc};

use catalog::{
    application::{
        catalog::{CatalogPolicy, CatalogServices},
        error::AppError,
        repos::StoreHealth,
    },
    cache::{CacheBackend, CacheConfig, CacheStore, MemoryBackend, RedisBackend},
    config::{self, CacheBackendKind},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use sqlx::PgPool;
use tokio::sync::Notify;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    if settings.database.run_migrations {
        apply_migrations(&pool).await?;
    }
    let repositories = Arc::new(PostgresRepositories::new(pool));

    let store = build_cache_store(&settings.cache).await?;
    let catalog = CatalogServices::from_repositories(
        repositories.clone(),
        store,
        CatalogPolicy::from(&settings.catalog),
    );
    let health: Arc<dyn StoreHealth> = repositories;

    serve_http(&settings, ApiState::new(catalog, health)).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    apply_migrations(&pool).await?;
    info!(target = "catalog::migrate", "Migrations applied");
    Ok(())
}

async fn connect_pool(settings: &config::Settings) -> Result<PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn apply_migrations(pool: &PgPool) -> Result<(), AppError> {
    PostgresRepositories::run_migrations(pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn build_cache_store(settings: &config::CacheSettings) -> Result<CacheStore, AppError> {
    let cache_config = CacheConfig::from(settings);

    // A disabled cache never talks to its backend, so skip the connection.
    let backend: Arc<dyn CacheBackend> = match settings.backend {
        CacheBackendKind::Redis if settings.enabled => {
            let redis = RedisBackend::connect(&settings.redis_url)
                .await
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
            Arc::new(redis)
        }
        CacheBackendKind::Redis | CacheBackendKind::Memory => Arc::new(MemoryBackend::new()),
    };

    info!(
        target = "catalog::cache",
        enabled = cache_config.enabled,
        backend = ?settings.backend,
        default_ttl_secs = cache_config.default_ttl.as_secs(),
        key_prefix = %cache_config.key_prefix,
        "Cache configured"
    );

    Ok(CacheStore::new(backend, cache_config))
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "catalog::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let grace = settings.server.graceful_shutdown;
    let draining = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(draining.clone()))
        .into_future();
    let drain_deadline = async move {
        draining.notified().await;
        tokio::time::sleep(grace).await;
    };

    let result = tokio::select! {
        result = server => result,
        () = drain_deadline => {
            warn!(
                target = "catalog::http",
                timeout_secs = grace.as_secs(),
                "Graceful shutdown timed out"
            );
            Ok(())
        }
    };

    result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
}

async fn shutdown_signal(draining: Arc<Notify>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = "catalog::http", error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!(target = "catalog::http", "Shutdown signal received, draining connections");
    draining.notify_one();
}
