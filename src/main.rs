//! CodeJudge - Application Entry Point

use std::{net::SocketAddr, sync::Arc};

use bollard::{API_DEFAULT_VERSION, Docker};
use redis::Client as RedisClient;
use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use codejudge::{
    config::{Config, LogFormat},
    db::{self, PgStore},
    handlers,
    judge::Dispatcher,
    queue::RedisQueue,
    sandbox::{DockerSandbox, SandboxPool},
    state::AppState,
};

/// Seconds bollard waits on a Docker API call
const DOCKER_TIMEOUT_SECONDS: u64 = 120;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.server.rust_log.clone().into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    tracing::info!("Starting CodeJudge server...");

    tracing::info!("Connecting to database...");
    let db_pool = db::connect(&config.database).await?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&db_pool).await?;
    let store = Arc::new(PgStore::new(db_pool));

    tracing::info!("Connecting to Redis...");
    let redis_client = RedisClient::open(config.redis.url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    let queue = Arc::new(RedisQueue::new(redis_conn));

    tracing::info!(socket = %config.docker.socket_path, "Connecting to Docker...");
    let docker = Docker::connect_with_socket(
        &config.docker.socket_path,
        DOCKER_TIMEOUT_SECONDS,
        API_DEFAULT_VERSION,
    )?;
    let docker_info = docker.version().await?;
    tracing::info!(
        version = %docker_info.version.unwrap_or_default(),
        "Connected to Docker"
    );

    let sandbox = Arc::new(DockerSandbox::new(docker, config.judge.compile_timeout));
    let pool = SandboxPool::new(sandbox, &config.judge);

    let dispatcher = Arc::new(Dispatcher::new(
        store.clone(),
        queue.clone(),
        pool.clone(),
        config.judge.clone(),
    ));
    dispatcher.recover().await?;
    dispatcher.spawn();

    let state = AppState::new(store, queue, pool, config.jwt.clone());
    let app = handlers::router(state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
