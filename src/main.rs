// Host modules
mod routes_timeline; // HTTP handlers for the day timeline
mod session;         // Per-process overlay session + stale refresh guard
mod store;           // Repository snapshot file (load/save db.json)

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use routes_timeline::AppState;
use timeline_scheduler::config::ServerConfig;

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("invalid RUST_LOG filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

pub(crate) fn app(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // timeline
        .route("/timeline", get(routes_timeline::refresh_timeline))
        .route("/timeline/current", get(routes_timeline::current_timeline))
        .route("/timeline/revert", post(routes_timeline::revert_timeline))
        // overlay edits
        .route("/timeline/items/:id/move", post(routes_timeline::move_item))
        .route("/timeline/items/:id/resize", post(routes_timeline::resize_item))
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .nest_service("/", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = ServerConfig::from_env();
    store::ensure_db(&config.db_path)?;

    let addr: SocketAddr = config
        .addr
        .parse()
        .with_context(|| format!("invalid listen address {}", config.addr))?;

    info!(%addr, db = %config.db_path.display(), "starting timeline server");
    info!("API base: http://{addr}/api");

    let app = app(Arc::new(AppState::new(config)));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr} failed"))?;

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
