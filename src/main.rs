use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod codegen;
mod config;
mod error;
mod handlers;
mod middleware;
mod models;
mod store;

use codegen::CodeGenerator;
use store::{LinkStore, MemoryStore};

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub config: config::AppConfig,
    pub codes: CodeGenerator,
}

impl AppState {
    pub fn new(config: config::AppConfig, store: Arc<dyn LinkStore>) -> Self {
        let codes = CodeGenerator::new(&config.code_salt, config.code_min_length);
        Self {
            store,
            config,
            codes,
        }
    }
}

/// Build the full router. Every request goes through the request logger.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/shorturls", post(handlers::shorten::create_short_url))
        .route("/shorturls/:code", get(handlers::stats::url_stats))
        // Short-code redirect; the static routes above win on overlap
        .route("/:code", get(handlers::redirect::redirect))
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::log_requests))
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; variables may come from the environment
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snip=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::AppConfig::from_env()?;
    tracing::info!("Starting snip on {}:{}", config.host, config.port);
    match &config.base_url {
        Some(base) => tracing::info!("Base URL: {}", base),
        None => tracing::info!("Base URL: derived from request Host header"),
    }

    let bind_addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::new(config, Arc::new(MemoryStore::new())));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped; in-memory links discarded");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {:?}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {:?}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
