//! Roster API Server implementation
//!
//! HTTP REST API server using Axum. Every request goes through one shared
//! `RosterService`, so all handlers hit the same spreadsheet cache.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::config::{RosterConfig, DEFAULT_CONFIG_FILE};
use crate::roster::RosterService;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub config_path: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
        }
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub service: Arc<RosterService>,
}

impl AppState {
    pub fn new(service: Arc<RosterService>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            service,
        }
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Roster endpoints
        .route("/api/v1/schedule", post(handlers::schedule))
        .route("/api/v1/duties", post(handlers::duties))
        .route("/api/v1/duties/month", post(handlers::duties_month))
        .route("/api/v1/heads", post(handlers::heads))
        .route("/api/v1/group", post(handlers::group))
        // Cache endpoints
        .route("/api/v1/invalidate", post(handlers::invalidate))
        .route("/api/v1/cache", get(handlers::cache_stats))
        // State and middleware
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "royalbit_roster=info,tower_http=info".into()),
        )
        .init();

    let roster_config = RosterConfig::load(&config.config_path)?;
    let service = Arc::new(RosterService::from_config(roster_config));

    for division in service.config().divisions.keys() {
        match service.warm(division).await {
            Ok(people) => info!(division = %division, people, "schedule warmed"),
            Err(e) => warn!(division = %division, "warm-up failed: {}", e),
        }
    }

    let app = router(Arc::new(AppState::new(service)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("📅 Roster API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/schedule, /api/v1/duties, /api/v1/heads, /api/v1/group");
    info!("   Health: /health, Version: /version, Cache: /api/v1/cache");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Roster API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, stopping server...");
}
