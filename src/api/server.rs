//! HTTP server for the T&E engine
//!
//! Axum router over the library: upload intake, validation of persisted
//! parses, submission windows and the three monthly reports.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::config::RulesConfig;

/// API Server configuration
#[derive(Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub version: String,
    pub rules: RulesConfig,
}

impl AppState {
    pub fn new(rules: RulesConfig) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            rules,
        }
    }
}

/// Build the router. Split from [`run_api_server`] so tests can drive it
/// without binding a socket.
pub fn router(state: Arc<AppState>) -> Router {
    // Leave headroom over the intake cap so oversize files reach the
    // handler and get a proper error body
    let body_limit = state.rules.upload_max_bytes().saturating_add(1024 * 1024);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Core API endpoints
        .route("/api/v1/uploads", post(handlers::upload))
        .route("/api/v1/validate", post(handlers::validate))
        .route("/api/v1/windows", get(handlers::windows))
        .route("/api/v1/reports/:kind", post(handlers::report))
        // State and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig, rules: RulesConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keystone_te=info,tower_http=info".into()),
        )
        .init();

    let app = router(Arc::new(AppState::new(rules)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Keystone T&E API starting on http://{}", addr);
    info!("   Endpoints: /api/v1/uploads, /api/v1/validate, /api/v1/windows, /api/v1/reports/{{kind}}");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Keystone T&E API shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_config_address_format() {
        let config = ApiConfig {
            host: "192.168.1.100".to_string(),
            port: 9090,
        };
        let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse().unwrap();
        assert_eq!(addr.port(), 9090);
    }

    #[test]
    fn test_app_state_carries_version_and_rules() {
        let state = AppState::new(RulesConfig::default());
        assert_eq!(state.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(state.rules.upload_max_mb, 25);
    }
}
