//! Blockwatch HTTP API
//!
//! HTTP layer for Blockwatch, built with Axum.
//!
//! # Endpoints
//!
//! ## Dashboard
//! - `GET /` - Dashboard page
//! - `GET /ws` - Dashboard session (WebSocket)
//! - `GET /api/v1/snapshot` - One render cycle as JSON
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use blockwatch::api::{serve, AppState};
//! use blockwatch::config::Config;
//! use blockwatch::render::Renderer;
//! use blockwatch::warehouse::BigQueryClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!     let warehouse = Arc::new(BigQueryClient::new(&config.warehouse)?);
//!     let renderer = Arc::new(Renderer::new(
//!         warehouse,
//!         config.warehouse.blocks_table.clone(),
//!         config.dashboard.title.clone(),
//!     ));
//!
//!     let state = AppState::new(renderer, config.server.clone(), config.dashboard.clone());
//!     serve(state).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new().route("/snapshot", get(routes::snapshot::get_snapshot));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .route("/", get(routes::page::index))
        .route("/ws", get(websocket_handler))
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the server and run until a shutdown signal arrives
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.server.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Blockwatch dashboard listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Blockwatch shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DashboardConfig, ServerConfig};
    use crate::render::Renderer;
    use crate::warehouse::testing::ScriptedWarehouse;
    use crate::warehouse::ResultSet;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app(warehouse: ScriptedWarehouse, server: ServerConfig) -> Router {
        let renderer = Arc::new(Renderer::new(
            Arc::new(warehouse),
            "bigquery-public-data.crypto_ethereum.blocks",
            "Ethereum Blocks Real-Time (Demo)",
        ));
        build_router(AppState::new(renderer, server, DashboardConfig::default()))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app(ScriptedWarehouse::healthy(1, 1, vec![]), ServerConfig::default());
        let (status, _) = get(app, "/health/live").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_without_capacity() {
        let server = ServerConfig {
            max_sessions: 0,
            ..Default::default()
        };
        let app = create_test_app(ScriptedWarehouse::healthy(1, 1, vec![]), server);
        let (status, _) = get(app, "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app(ScriptedWarehouse::healthy(1, 1, vec![]), ServerConfig::default());
        let (status, body) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["warehouse_project"], "test-project");
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_snapshot_metrics() {
        let app = create_test_app(
            ScriptedWarehouse::healthy(150, 12, vec![(1_699_084_800, 290), (1_699_088_400, 301)]),
            ServerConfig::default(),
        );
        let (status, body) = get(app, "/api/v1/snapshot").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metrics"][0]["label"], "Blocks Mined Today");
        assert_eq!(body["metrics"][0]["value"], 150);
        assert_eq!(body["metrics"][1]["value"], 12);
        assert_eq!(body["auto_refresh"], false);
        assert_eq!(body["chart"]["data"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_auth_failure() {
        let app = create_test_app(ScriptedWarehouse::unauthorized(), ServerConfig::default());
        let (status, body) = get(app, "/api/v1/snapshot").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "REMOTE_QUERY_ERROR");
        assert!(body.get("metrics").is_none());
    }

    #[tokio::test]
    async fn test_snapshot_shape_failure() {
        let app = create_test_app(
            ScriptedWarehouse::new(|_| Ok(ResultSet::default())),
            ServerConfig::default(),
        );
        let (status, body) = get(app, "/api/v1/snapshot").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "RESULT_SHAPE_ERROR");
    }

    #[tokio::test]
    async fn test_index_page() {
        let app = create_test_app(ScriptedWarehouse::healthy(1, 1, vec![]), ServerConfig::default());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Toggle Auto Refresh"));
        assert!(html.contains("/ws"));
        assert!(html.contains("const RENDER_FAILURES = ['remote_query', 'result_shape', 'disconnected'];"));
    }
}
