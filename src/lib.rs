//! # Blockwatch
//!
//! A live dashboard of Ethereum block production, backed by the public
//! `crypto_ethereum.blocks` table in BigQuery.
//!
//! ## Features
//!
//! - **Block counts**: Blocks mined today and in the last hour
//! - **Hourly chart**: Blocks per hour over the trailing 24 hours
//! - **Auto-refresh**: Per-session toggle that re-renders on a fixed interval,
//!   cancelled as soon as it is switched off
//! - **Sessions**: One isolated session per connected browser
//!
//! ## Modules
//!
//! - [`warehouse`]: Query execution against BigQuery
//! - [`dashboard`]: The dashboard queries and their typed results
//! - [`session`]: Per-viewer state
//! - [`render`]: Render cycles and the per-session refresh loop
//! - [`websocket`]: Live dashboard sessions over WebSocket
//! - [`api`]: HTTP server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blockwatch::config::Config;
//! use blockwatch::render::Renderer;
//! use blockwatch::session::Session;
//! use blockwatch::warehouse::BigQueryClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let warehouse = Arc::new(BigQueryClient::new(&config.warehouse)?);
//!     let renderer = Renderer::new(
//!         warehouse,
//!         config.warehouse.blocks_table.clone(),
//!         config.dashboard.title.clone(),
//!     );
//!
//!     let mut session = Session::new();
//!     let view = renderer.run_cycle(&mut session, false).await?;
//!     for metric in &view.metrics {
//!         println!("{}: {}", metric.label, metric.value);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dashboard;
pub mod render;
pub mod session;
pub mod warehouse;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{build_router, serve, ApiError, AppState};

pub use config::{Config, ConfigError, DashboardConfig, LoggingConfig, ServerConfig, WarehouseConfig};

pub use dashboard::{BlockCounts, DashboardError, DashboardResult, HourlyCount, HourlySeries};

pub use render::{
    CyclePhase, DashboardView, MetricView, RenderOutput, Renderer, SessionDriver, SessionEvent,
};

pub use session::{Session, SessionState};

pub use warehouse::{BigQueryClient, ResultSet, TokenSource, Warehouse, WarehouseError};

pub use websocket::{ClientMessage, ConnectionHub, HubConfig, HubError, ServerMessage};
