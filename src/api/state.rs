//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;

use crate::config::{DashboardConfig, ServerConfig};
use crate::render::Renderer;
use crate::websocket::{ConnectionHub, HubConfig};

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Runs render cycles against the warehouse
    pub renderer: Arc<Renderer>,
    /// Server configuration
    pub server: Arc<ServerConfig>,
    /// Dashboard configuration
    pub dashboard: Arc<DashboardConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// Live dashboard sessions
    pub ws_hub: Arc<ConnectionHub>,
}

impl AppState {
    pub fn new(renderer: Arc<Renderer>, server: ServerConfig, dashboard: DashboardConfig) -> Self {
        let hub_config = HubConfig {
            max_connections: server.max_sessions,
        };

        Self {
            renderer,
            server: Arc::new(server),
            dashboard: Arc::new(dashboard),
            start_time: Instant::now(),
            ws_hub: Arc::new(ConnectionHub::new(hub_config)),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Get live session count
    pub async fn ws_connection_count(&self) -> usize {
        self.ws_hub.connection_count().await
    }
}
