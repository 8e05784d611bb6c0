//! Data Transfer Objects
//!
//! Response types for the API endpoints.

use serde::Serialize;

/// Full health status
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "saturated"
    pub status: String,
    /// Project the warehouse client is bound to
    pub warehouse_project: String,
    /// Live dashboard sessions
    pub sessions: usize,
    /// Sessions with auto-refresh on
    pub auto_refresh_sessions: usize,
    pub uptime_seconds: u64,
    pub version: String,
}
