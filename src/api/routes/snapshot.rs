//! Snapshot Routes
//!
//! - GET /api/v1/snapshot - One stateless render cycle as JSON

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::render::DashboardView;
use crate::session::Session;

/// GET /api/v1/snapshot
///
/// Runs a render cycle for a throwaway session (auto-refresh off) and
/// returns the view. Query failures are not retried.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> ApiResult<Json<DashboardView>> {
    let mut session = Session::new();
    let view = state.renderer.run_cycle(&mut session, false).await?;
    Ok(Json(view))
}
