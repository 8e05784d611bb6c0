//! Blockwatch Dashboard Server
//!
//! Run with: cargo run --bin blockwatch
//!
//! Takes no arguments. Configuration comes from the first config file found
//! (`~/.config/blockwatch/config.toml`, `/etc/blockwatch/config.toml`,
//! `./blockwatch.toml`) with `BLOCKWATCH_*` environment overrides.
//! Credentials come from `GOOGLE_OAUTH_ACCESS_TOKEN` or the GCE metadata
//! server.

use blockwatch::api::{serve, AppState};
use blockwatch::config::Config;
use blockwatch::render::Renderer;
use blockwatch::warehouse::{BigQueryClient, Warehouse};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_default();
    config.logging.init();

    tracing::info!("Starting Blockwatch v{}", env!("CARGO_PKG_VERSION"));

    let warehouse = Arc::new(BigQueryClient::new(&config.warehouse)?);
    tracing::info!(
        project = %warehouse.project_id(),
        table = %config.warehouse.blocks_table,
        "Warehouse client ready"
    );
    tracing::info!(
        "Auto refresh interval: {}s",
        config.dashboard.refresh_interval_secs
    );

    let renderer = Arc::new(Renderer::new(
        warehouse,
        config.warehouse.blocks_table.clone(),
        config.dashboard.title.clone(),
    ));

    let state = AppState::new(renderer, config.server.clone(), config.dashboard.clone());
    serve(state).await?;

    tracing::info!("Blockwatch stopped");
    Ok(())
}
