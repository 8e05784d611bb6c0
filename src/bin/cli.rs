//! Blockwatch CLI
//!
//! Command-line interface for Blockwatch:
//! - Render the dashboard once
//! - Watch it in the terminal with auto-refresh
//! - Check a running server
//! - Generate a config file

use blockwatch::config::{generate_default_config, Config};
use blockwatch::render::{DashboardView, RenderOutput, Renderer, SessionDriver, SessionEvent};
use blockwatch::session::Session;
use blockwatch::warehouse::BigQueryClient;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "blockwatch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Live Ethereum block production dashboard")]
#[command(long_about = "Blockwatch queries the public Ethereum blocks table in BigQuery\nand shows blocks mined today, in the last hour and per hour.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one render cycle and print it
    Snapshot,

    /// Render continuously; type `t` + Enter to toggle auto-refresh,
    /// `r` to rerun, `q` to quit
    Watch {
        /// Seconds between refreshes (default: from config)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Start with auto-refresh switched on
        #[arg(long)]
        auto_refresh: bool,
    },

    /// Show the status of a running server
    Status {
        /// Server URL
        #[arg(long, default_value = "http://localhost:8501")]
        url: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    match cli.command {
        Commands::Snapshot => {
            let renderer = build_renderer(&config)?;
            let mut session = Session::new();

            match renderer.run_cycle(&mut session, false).await {
                Ok(view) => print_view(&view, &cli.format)?,
                Err(e) => {
                    eprintln!("Render failed ({}): {}", e.kind(), e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Watch {
            interval,
            auto_refresh,
        } => {
            let renderer = Arc::new(build_renderer(&config)?);
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.dashboard.refresh_interval());

            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let (output_tx, mut output_rx) = mpsc::unbounded_channel();

            let session = Session::new().with_auto_refresh(auto_refresh);
            let driver = SessionDriver::new(renderer, session, interval);
            let driver_task = tokio::spawn(driver.run(events_rx, output_tx));

            // Resolves to true when the user quits, false when stdin closes.
            // `events_tx` stays alive here so a closed stdin does not end
            // the session.
            let input_events = events_tx.clone();
            let mut input_task = tokio::spawn(async move {
                let mut lines = BufReader::new(tokio::io::stdin()).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let event = match line.trim() {
                        "t" | "toggle" => SessionEvent::ToggleAutoRefresh,
                        "r" | "rerun" => SessionEvent::Rerun,
                        "q" | "quit" => return true,
                        _ => continue,
                    };
                    if input_events.send(event).is_err() {
                        break;
                    }
                }
                false
            });
            let mut input_open = true;

            loop {
                tokio::select! {
                    output = output_rx.recv() => match output {
                        Some(RenderOutput::View(view)) => {
                            print_view(&view, &cli.format)?;
                            println!();
                            println!("[t] toggle auto refresh  [r] rerun  [q] quit");
                        }
                        Some(RenderOutput::Failed { kind, message }) => {
                            eprintln!("Render failed ({}): {}", kind, message);
                        }
                        None => break,
                    },
                    quit = &mut input_task, if input_open => {
                        input_open = false;
                        if matches!(quit, Ok(true)) {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }

            input_task.abort();
            drop(events_tx);
            let _ = driver_task.await;
        }

        Commands::Status { url } => {
            let client = reqwest::Client::new();
            let response = client.get(format!("{}/health", url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Blockwatch v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("Server status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!(
                        "Warehouse project: {}",
                        health["warehouse_project"].as_str().unwrap_or("-")
                    );
                    println!(
                        "Sessions: {} ({} auto-refreshing)",
                        health["sessions"].as_u64().unwrap_or(0),
                        health["auto_refresh_sessions"].as_u64().unwrap_or(0)
                    );
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("Server returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Blockwatch at {}", url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin blockwatch");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn build_renderer(config: &Config) -> Result<Renderer, Box<dyn std::error::Error>> {
    let warehouse = Arc::new(BigQueryClient::new(&config.warehouse)?);
    Ok(Renderer::new(
        warehouse,
        config.warehouse.blocks_table.clone(),
        config.dashboard.title.clone(),
    ))
}

fn print_view(view: &DashboardView, format: &str) -> Result<(), serde_json::Error> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    println!("{}", view.title);
    println!("{}", "=".repeat(view.title.len()));
    println!("{}", view.auto_refresh_line.replace("**", ""));
    println!();

    for metric in &view.metrics {
        println!("{:<24} {:>10}", metric.label, metric.value);
    }

    println!();
    println!("{}", view.subheader);
    println!("{}", "-".repeat(60));

    if view.chart.data.is_empty() {
        println!("(no blocks in the last 24 hours)");
        return Ok(());
    }

    let max = view
        .chart
        .data
        .iter()
        .map(|p| p.blocks_count)
        .max()
        .unwrap_or(1)
        .max(1);

    for point in &view.chart.data {
        let width = (point.blocks_count * 40 / max) as usize;
        println!(
            "{}  {:>6}  {}",
            point.hour.format("%m-%d %H:00"),
            point.blocks_count,
            "#".repeat(width)
        );
    }

    Ok(())
}

fn format_duration(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let mins = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
