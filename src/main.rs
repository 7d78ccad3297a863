use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ops_leaderboard::api::state::AppState;
use ops_leaderboard::api::{build_router, cors_layer};
use ops_leaderboard::config::AppConfig;
use ops_leaderboard::fetch::SheetSource;
use ops_leaderboard::models::Mode;
use ops_leaderboard::parse_interval;
use ops_leaderboard::pipeline::run_cycle;
use ops_leaderboard::refresh::Refresher;
use ops_leaderboard::render::{format_number, text_table};

#[derive(Parser)]
#[command(name = "ops-leaderboard")]
#[command(about = "Leaderboard built from a published spreadsheet")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// CSV export URL of the sheet (overrides the config file)
    #[arg(long)]
    source_url: Option<String>,

    /// Column family to read: total or daily
    #[arg(long)]
    mode: Option<Mode>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,

        /// Refresh interval (e.g., "1m", "90s")
        #[arg(long)]
        interval: Option<String>,
    },

    /// Build the leaderboard once and print it
    Show {
        /// Print the full dashboard as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::read_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };

    if let Some(url) = &cli.source_url {
        config.source.url = url.clone();
    }
    if let Some(mode) = cli.mode {
        config.leaderboard.mode = mode;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting ops-leaderboard v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve {
            host,
            port,
            interval,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let interval = match interval {
                Some(raw) => parse_interval(&raw)
                    .ok_or_else(|| anyhow!("Invalid --interval: {:?}", raw))?,
                None => config.refresh_interval(),
            };

            let source = Arc::new(SheetSource::new(config.fetcher_config()?)?);
            let refresher = Arc::new(Refresher::new(source, config.column_map(), interval));
            tokio::spawn(refresher.clone().run_periodic());

            let state = AppState::new(
                refresher,
                &config.leaderboard.title,
                config.leaderboard.mode,
            );
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("binding {}", addr))?;
            tracing::info!("Dashboard: http://{}", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        Commands::Show { json } => {
            config.validate()?;

            let source = SheetSource::new(config.fetcher_config()?)?;
            let dashboard = run_cycle(&source, &config.column_map()).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dashboard)?);
            } else {
                let summary = &dashboard.summary;
                println!("{}\n", config.leaderboard.title);
                print!("{}", text_table(&dashboard.leaderboard, dashboard.mode));
                println!();
                println!(
                    "Applications: {}  Approvals: {}  MoUs: {}  Conversion: {}",
                    format_number(summary.total_applications),
                    format_number(summary.total_approvals),
                    format_number(summary.total_units),
                    format_number(summary.conversion_rate)
                );
                println!(
                    "{} rows, generated {}",
                    dashboard.source_rows,
                    dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
                );
            }
        }
    }

    Ok(())
}
