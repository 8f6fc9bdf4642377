//! Burn-window API server.
//!
//! Aggregates burn-window and temperature rasters over a date window, clips
//! them to the state boundary and serves the rendered images and legends.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use window_api::config::ServiceConfig;
use window_api::metrics::install_recorder;
use window_api::server::build_router;
use window_api::state::AppState;

#[derive(Parser, Debug)]
#[command(name = "window-api")]
#[command(about = "Burn-window image and legend server")]
struct Args {
    /// Listen address (overrides the config file)
    #[arg(short, long, env = "WINDOW_LISTEN")]
    listen: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "WINDOW_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "TOKIO_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .json()
        .init();

    let prometheus_handle = install_recorder().context("installing Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let mut config = ServiceConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    info!(
        boundary = %config.boundary_path.display(),
        output_dir = %config.output_dir.display(),
        burn_window = %config.source_path(window_common::DatasetKind::Count).display(),
        temperature = %config.source_path(window_common::DatasetKind::Continuous).display(),
        "Loaded configuration"
    );

    let addr: SocketAddr = config
        .listen
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.listen))?;

    let state = Arc::new(AppState::from_config(config, Some(prometheus_handle))?);
    let app = build_router(state);

    info!(address = %addr, "Listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
