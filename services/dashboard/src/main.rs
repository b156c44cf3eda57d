//! Catchment dashboard server
//!
//! Interactive flood, terrain, drought, forest and water-usage dashboards
//! over Australian river catchments.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use dashboard::config::DashboardConfig;
use dashboard::layout::Variant;
use dashboard::state::AppState;
use data_adapters::product::DEFAULT_SERVICE_URL;

/// Catchment dashboard server
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Interactive catchment dashboard backed by remote WMS/WPS/WCS services")]
struct Args {
    /// Listen port
    #[arg(short, long, default_value_t = 8080, env = "PORT")]
    port: u16,

    /// Dashboard variant to serve
    #[arg(long, value_enum, default_value = "flood", env = "DASH_VARIANT")]
    variant: Variant,

    /// Directory holding products.yaml and reference.yaml
    #[arg(long, default_value = "config/dashboard", env = "DASH_CONFIG_DIR")]
    config_dir: String,

    /// Base URL of the remote processing services
    #[arg(long, default_value = DEFAULT_SERVICE_URL, env = "DASH_SERVICE_URL")]
    service_url: String,

    /// Timeout for each remote request, in seconds
    #[arg(long, default_value_t = 60, env = "DASH_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: u64,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "DASH_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .expect("Failed to create Tokio runtime");

    runtime.block_on(async move {
        run_server(args).await;
    });
}

async fn run_server(args: Args) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    info!(variant = ?args.variant, "Starting catchment dashboard");

    let config = match DashboardConfig::load_from_dir(&args.config_dir, &args.service_url) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    // Reference data is loaded here; the dashboard is useless without it.
    let state = match AppState::new(
        config,
        args.variant,
        &args.service_url,
        Duration::from_secs(args.request_timeout_secs),
    )
    .await
    {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application state: {:#}", e);
            std::process::exit(1);
        }
    };

    let app = dashboard::router(state, prometheus_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("Dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind");
    axum::serve(listener, app).await.expect("Server failed");
}
