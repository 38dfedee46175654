use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use kit_router::config::{load_config, KitConfig};
use kit_router::lifecycle::signals::shutdown_on_signal;
use kit_router::observability::{logging, metrics};
use kit_router::site::{manifest_from_config, BasicRenderer};
use kit_router::{HttpServer, Shutdown, SsrOptions};

#[derive(Parser, Debug)]
#[command(name = "kit-router", version, about = "File-route request router and dispatcher")]
struct Args {
    /// Path to a TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => KitConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "kit-router starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        base_path = %config.paths.base,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let manifest = manifest_from_config(&config.routes)?;
    let renderer = BasicRenderer::from_config(&config);
    let options = SsrOptions::from_config(&config, Arc::new(manifest), Arc::new(renderer));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    HttpServer::new(&config, options).run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
