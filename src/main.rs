use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use probe_shim::config::load_config;
use probe_shim::observability::{logging, metrics};
use probe_shim::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "probe-shim")]
#[command(about = "Flags PHP probes, logs them and forwards traffic", long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "probe-shim.toml", env = "PROBE_SHIM_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);
    tracing::info!("probe-shim v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        reporting_prefix = %config.reporting.prefix,
        telemetry_enabled = config.telemetry.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config.reporting.token.as_deref() == Some("") {
        tracing::warn!("reporting.token is empty, reporting endpoints are open to everyone");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
