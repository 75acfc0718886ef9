//! HTTP metrics listener service.
//!
//! ```text
//!   writer ──POST /telegraf──▶ ┌──────────────┐    ┌────────┐    ┌──────────┐
//!                              │ HttpListener │───▶│ parser │───▶│ LogSink  │
//!   writer ──unix socket─────▶ └──────────────┘    └────────┘    └──────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser as CliParser;

use http_listener::clock::SystemClock;
use http_listener::config::{load_config, ServiceConfig};
use http_listener::lifecycle::signals::shutdown_signal;
use http_listener::observability::{logging::init_logging, metrics::init_metrics};
use http_listener::registry::{ListenerRegistry, HTTP_LISTENER_V2};
use http_listener::{LineProtocolParser, LogSink};

#[derive(CliParser)]
#[command(name = "http-listener")]
#[command(about = "Accepts line-protocol metric writes over HTTP", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    if cli.check {
        println!("configuration OK");
        return Ok(());
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "http-listener starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let parser = Arc::new(LineProtocolParser::new(
        config.parser.precision,
        Arc::new(SystemClock),
    ));

    let registry = ListenerRegistry::with_builtin();
    let mut listener = registry
        .create(HTTP_LISTENER_V2, config.listener, parser)
        .ok_or("built-in listener is not registered")?;

    listener.init().await?;
    listener.start(Arc::new(LogSink))?;

    shutdown_signal().await;
    listener.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
