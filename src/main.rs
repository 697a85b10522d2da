//! Transfer validation rendezvous (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   caller
//!     │ transfer()
//!     ▼
//! ┌──────────────────────┐  command topic   ┌─────────────────────┐
//! │ RendezvousCoordinator│ ───────────────▶ │  TransferValidator  │
//! │  Pending → poll → del│                  │  (remote worker)    │
//! └──────────┬───────────┘                  └──────────┬──────────┘
//!            │ get                                     │ response topic
//!            ▼                                         ▼
//!     ┌─────────────┐   resolve_if_pending   ┌──────────────────┐
//!     │ shared cache│ ◀───────────────────── │ ResponseIngestor │
//!     └─────────────┘                        └──────────────────┘
//!            │ Resolved{valid}
//!            ▼
//!     GuardedInvoker (circuit breaker) → payment processor / fallback
//! ```
//!
//! This binary wires the in-process bus and cache, starts the ingestor and a
//! local validator, submits one transfer and prints the receipt.

use clap::Parser;
use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use transfer_rendezvous::cache::InMemoryCache;
use transfer_rendezvous::config::{load_config, ServiceConfig};
use transfer_rendezvous::lifecycle::Instance;
use transfer_rendezvous::messaging::{BasicTransferRule, InMemoryBus, TransferValidator};
use transfer_rendezvous::observability::{logging, metrics};
use transfer_rendezvous::payments::LoggingProcessor;
use transfer_rendezvous::rendezvous::{RequestId, TransferRequest};

#[derive(Parser)]
#[command(name = "transfer-rendezvous")]
#[command(about = "Validate and process a transfer through the bus/cache rendezvous", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Source account.
    #[arg(long)]
    from: String,

    /// Destination account.
    #[arg(long)]
    to: String,

    /// Amount to transfer.
    #[arg(long)]
    amount: Decimal,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServiceConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!("transfer-rendezvous v0.1.0 starting");
    tracing::info!(
        command_topic = %config.messaging.command_topic,
        response_topic = %config.messaging.response_topic,
        max_attempts = config.rendezvous.max_attempts,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bus = Arc::new(InMemoryBus::new(config.messaging.partitions));
    let cache = Arc::new(InMemoryCache::new());

    let mut instance = Instance::start(
        &config,
        bus.clone(),
        cache.clone(),
        Arc::new(LoggingProcessor),
    )
    .await?;

    let validator = TransferValidator::new(bus.clone(), Arc::new(BasicTransferRule), &config.messaging);
    let validator_task = validator.spawn(instance.shutdown_signal()).await?;
    instance.track(validator_task);

    let request = TransferRequest {
        from_account: cli.from,
        to_account: cli.to,
        amount: cli.amount,
    };
    let result = instance.service().transfer(RequestId::new(), &request).await;

    instance.stop(Duration::from_secs(5)).await;

    let receipt = result?;
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    tracing::info!("Shutdown complete");
    Ok(())
}
