//! spread_watch - Entry Point
//!
//! Orchestrates:
//! 1. Config + logging initialization
//! 2. One HTTP quote source per venue
//! 3. Monitor loop printing alerts to stdout
//! 4. Ctrl+C graceful shutdown

use anyhow::Context;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info};

use spread_watch::adapters::HttpQuoteSource;
use spread_watch::config::{constants, init_logging, load_config};
use spread_watch::core::{run_monitor, ConsoleSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // =========================================================================
    // 1. Config + logging
    // =========================================================================
    dotenvy::dotenv().ok();
    init_logging();

    let config_path = constants::config_path();
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let (venue_a, venue_b) = config.venue_pair()?;

    info!(
        symbol = %config.monitor.symbol,
        venue_a = %venue_a.id,
        venue_b = %venue_b.id,
        threshold_pct = config.monitor.threshold_pct,
        selection = ?config.monitor.selection,
        poll_interval_ms = config.monitor.poll_interval_ms,
        read_timeout_ms = config.monitor.read_timeout_ms,
        "Configuration loaded"
    );

    // =========================================================================
    // 2. Sources
    // =========================================================================
    let read_timeout = config.monitor.read_timeout();
    let document_reuse = config.monitor.poll_interval() / 2;
    let mut source_a =
        HttpQuoteSource::new(venue_a.clone(), read_timeout).with_document_reuse(document_reuse);
    let mut source_b =
        HttpQuoteSource::new(venue_b.clone(), read_timeout).with_document_reuse(document_reuse);

    // =========================================================================
    // 3. Shutdown
    // =========================================================================
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
    let shutdown_signal = shutdown_tx.clone();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Graceful shutdown initiated");
                let _ = shutdown_signal.send(());
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for Ctrl+C signal");
            }
        }
    });

    // =========================================================================
    // 4. Monitor
    // =========================================================================
    let mut sink = ConsoleSink;
    let summary = run_monitor(&config, &mut source_a, &mut source_b, &mut sink, shutdown_rx)
        .await
        .map_err(|e| {
            error!(error = %e, "Monitor stopped with error");
            e
        })?;
    drop(shutdown_tx);

    info!(ticks = summary.ticks, emitted = summary.emitted, "Clean exit");
    Ok(())
}
