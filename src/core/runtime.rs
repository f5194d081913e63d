//! Monitor runtime: session lifecycle around the polling loop
//!
//! Both sources are opened before the first tick and closed on every exit
//! path: clean shutdown, session loss, or a failed open of the second source.

use tokio::sync::broadcast;
use tracing::info;

use crate::adapters::traits::QuoteSource;
use crate::config::AppConfig;
use crate::core::alert::AlertSink;
use crate::core::events::{log_system_event, SystemEvent};
use crate::core::monitoring::{monitoring_task, Monitor, MonitorSummary};
use crate::error::Result;

/// Run the monitor until shutdown or session loss
///
/// # Errors
/// * `AppError::Config` - configuration does not describe a venue pair
/// * `AppError::Source` - a session failed to open, or died mid-loop
pub async fn run_monitor(
    config: &AppConfig,
    source_a: &mut dyn QuoteSource,
    source_b: &mut dyn QuoteSource,
    sink: &mut dyn AlertSink,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<MonitorSummary> {
    let mut monitor = Monitor::from_config(config)?;

    open_source(source_a).await?;
    if let Err(e) = open_source(source_b).await {
        close_source(source_a).await;
        return Err(e);
    }

    let result = monitoring_task(
        &mut monitor,
        &*source_a,
        &*source_b,
        sink,
        config.monitor.poll_interval(),
        &mut shutdown_rx,
    )
    .await;

    close_source(source_a).await;
    close_source(source_b).await;

    let summary = result?;
    info!(
        event_type = "MONITOR_SUMMARY",
        ticks = summary.ticks,
        emitted = summary.emitted,
        suppressed = summary.suppressed,
        below_threshold = summary.below_threshold,
        no_candidate = summary.no_candidate,
        failed = summary.failed,
        "Monitor stopped"
    );
    Ok(summary)
}

async fn open_source(source: &mut dyn QuoteSource) -> Result<()> {
    source.open().await?;
    log_system_event(&SystemEvent::session_opened(source.venue_name()));
    Ok(())
}

/// Release a session; failures are logged, never propagated
async fn close_source(source: &mut dyn QuoteSource) {
    let error = source.close().await.err().map(|e| e.to_string());
    log_system_event(&SystemEvent::session_closed(source.venue_name(), error));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_utils::{ScriptedRead, ScriptedSource};
    use crate::config::load_config_from_str;
    use crate::core::alert::BufferSink;
    use crate::error::AppError;
    use std::time::Duration;

    const CONFIG: &str = r#"
monitor:
  symbol: DEBT_USDT
  threshold_pct: 1.5
  selection: widest
  poll_interval_ms: 5
  read_timeout_ms: 100
  color: false
venues:
  - id: mexc
    label: MEXC Future
    url: http://127.0.0.1:1/mexc
    sell: { pointer: "/sell" }
    buy: { pointer: "/buy" }
  - id: lbank
    label: LBank Future
    url: http://127.0.0.1:1/lbank
    sell: { pointer: "/sell" }
    buy: { pointer: "/buy" }
"#;

    fn config() -> AppConfig {
        load_config_from_str(CONFIG).unwrap()
    }

    #[tokio::test]
    async fn test_runs_until_shutdown_and_closes_both() {
        let mut a = ScriptedSource::new("mexc").with_quotes("100.0", "98.0");
        let mut b = ScriptedSource::new("lbank").with_quotes("103.0", "100.0");
        let mut sink = BufferSink::default();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = shutdown_tx.send(());
        });

        let summary = run_monitor(&config(), &mut a, &mut b, &mut sink, shutdown_rx)
            .await
            .unwrap();

        assert!(summary.ticks >= 2);
        assert_eq!(summary.emitted, 1);
        assert_eq!(summary.suppressed, summary.ticks - 1);
        assert_eq!(sink.lines.len(), 1);
        assert_eq!(a.close_count(), 1);
        assert_eq!(b.close_count(), 1);
        assert!(!a.is_open() && !b.is_open());
    }

    #[tokio::test]
    async fn test_second_open_failure_releases_first() {
        let mut a = ScriptedSource::new("mexc").with_quotes("100.0", "98.0");
        let mut b = ScriptedSource::new("lbank").failing_open();
        let reads = a.read_counter();
        let mut sink = BufferSink::default();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let result = run_monitor(&config(), &mut a, &mut b, &mut sink, shutdown_rx).await;

        assert!(matches!(result, Err(AppError::Source(_))));
        assert_eq!(a.close_count(), 1);
        assert!(!a.is_open());
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_open_failure_touches_nothing_else() {
        let mut a = ScriptedSource::new("mexc").failing_open();
        let mut b = ScriptedSource::new("lbank");
        let mut sink = BufferSink::default();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let result = run_monitor(&config(), &mut a, &mut b, &mut sink, shutdown_rx).await;

        assert!(result.is_err());
        assert!(!b.is_open());
        assert_eq!(b.close_count(), 0);
    }

    #[tokio::test]
    async fn test_session_loss_still_closes_both() {
        let mut a = ScriptedSource::new("mexc").with_script(vec![
            (ScriptedRead::text("100.0"), ScriptedRead::text("99.0")),
            (ScriptedRead::Lost, ScriptedRead::Lost),
        ]);
        let mut b = ScriptedSource::new("lbank").with_quotes("101.5", "100.5");
        let mut sink = BufferSink::default();
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let result = run_monitor(&config(), &mut a, &mut b, &mut sink, shutdown_rx).await;

        assert!(matches!(result, Err(AppError::Source(_))));
        assert_eq!(a.close_count(), 1);
        assert_eq!(b.close_count(), 1);
    }
}
