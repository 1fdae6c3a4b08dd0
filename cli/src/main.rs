use std::sync::Arc;

use adapters::bitstamp::{BitstampProvider, BitstampWsClient};
use anyhow::Context;
use clap::Parser;
use common::logger::{LogSink, init_logger};
use market::{
    Aggregator, expiry::spawn_expiry_task, ingest::TradeIngestor, shutdown::ShutdownTrigger,
};
use tradewatch::{
    cli::Cli,
    config::AppConfig,
    display::Display,
    error::AppError,
    monitor::MonitorLoop,
    notifier::{Notifier, PushoverNotifier},
};

/// Registers every configured window. Must run before the feed starts.
fn build_aggregator(cfg: &AppConfig) -> Result<Aggregator, AppError> {
    let aggregator = Aggregator::new();
    for t in &cfg.trackers {
        aggregator.add_tracker(t.name.clone(), t.retention)?;
    }
    Ok(aggregator)
}

fn build_notifier(cfg: &AppConfig) -> anyhow::Result<Option<Arc<dyn Notifier>>> {
    if !cfg.notify_on_start {
        return Ok(None);
    }
    let Some(creds) = cfg.pushover.clone() else {
        tracing::info!("no pushover credentials; startup notification disabled");
        return Ok(None);
    };

    let notifier = PushoverNotifier::new(creds, cfg.notify_retries, cfg.notify_retry_interval)
        .context("failed to build pushover client")?;
    Ok(Some(Arc::new(notifier)))
}

/// Returns once the signal fires or can no longer be listened for. Either way
/// the caller proceeds to an orderly shutdown.
async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "failed to listen for shutdown signal; stopping"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::load(&cli)?;

    let sink = if cfg.display {
        LogSink::Files(cfg.log_dir.clone())
    } else {
        LogSink::Stdout
    };
    init_logger("tradewatch", &sink).context("failed to initialize logging")?;

    tracing::info!(pair = %cfg.pair.id(), ws_url = %cfg.ws_url, "Starting tradewatch...");

    let aggregator = build_aggregator(&cfg)?;
    let notifier = build_notifier(&cfg)?;
    let trigger = ShutdownTrigger::new();

    let client =
        BitstampWsClient::new(cfg.ws_url.clone()).with_reconnect_delay(cfg.reconnect_delay);
    let provider = Arc::new(BitstampProvider::from_client(client));
    let ingest = TradeIngestor::new(provider, aggregator.clone(), cfg.pair.clone())
        .start(trigger.subscribe());

    let expiry = spawn_expiry_task(aggregator.clone(), cfg.expiry_interval, trigger.subscribe());

    let mut monitor = MonitorLoop::new(aggregator, cfg.display_interval);
    if cfg.display {
        monitor = monitor.with_display(Display::new(std::io::stdout(), cfg.pair.clone()));
    }
    if let Some(n) = notifier {
        monitor = monitor.with_notifier(n);
    }
    let display = tokio::spawn(monitor.run(trigger.subscribe()));

    wait_for_shutdown(tokio::signal::ctrl_c()).await;
    trigger.trigger();

    for (name, handle) in [("ingest", ingest), ("expiry", expiry), ("display", display)] {
        if let Err(e) = handle.await {
            tracing::error!(task = name, error = %e, "task did not shut down cleanly");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use market::shutdown::ShutdownTrigger;
    use std::io::{self, Write};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Writer the test can still read after the monitor takes ownership.
    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn signal_listener_failure_still_restores_terminal() {
        let out = SharedBuf::default();
        let pair = market::Pair::new("XRP".into(), "USD".into());
        let monitor = MonitorLoop::new(Aggregator::new(), Duration::from_millis(10))
            .with_display(Display::new(out.clone(), pair));

        let trigger = ShutdownTrigger::new();
        let display = tokio::spawn(monitor.run(trigger.subscribe()));

        wait_for_shutdown(async { Err(io::Error::other("no signal handler")) }).await;
        trigger.trigger();

        tokio::time::timeout(Duration::from_secs(1), display)
            .await
            .expect("monitor loop kept running")
            .unwrap();

        let written = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(written.starts_with("\x1b[?25l"));
        assert!(written.ends_with("\x1b[?25h"));
    }
}
