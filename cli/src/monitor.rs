//! Foreground loop: recompute → snapshot → paint, once per tick.
//!
//! Also owns the one-shot startup notification, sent the first time a tick
//! sees that at least one trade has arrived.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use market::shutdown::Shutdown;
use market::{Aggregator, Snapshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, error, info, warn};

use crate::display::Display;
use crate::notifier::{Notifier, startup_notification};

pub struct MonitorLoop<W: Write> {
    aggregator: Aggregator,
    display: Option<Display<W>>,
    notifier: Option<Arc<dyn Notifier>>,
    every: Duration,
    started_at: DateTime<Local>,
    notified: bool,
}

impl<W: Write> MonitorLoop<W> {
    pub fn new(aggregator: Aggregator, every: Duration) -> Self {
        Self {
            aggregator,
            display: None,
            notifier: None,
            every,
            started_at: Local::now(),
            notified: false,
        }
    }

    pub fn with_display(mut self, display: Display<W>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// One iteration. Returns the snapshot that was shown.
    pub fn tick(&mut self) -> Snapshot {
        let recomputed = self.aggregator.recompute();
        let snapshot = self.aggregator.snapshot();

        match self.display.as_mut() {
            Some(display) => {
                if let Err(e) = display.paint(&snapshot) {
                    warn!(error = %e, "failed to paint display");
                }
            }
            None if recomputed => {
                for w in &snapshot.windows {
                    info!(
                        window = %w.name,
                        price = %snapshot.last_price_display,
                        trade_count = w.trade_count,
                        trade_volume = w.trade_volume,
                        cash_volume = w.cash_volume,
                        average_price = w.average_price,
                        "window updated"
                    );
                }
            }
            None => {}
        }

        if !self.notified && snapshot.has_traded {
            self.notified = true;
            self.send_startup_notification(&snapshot.last_price_display);
        }

        snapshot
    }

    /// Fire-and-forget: delivery (with its retries) runs in its own task so
    /// the display never stalls.
    fn send_startup_notification(&self, price: &str) {
        let Some(notifier) = self.notifier.clone() else {
            debug!("no notifier configured; skipping startup notification");
            return;
        };

        let note = startup_notification(&self.started_at, price);
        let span = tracing::info_span!("startup_notification");
        tokio::spawn(
            async move {
                if let Err(e) = notifier.notify(&note).await {
                    error!(error = %e, "startup notification failed");
                }
            }
            .instrument(span),
        );
    }

    pub async fn run(mut self, mut shutdown: Shutdown) {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        if let Some(display) = self.display.as_mut() {
            if let Err(e) = display.enter() {
                warn!(error = %e, "failed to prepare terminal");
            }
        }

        info!(every_ms = self.every.as_millis() as u64, "monitor loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick();
                }
                _ = shutdown.cancelled() => break,
            }
        }

        if let Some(display) = self.display.as_mut() {
            if let Err(e) = display.leave() {
                warn!(error = %e, "failed to restore terminal");
            }
        }

        info!("monitor loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{Notification, NotifyError};
    use market::Trade;
    use market::shutdown::ShutdownTrigger;
    use std::io;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    #[async_trait::async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, n: &Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(n.clone());
            Ok(())
        }
    }

    fn aggregator() -> Aggregator {
        let agg = Aggregator::new();
        agg.add_tracker("Test", Duration::from_secs(10)).unwrap();
        agg
    }

    #[tokio::test]
    async fn tick_recomputes_before_snapshot() {
        let agg = aggregator();
        agg.insert(Trade::new(100.0, 2.0, 5.0, "5.00"));

        let mut m: MonitorLoop<Vec<u8>> = MonitorLoop::new(agg.clone(), Duration::from_secs(1));
        let snap = m.tick();

        assert_eq!(snap.window("Test").unwrap().cash_volume, 10.0);
        assert!(!agg.is_dirty());
    }

    #[tokio::test]
    async fn startup_notification_is_sent_exactly_once_after_first_trade() {
        let agg = aggregator();
        let rec = Arc::new(RecordingNotifier::default());
        let mut m: MonitorLoop<Vec<u8>> = MonitorLoop::new(agg.clone(), Duration::from_secs(1))
            .with_notifier(rec.clone());

        m.tick();
        tokio::task::yield_now().await;
        assert!(rec.sent.lock().unwrap().is_empty());

        agg.insert(Trade::new(100.0, 2.0, 5.0, "0.31000"));
        m.tick();
        agg.insert(Trade::new(101.0, 2.0, 5.0, "0.32000"));
        m.tick();

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let sent = rec.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Bot Started");
        assert!(sent[0].message.ends_with("Price: 0.31000"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_paints_until_shutdown() {
        let agg = aggregator();
        agg.insert(Trade::new(100.0, 2.0, 5.0, "5.00"));

        let pair = market::Pair::new("XRP".into(), "USD".into());
        let display = Display::new(Vec::new(), pair);
        let m = MonitorLoop::new(agg, Duration::from_secs(1)).with_display(display);

        let trigger = ShutdownTrigger::new();
        let task = tokio::spawn(m.run(trigger.subscribe()));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        trigger.trigger();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("monitor loop did not stop")
            .unwrap();
    }

    struct BrokenTerminal;

    impl Write for BrokenTerminal {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn terminal_write_failures_are_logged() {
        let pair = market::Pair::new("XRP".into(), "USD".into());
        let m = MonitorLoop::new(aggregator(), Duration::from_secs(1))
            .with_display(Display::new(BrokenTerminal, pair));

        let trigger = ShutdownTrigger::new();
        let shutdown = trigger.subscribe();
        trigger.trigger();

        m.run(shutdown).await;

        assert!(logs_contain("failed to prepare terminal"));
        assert!(logs_contain("failed to restore terminal"));
    }
}
