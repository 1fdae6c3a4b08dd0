//! Periodic expiry of stale trades.
//!
//! Runs on its own cadence, decoupled from rendering. A window may hold
//! trades up to one period past their retention; that staleness is accepted
//! in exchange for never expiring on the insert path.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, info};

use crate::aggregator::Aggregator;
use crate::shutdown::Shutdown;
use crate::time::now_secs;

pub const DEFAULT_EXPIRY_INTERVAL: Duration = Duration::from_secs(30);

/// Spawns the expiry loop against the wall clock.
pub fn spawn_expiry_task(
    aggregator: Aggregator,
    every: Duration,
    shutdown: Shutdown,
) -> JoinHandle<()> {
    let span = tracing::info_span!("expiry_task", every_secs = every.as_secs());
    tokio::spawn(run_expiry_loop(aggregator, every, now_secs, shutdown).instrument(span))
}

/// Expires all windows every `every` until shutdown. The first pass runs
/// immediately.
pub async fn run_expiry_loop<C>(
    aggregator: Aggregator,
    every: Duration,
    clock: C,
    mut shutdown: Shutdown,
) where
    C: Fn() -> f64 + Send + Sync,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(every_ms = every.as_millis() as u64, "expiry loop started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = aggregator.expire(clock());
                if removed > 0 {
                    debug!(removed, "expired stale trades");
                }
            }
            _ = shutdown.cancelled() => break,
        }
    }

    info!("expiry loop stopped");
}
