//! Rolling-window trade aggregator.
//!
//! A cloneable handle over a single mutex-guarded [`TrackerSet`]. Three
//! parties touch it concurrently:
//!   • the ingest task calls [`Aggregator::insert`]
//!   • the expiry task calls [`Aggregator::expire`]
//!   • the display loop calls [`Aggregator::recompute`] then [`Aggregator::snapshot`]
//!
//! Every operation is short and synchronous and runs entirely under the
//! one lock, so inserts and expiries form a total order and no reader ever
//! sees a half-updated window.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::MarketError;
use crate::rolling_window::Aggregate;
use crate::snapshot::{Snapshot, WindowView};
use crate::trackers::TrackerSet;
use crate::types::Trade;

/// Price shown before the first trade arrives.
pub const INITIAL_PRICE_DISPLAY: &str = "0";

#[derive(Debug)]
struct AggregatorState {
    trackers: TrackerSet,
    last_price_display: String,
    /// Cached aggregates are stale relative to the trade sequences.
    dirty: bool,
    /// At least one trade has been ingested since startup.
    has_traded: bool,
}

impl Default for AggregatorState {
    fn default() -> Self {
        Self {
            trackers: TrackerSet::new(),
            last_price_display: INITIAL_PRICE_DISPLAY.to_string(),
            dirty: false,
            has_traded: false,
        }
    }
}

#[derive(Clone, Default)]
pub struct Aggregator {
    inner: Arc<Mutex<AggregatorState>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a window.
    ///
    /// Must be called before ingest starts; windows added later only see
    /// trades inserted after registration.
    pub fn add_tracker(
        &self,
        name: impl Into<String>,
        retention: Duration,
    ) -> Result<(), MarketError> {
        let name = name.into();
        self.inner.lock().trackers.add_tracker(name.clone(), retention)?;
        debug!(window = %name, retention_secs = retention.as_secs(), "tracker registered");
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.lock().trackers.names()
    }

    pub fn insert(&self, trade: Trade) {
        let trade = Arc::new(trade);
        let mut g = self.inner.lock();

        g.last_price_display.clone_from(&trade.price_display);
        g.trackers.insert(trade);
        g.dirty = true;
        g.has_traded = true;
    }

    /// Drops trades older than each window's retention at `now_secs`.
    /// Marks the state dirty when anything was removed.
    pub fn expire(&self, now_secs: f64) -> usize {
        let mut g = self.inner.lock();
        let removed = g.trackers.expire(now_secs);
        if removed > 0 {
            g.dirty = true;
        }
        trace!(removed, "expiry pass");
        removed
    }

    /// Rebuilds every window's aggregate if anything changed since the last
    /// call. Returns whether work was done.
    pub fn recompute(&self) -> bool {
        let mut g = self.inner.lock();
        if !g.dirty {
            return false;
        }
        g.trackers.recompute();
        // cleared while still holding the lock: a racing insert waits and re-dirties
        g.dirty = false;
        true
    }

    pub fn snapshot(&self) -> Snapshot {
        let g = self.inner.lock();
        Snapshot {
            last_price_display: g.last_price_display.clone(),
            has_traded: g.has_traded,
            windows: g.trackers.iter().map(WindowView::from_window).collect(),
        }
    }

    pub fn last_price_display(&self) -> String {
        self.inner.lock().last_price_display.clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.lock().dirty
    }

    pub fn has_traded(&self) -> bool {
        self.inner.lock().has_traded
    }

    /// Cached aggregate of `name` as of the last recompute.
    pub fn aggregate(&self, name: &str) -> Result<Aggregate, MarketError> {
        self.inner.lock().trackers.get(name).map(|w| w.aggregate())
    }

    pub fn retention(&self, name: &str) -> Result<Duration, MarketError> {
        self.inner.lock().trackers.get(name).map(|w| w.retention())
    }

    /// Live number of trades held by `name`, independent of recompute.
    pub fn trade_count(&self, name: &str) -> Result<usize, MarketError> {
        self.inner.lock().trackers.get(name).map(|w| w.len())
    }
}
