use std::sync::Arc;
use std::time::Duration;

use crate::error::MarketError;
use crate::rolling_window::Window;
use crate::types::Trade;

/// Fixed, ordered set of named windows that all see the same trade stream.
///
/// Registration order is kept and used as display order. The set is small
/// (a handful of horizons), so lookups are linear.
#[derive(Debug, Default)]
pub struct TrackerSet {
    windows: Vec<Window>,
}

impl TrackerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty window. A second registration under the same name
    /// is rejected and leaves the existing window untouched.
    pub fn add_tracker(
        &mut self,
        name: impl Into<String>,
        retention: Duration,
    ) -> Result<(), MarketError> {
        let name = name.into();
        if self.windows.iter().any(|w| w.name() == name) {
            return Err(MarketError::DuplicateWindow(name));
        }
        self.windows.push(Window::new(name, retention));
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.windows.iter().map(|w| w.name().to_string()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&Window, MarketError> {
        self.windows
            .iter()
            .find(|w| w.name() == name)
            .ok_or_else(|| MarketError::UnknownWindow(name.to_string()))
    }

    /// Appends the trade to every window.
    pub fn insert(&mut self, trade: Arc<Trade>) {
        for window in &mut self.windows {
            window.push(Arc::clone(&trade));
        }
    }

    /// Expires every window against `now_secs`; returns total trades removed.
    pub fn expire(&mut self, now_secs: f64) -> usize {
        self.windows.iter_mut().map(|w| w.expire(now_secs)).sum()
    }

    pub fn recompute(&mut self) {
        for window in &mut self.windows {
            window.recompute();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
