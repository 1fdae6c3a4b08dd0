use serde::Serialize;

use crate::rolling_window::{Aggregate, Window};

/// Read-only view of one window as of the last recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowView {
    pub name: String,
    pub retention_secs: u64,
    pub trade_count: usize,
    pub trade_volume: f64,
    pub cash_volume: f64,
    pub average_price: f64,
}

impl WindowView {
    pub(crate) fn from_window(window: &Window) -> Self {
        let Aggregate {
            trade_count,
            trade_volume,
            cash_volume,
            average_price,
        } = window.aggregate();

        Self {
            name: window.name().to_string(),
            retention_secs: window.retention().as_secs(),
            trade_count,
            trade_volume,
            cash_volume,
            average_price,
        }
    }
}

/// Immutable copy of the aggregator state handed to the display.
///
/// Windows are listed in registration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub last_price_display: String,
    pub has_traded: bool,
    pub windows: Vec<WindowView>,
}

impl Snapshot {
    pub fn window(&self, name: &str) -> Option<&WindowView> {
        self.windows.iter().find(|w| w.name == name)
    }
}
