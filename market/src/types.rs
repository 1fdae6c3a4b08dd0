use serde::Serialize;

/// A single executed trade, as accepted by the aggregator.
///
/// Immutable once built. The aggregator shares one allocation across every
/// window the trade lands in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    /// Seconds since the epoch, as reported by the feed.
    pub timestamp: f64,
    pub amount: f64,
    pub price: f64,
    /// Price exactly as the feed printed it. Shown verbatim, never reformatted.
    pub price_display: String,
}

impl Trade {
    pub fn new(timestamp: f64, amount: f64, price: f64, price_display: impl Into<String>) -> Self {
        Self {
            timestamp,
            amount,
            price,
            price_display: price_display.into(),
        }
    }

    /// Quote-currency value of the trade.
    pub fn cash_value(&self) -> f64 {
        self.amount * self.price
    }
}

/// Currency pair being monitored, e.g. XRP/USD.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize)]
pub struct Pair {
    pub base: String,
    pub quote: String,
}

impl Pair {
    pub fn new(base: String, quote: String) -> Self {
        Self { base, quote }
    }

    pub fn id(&self) -> String {
        format!("{}/{}", self.base, self.quote)
    }

    /// Lower-case concatenated symbol used by exchange channel names (`xrpusd`).
    pub fn symbol(&self) -> String {
        format!("{}{}", self.base, self.quote).to_lowercase()
    }
}
