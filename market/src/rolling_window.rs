use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::types::Trade;

/// Derived statistics over the trades currently held by a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Aggregate {
    pub trade_count: usize,
    /// Sum of traded amounts, in base currency.
    pub trade_volume: f64,
    /// Sum of `amount * price`, in quote currency.
    pub cash_volume: f64,
    /// Simple mean of trade prices (not volume weighted). `0.0` when empty.
    pub average_price: f64,
}

impl Aggregate {
    /// Single pass over `trades`.
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        let mut agg = Self::default();
        let mut price_sum = 0.0;

        for trade in trades {
            agg.trade_count += 1;
            agg.trade_volume += trade.amount;
            agg.cash_volume += trade.cash_value();
            price_sum += trade.price;
        }

        if agg.trade_count > 0 {
            agg.average_price = price_sum / agg.trade_count as f64;
        }

        agg
    }
}

/// Named rolling window over the trade stream.
///
/// Trades are kept in arrival order. Eviction is driven externally by
/// [`expire`](Self::expire); pushing never evicts.
#[derive(Debug)]
pub struct Window {
    name: String,
    retention: Duration,
    trades: VecDeque<Arc<Trade>>,
    aggregate: Aggregate,
}

impl Window {
    pub fn new(name: impl Into<String>, retention: Duration) -> Self {
        Self {
            name: name.into(),
            retention,
            trades: VecDeque::new(),
            aggregate: Aggregate::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn push(&mut self, trade: Arc<Trade>) {
        self.trades.push_back(trade);
    }

    /// Drops every trade older than the retention at `now_secs`.
    ///
    /// Feed order is not guaranteed to be timestamp order, so the whole
    /// sequence is filtered rather than popped from the front.
    /// Returns the number of trades removed.
    pub fn expire(&mut self, now_secs: f64) -> usize {
        let retention = self.retention.as_secs_f64();
        let before = self.trades.len();

        self.trades.retain(|t| now_secs - t.timestamp <= retention);

        before - self.trades.len()
    }

    /// Rebuilds the cached aggregate from the current trades.
    pub fn recompute(&mut self) -> Aggregate {
        self.aggregate = Aggregate::from_trades(self.trades.iter().map(Arc::as_ref));
        self.aggregate
    }

    /// Aggregate as of the last [`recompute`](Self::recompute).
    pub fn aggregate(&self) -> Aggregate {
        self.aggregate
    }

    pub fn trades(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(ts: f64, amount: f64, price: f64) -> Arc<Trade> {
        Arc::new(Trade::new(ts, amount, price, format!("{price:.2}")))
    }

    #[test]
    fn empty_aggregate_is_all_zero() {
        let agg = Aggregate::from_trades(std::iter::empty());
        assert_eq!(agg, Aggregate::default());
        assert_eq!(agg.average_price, 0.0);
        assert!(!agg.average_price.is_nan());
    }

    #[test]
    fn recompute_matches_hand_computed_values() {
        let mut w = Window::new("Test", Duration::from_secs(10));
        w.push(trade(100.0, 1.0, 10.0));
        w.push(trade(100.0, 3.0, 20.0));

        let agg = w.recompute();
        assert_eq!(agg.trade_count, 2);
        assert_eq!(agg.trade_volume, 4.0);
        assert_eq!(agg.cash_volume, 70.0);
        assert_eq!(agg.average_price, 15.0);
    }

    #[test]
    fn aggregate_is_cached_until_recompute() {
        let mut w = Window::new("Test", Duration::from_secs(10));
        w.push(trade(100.0, 2.0, 5.0));

        assert_eq!(w.aggregate(), Aggregate::default());
        w.recompute();
        assert_eq!(w.aggregate().trade_volume, 2.0);
    }

    #[test]
    fn expire_keeps_trades_exactly_at_retention_boundary() {
        let mut w = Window::new("Test", Duration::from_secs(10));
        w.push(trade(100.0, 1.0, 1.0));

        assert_eq!(w.expire(110.0), 0);
        assert_eq!(w.len(), 1);

        assert_eq!(w.expire(110.5), 1);
        assert!(w.is_empty());
    }

    #[test]
    fn expire_handles_out_of_order_arrivals() {
        let mut w = Window::new("Test", Duration::from_secs(10));
        w.push(trade(105.0, 1.0, 1.0));
        w.push(trade(90.0, 1.0, 1.0)); // late delivery
        w.push(trade(108.0, 1.0, 1.0));

        assert_eq!(w.expire(112.0), 1);
        let left: Vec<f64> = w.trades().map(|t| t.timestamp).collect();
        assert_eq!(left, vec![105.0, 108.0]);
    }
}
