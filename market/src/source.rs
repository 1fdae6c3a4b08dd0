use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc::Sender;

use crate::types::Pair;

/// Raw trade payload as delivered by a feed, before normalization.
pub type RawTrade = Value;

/// A live feed of executed trades.
///
/// Implementations deliver every trade payload for `pair` into `sink` until
/// the sink is closed or the feed fails for good. Reconnect policy belongs to
/// the implementation.
#[async_trait]
pub trait TradeSource: Send + Sync + 'static {
    async fn stream_trades(&self, pair: &Pair, sink: Sender<RawTrade>) -> anyhow::Result<()>;
}
