//! Trade ingest
//!
//! Wires a [`TradeSource`] to the [`Aggregator`]:
//!   • the feed task streams raw payloads into a bounded channel
//!   • the processor task normalizes each payload and inserts it
//!
//! A payload that fails normalization is logged and dropped. Nothing on this
//! path is allowed to stop ingestion.

use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, instrument, warn};

use crate::aggregator::Aggregator;
use crate::error::MalformedTradeError;
use crate::normalizer::normalize;
use crate::shutdown::Shutdown;
use crate::source::{RawTrade, TradeSource};
use crate::types::Pair;

pub const FEED_CHANNEL_CAPACITY: usize = 1_024;

/// Normalizes one payload and inserts it. Malformed payloads are logged and
/// leave the aggregator untouched.
pub fn ingest(aggregator: &Aggregator, payload: &RawTrade) -> Result<(), MalformedTradeError> {
    match normalize(payload) {
        Ok(trade) => {
            debug!(price = %trade.price_display, amount = trade.amount, "trade ingested");
            aggregator.insert(trade);
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, payload = %payload, "dropping malformed trade");
            Err(e)
        }
    }
}

pub struct TradeIngestor<S> {
    source: Arc<S>,
    aggregator: Aggregator,
    pair: Pair,
}

impl<S: TradeSource> TradeIngestor<S> {
    pub fn new(source: Arc<S>, aggregator: Aggregator, pair: Pair) -> Arc<Self> {
        Arc::new(Self {
            source,
            aggregator,
            pair,
        })
    }

    /// Spawns the feed and processor tasks. The returned handle completes
    /// once the processor has drained and stopped.
    #[instrument(skip(self, shutdown), fields(pair = %self.pair.id()))]
    pub fn start(self: Arc<Self>, shutdown: Shutdown) -> JoinHandle<()> {
        let (tx, rx) = mpsc::channel(FEED_CHANNEL_CAPACITY);

        let source = Arc::clone(&self.source);
        let pair = self.pair.clone();
        let mut feed_shutdown = shutdown.clone();
        let feed_span = tracing::info_span!("feed_task", pair = %pair.id());
        tokio::spawn(
            async move {
                info!("starting trade feed");
                tokio::select! {
                    res = source.stream_trades(&pair, tx) => {
                        if let Err(e) = res {
                            error!(error = ?e, "trade feed terminated");
                        } else {
                            warn!("trade feed ended");
                        }
                    }
                    _ = feed_shutdown.cancelled() => {
                        info!("trade feed stopped by shutdown");
                    }
                }
            }
            .instrument(feed_span),
        );

        let processor_span = tracing::info_span!("ingest_task", pair = %self.pair.id());
        tokio::spawn(
            async move {
                self.process_trade_stream(rx, shutdown).await;
            }
            .instrument(processor_span),
        )
    }

    pub async fn process_trade_stream(&self, mut rx: Receiver<RawTrade>, mut shutdown: Shutdown) {
        info!("beginning trade processing loop");
        let mut dropped: u64 = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(payload) = msg else { break };
                    if ingest(&self.aggregator, &payload).is_err() {
                        dropped += 1;
                    }
                }
                _ = shutdown.cancelled() => break,
            }
        }

        info!(dropped, "trade processing loop terminated");
    }
}
