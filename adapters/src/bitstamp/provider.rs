use async_trait::async_trait;
use market::{Pair, RawTrade, TradeSource};
use tokio::sync::mpsc::Sender;

use super::{live_trades_channel, ws::BitstampWsClient};

/// [`TradeSource`] backed by Bitstamp's live-trades channel.
pub struct BitstampProvider {
    client: BitstampWsClient,
}

impl BitstampProvider {
    pub fn new(ws_url: String) -> Self {
        Self {
            client: BitstampWsClient::new(ws_url),
        }
    }

    pub fn from_client(client: BitstampWsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TradeSource for BitstampProvider {
    async fn stream_trades(&self, pair: &Pair, sink: Sender<RawTrade>) -> anyhow::Result<()> {
        let channel = live_trades_channel(&pair.symbol());
        self.client.run_ws_loop(&channel, sink).await
    }
}
