use std::time::Duration;

use common::logger::TRADES_TARGET;
use futures::{SinkExt, StreamExt};
use market::RawTrade;
use tokio::sync::mpsc::Sender;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::bitstamp::errors::FeedError;
use crate::bitstamp::parser::parse_feed_event;
use crate::bitstamp::types::{Envelope, FeedEvent};

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Why a single connection ended.
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The consumer dropped its receiver; stop for good.
    SinkClosed,
    /// Server closed, asked us to reconnect, or the stream ended.
    Reconnect,
}

/// Client for Bitstamp's public WebSocket v2 API.
///
/// This client:
/// - subscribes to one channel (`bts:subscribe`)
/// - forwards the `data` object of every `trade` event into a channel
/// - reconnects after a fixed delay on any disconnect
pub struct BitstampWsClient {
    pub ws_url: String,
    pub reconnect_delay: Duration,
}

impl BitstampWsClient {
    pub fn new(ws_url: String) -> Self {
        Self {
            ws_url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    async fn send_subscription(
        write: &mut (impl futures::Sink<Message, Error = tungstenite::Error> + Unpin),
        channel: &str,
    ) -> Result<(), FeedError> {
        let text = serde_json::to_string(&Envelope::subscribe(channel))?;
        write.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Main WebSocket event loop.
    ///
    /// Only returns once `sink` is closed. Connection failures and server
    /// disconnects are logged and retried.
    pub async fn run_ws_loop(&self, channel: &str, sink: Sender<RawTrade>) -> anyhow::Result<()> {
        loop {
            if sink.is_closed() {
                return Ok(());
            }

            info!(url = %self.ws_url, channel, "connecting to bitstamp websocket");

            match connect_async(&self.ws_url).await {
                Ok((ws, _)) => {
                    info!("connected to bitstamp websocket");
                    match self.run_session(ws, channel, &sink).await {
                        Ok(SessionEnd::SinkClosed) => {
                            info!("trade sink closed; leaving websocket loop");
                            return Ok(());
                        }
                        Ok(SessionEnd::Reconnect) => {}
                        Err(e) => error!(error = %e, "websocket session failed"),
                    }
                }
                Err(e) => warn!(error = %e, "websocket connection failed"),
            }

            info!(delay_ms = self.reconnect_delay.as_millis() as u64, "reconnecting");
            tokio::time::sleep(self.reconnect_delay).await;
        }
    }

    async fn run_session<S>(
        &self,
        ws: S,
        channel: &str,
        sink: &Sender<RawTrade>,
    ) -> Result<SessionEnd, FeedError>
    where
        S: futures::Stream<Item = Result<Message, tungstenite::Error>>
            + futures::Sink<Message, Error = tungstenite::Error>
            + Unpin,
    {
        let (mut write, mut read) = ws.split();
        Self::send_subscription(&mut write, channel).await?;

        while let Some(msg) = read.next().await {
            let raw = match msg? {
                Message::Text(t) => t,
                Message::Close(frame) => {
                    warn!(?frame, "server closed websocket");
                    return Ok(SessionEnd::Reconnect);
                }
                _ => continue,
            };

            let event = match parse_feed_event(raw.as_str()) {
                Ok(ev) => ev,
                Err(e) => {
                    warn!(error = %e, raw = %raw.as_str(), "unparseable websocket frame");
                    continue;
                }
            };

            match event {
                FeedEvent::Trade { data, .. } => {
                    info!(target: TRADES_TARGET, "{}", raw.as_str());
                    if sink.send(data).await.is_err() {
                        return Ok(SessionEnd::SinkClosed);
                    }
                }
                FeedEvent::Subscribed { channel } => info!(%channel, "subscription confirmed"),
                FeedEvent::ReconnectRequested => {
                    warn!("bitstamp requested reconnect");
                    return Ok(SessionEnd::Reconnect);
                }
                FeedEvent::Heartbeat => debug!("heartbeat"),
                FeedEvent::Error { message } => return Err(FeedError::Rejected(message)),
                FeedEvent::Unknown(event) => debug!(%event, "ignoring unknown event"),
            }
        }

        warn!("websocket stream ended");
        Ok(SessionEnd::Reconnect)
    }
}
