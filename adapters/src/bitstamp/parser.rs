//! Bitstamp WebSocket v2 frame parser.
//!
//! Frames look like:
//!
//! ```jsonc
//! { "event": "trade", "channel": "live_trades_xrpusd", "data": { /* trade */ } }
//! ```
//!
//! The parser is pure: it only classifies frames. Trade payloads are not
//! validated here, the normalizer in `market` owns that.

use crate::bitstamp::errors::FeedError;
use crate::bitstamp::types::{Envelope, FeedEvent};

pub fn parse_feed_event(raw: &str) -> Result<FeedEvent, FeedError> {
    let env: Envelope = serde_json::from_str(raw)?;

    let event = match env.event.as_str() {
        "trade" => FeedEvent::Trade {
            channel: env.channel,
            data: env.data,
        },
        "bts:subscription_succeeded" => FeedEvent::Subscribed {
            channel: env.channel,
        },
        "bts:request_reconnect" => FeedEvent::ReconnectRequested,
        "bts:heartbeat" => FeedEvent::Heartbeat,
        "bts:error" => FeedEvent::Error {
            message: env
                .data
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown error")
                .to_string(),
        },
        other => FeedEvent::Unknown(other.to_string()),
    };

    Ok(event)
}
