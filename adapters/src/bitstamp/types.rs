use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every Bitstamp WebSocket frame has this shape, in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn subscribe(channel: &str) -> Self {
        Self {
            event: "bts:subscribe".into(),
            channel: String::new(),
            data: serde_json::json!({ "channel": channel }),
        }
    }
}

/// Decoded server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Executed trade; `data` is forwarded untouched to the normalizer.
    Trade { channel: String, data: Value },
    Subscribed { channel: String },
    /// Server is about to go away; the client should reconnect.
    ReconnectRequested,
    Heartbeat,
    Error { message: String },
    Unknown(String),
}
