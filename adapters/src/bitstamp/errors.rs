use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("invalid json from bitstamp: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bitstamp rejected request: {0}")]
    Rejected(String),
}
