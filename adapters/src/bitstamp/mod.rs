pub mod errors;
pub mod parser;
pub mod provider;
pub mod types;
pub mod ws;

pub use errors::FeedError;
pub use provider::BitstampProvider;
pub use ws::BitstampWsClient;

pub const DEFAULT_WS_URL: &str = "wss://ws.bitstamp.net";

/// Public live-trades channel for a lower-case pair symbol such as `xrpusd`.
pub fn live_trades_channel(symbol: &str) -> String {
    format!("live_trades_{symbol}")
}
