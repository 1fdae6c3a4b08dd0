pub mod aggregator;
pub mod error;
pub mod expiry;
pub mod ingest;
pub mod normalizer;
pub mod rolling_window;
pub mod shutdown;
pub mod snapshot;
pub mod source;
pub mod time;
pub mod trackers;
pub mod types;

pub use aggregator::Aggregator;
pub use error::{MalformedTradeError, MarketError};
pub use snapshot::{Snapshot, WindowView};
pub use source::{RawTrade, TradeSource};
pub use types::{Pair, Trade};
