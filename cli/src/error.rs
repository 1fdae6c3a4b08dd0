use std::path::PathBuf;

use market::MarketError;
use thiserror::Error;

/// Startup failures. Everything here aborts before ingest begins.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to read credentials file {path}: {source}")]
    CredentialsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credentials file {path}: {source}")]
    CredentialsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid pair `{0}`, expected BASE/QUOTE")]
    InvalidPair(String),

    #[error("invalid tracker `{0}`, expected NAME=SECONDS")]
    InvalidTracker(String),

    #[error("no trackers configured")]
    NoTrackers,

    #[error(transparent)]
    Market(#[from] MarketError),
}
