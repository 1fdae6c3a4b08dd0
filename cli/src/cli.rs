use std::path::PathBuf;

use clap::Parser;

use crate::config::TrackerSpec;

#[derive(Debug, Parser)]
#[clap(name = "tradewatch", version, about = "Live rolling-window trade monitor")]
pub struct Cli {
    /// Credentials JSON file (Pushover token/user). Defaults to ./credentials.json when present.
    #[clap(long)]
    pub credentials: Option<PathBuf>,

    /// Currency pair to watch, as BASE/QUOTE
    #[clap(long)]
    pub pair: Option<String>,

    /// Rolling window as NAME=SECONDS; repeat for several windows
    #[clap(long = "tracker")]
    pub trackers: Vec<TrackerSpec>,

    /// Bitstamp WebSocket endpoint
    #[clap(long)]
    pub ws_url: Option<String>,

    /// Milliseconds to wait before reconnecting to the feed
    #[clap(long)]
    pub reconnect_delay_ms: Option<u64>,

    /// Seconds between expiry passes
    #[clap(long)]
    pub expiry_interval_secs: Option<u64>,

    /// Milliseconds between display refreshes
    #[clap(long)]
    pub display_interval_ms: Option<u64>,

    /// Directory for debug.log and trades.log
    #[clap(long)]
    pub log_dir: Option<PathBuf>,

    /// Run headless: no terminal display, log to stdout instead of files
    #[clap(long)]
    pub no_display: bool,

    /// Never send the startup push notification
    #[clap(long)]
    pub no_notify: bool,
}
