use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use adapters::bitstamp::DEFAULT_WS_URL;
use adapters::bitstamp::ws::DEFAULT_RECONNECT_DELAY;
use market::Pair;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::AppError;

pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// A rolling window requested at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerSpec {
    pub name: String,
    pub retention: Duration,
}

impl TrackerSpec {
    pub fn new(name: impl Into<String>, retention_secs: u64) -> Self {
        Self {
            name: name.into(),
            retention: Duration::from_secs(retention_secs),
        }
    }
}

/// Parses `NAME=SECONDS`, e.g. `15 Min=900`. The name may contain spaces.
impl FromStr for TrackerSpec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidTracker(s.to_string());

        let (name, secs) = s.rsplit_once('=').ok_or_else(invalid)?;
        let name = name.trim();
        let secs: u64 = secs.trim().parse().map_err(|_| invalid())?;

        if name.is_empty() || secs == 0 {
            return Err(invalid());
        }

        Ok(Self::new(name, secs))
    }
}

pub fn parse_pair(s: &str) -> Result<Pair, AppError> {
    let (base, quote) = s
        .split_once('/')
        .ok_or_else(|| AppError::InvalidPair(s.to_string()))?;

    let (base, quote) = (base.trim(), quote.trim());
    if base.is_empty() || quote.is_empty() {
        return Err(AppError::InvalidPair(s.to_string()));
    }

    Ok(Pair::new(base.to_uppercase(), quote.to_uppercase()))
}

#[derive(Clone, Deserialize)]
pub struct PushoverCredentials {
    pub token: String,
    pub user: String,
}

impl fmt::Debug for PushoverCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushoverCredentials")
            .field("token", &"<redacted>")
            .field("user", &"<redacted>")
            .finish()
    }
}

/// On-disk credentials file. Sections other than `pushover` (such as
/// exchange API keys) are accepted and ignored.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub pushover: Option<PushoverCredentials>,
}

impl Credentials {
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|source| AppError::CredentialsIo {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| AppError::CredentialsFormat {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Feed endpoint.
    pub ws_url: String,

    /// Pause between feed reconnect attempts.
    pub reconnect_delay: Duration,

    /// The single pair being monitored.
    pub pair: Pair,

    /// Windows to register, in display order.
    pub trackers: Vec<TrackerSpec>,

    /// Cadence of the expiry pass. Bounds how stale a window may get.
    pub expiry_interval: Duration,

    /// Cadence of recompute + render.
    pub display_interval: Duration,

    pub log_dir: PathBuf,

    /// Paint the terminal display. When false, logs go to stdout instead.
    pub display: bool,

    // =========================
    // Notifications
    // =========================
    /// Absent when no credentials were configured; notifications are then off.
    pub pushover: Option<PushoverCredentials>,

    pub notify_on_start: bool,

    /// Total delivery attempts per notification.
    pub notify_retries: u32,

    pub notify_retry_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: DEFAULT_WS_URL.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            pair: Pair::new("XRP".into(), "USD".into()),
            trackers: vec![
                TrackerSpec::new("15 Min", 900),
                TrackerSpec::new("1 Hour", 3_600),
            ],
            expiry_interval: market::expiry::DEFAULT_EXPIRY_INTERVAL,
            display_interval: Duration::from_secs(1),
            log_dir: PathBuf::from("./log/"),
            display: true,
            pushover: None,
            notify_on_start: true,
            notify_retries: 5,
            notify_retry_interval: Duration::from_secs(30),
        }
    }
}

impl AppConfig {
    /// Defaults, then credentials file, then environment, then CLI flags.
    pub fn load(cli: &Cli) -> Result<Self, AppError> {
        let mut cfg = Self::default();

        match &cli.credentials {
            Some(path) => cfg.pushover = Credentials::from_file(path)?.pushover,
            None => {
                let default = Path::new(DEFAULT_CREDENTIALS_PATH);
                if default.exists() {
                    cfg.pushover = Credentials::from_file(default)?.pushover;
                }
            }
        }

        cfg.apply_env(|k| std::env::var(k).ok())?;
        cfg.apply_cli(cli)?;

        if cfg.trackers.is_empty() {
            return Err(AppError::NoTrackers);
        }

        Ok(cfg)
    }

    /// Recognised variables:
    /// `TRADEWATCH_WS_URL`, `TRADEWATCH_PAIR`, `TRADEWATCH_LOG_DIR`,
    /// `PUSHOVER_TOKEN` + `PUSHOVER_USER` (both required to take effect).
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = var("TRADEWATCH_WS_URL") {
            self.ws_url = url;
        }
        if let Some(pair) = var("TRADEWATCH_PAIR") {
            self.pair = parse_pair(&pair)?;
        }
        if let Some(dir) = var("TRADEWATCH_LOG_DIR") {
            self.log_dir = PathBuf::from(dir);
        }
        if let (Some(token), Some(user)) = (var("PUSHOVER_TOKEN"), var("PUSHOVER_USER")) {
            self.pushover = Some(PushoverCredentials { token, user });
        }
        Ok(())
    }

    pub fn apply_cli(&mut self, cli: &Cli) -> Result<(), AppError> {
        if let Some(url) = &cli.ws_url {
            self.ws_url = url.clone();
        }
        if let Some(ms) = cli.reconnect_delay_ms {
            self.reconnect_delay = Duration::from_millis(ms);
        }
        if let Some(pair) = &cli.pair {
            self.pair = parse_pair(pair)?;
        }
        if !cli.trackers.is_empty() {
            self.trackers = cli.trackers.clone();
        }
        if let Some(secs) = cli.expiry_interval_secs {
            self.expiry_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(ms) = cli.display_interval_ms {
            self.display_interval = Duration::from_millis(ms.max(10));
        }
        if let Some(dir) = &cli.log_dir {
            self.log_dir = dir.clone();
        }
        if cli.no_display {
            self.display = false;
        }
        if cli.no_notify {
            self.notify_on_start = false;
        }
        Ok(())
    }
}
