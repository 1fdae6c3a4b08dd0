//! Terminal display.
//!
//! Repaints the whole screen on every frame with ANSI clear + home. No state
//! beyond the start time; everything shown comes from the [`Snapshot`].

use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::{Duration, Instant};

use market::{Pair, Snapshot};

pub const TITLE: &str = "Bitstamp Monitor";

const CLEAR_HOME: &str = "\x1b[2J\x1b[H";
const HIDE_CURSOR: &str = "\x1b[?25l";
const SHOW_CURSOR: &str = "\x1b[?25h";

/// `D days, HH:MM:SS`
pub fn format_uptime(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let days = total / 86_400;
    let hours = (total / 3_600) % 24;
    let minutes = (total / 60) % 60;
    let seconds = total % 60;
    format!("{days} days, {hours:02}:{minutes:02}:{seconds:02}")
}

pub fn render_frame(pair: &Pair, uptime: Duration, snapshot: &Snapshot) -> String {
    let mut out = String::new();

    // writing into a String cannot fail
    let _ = writeln!(out, "{TITLE} - uptime: {}", format_uptime(uptime));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Current Price: ${} {}",
        snapshot.last_price_display, pair.quote
    );
    let _ = writeln!(out);

    for w in &snapshot.windows {
        let _ = writeln!(
            out,
            "{} Trade Volume:  {:.8} {}",
            w.name, w.trade_volume, pair.base
        );
        let _ = writeln!(out, "    Trade Count:     {}", w.trade_count);
        let _ = writeln!(
            out,
            "    Price Volume:    ${:.5} {}",
            w.cash_volume, pair.quote
        );
        let _ = writeln!(
            out,
            "    Average Price:   ${:.5} {}",
            w.average_price, pair.quote
        );
        let _ = writeln!(out);
    }

    out
}

pub struct Display<W: Write> {
    out: W,
    pair: Pair,
    started: Instant,
}

impl<W: Write> Display<W> {
    pub fn new(out: W, pair: Pair) -> Self {
        Self {
            out,
            pair,
            started: Instant::now(),
        }
    }

    pub fn enter(&mut self) -> io::Result<()> {
        write!(self.out, "{HIDE_CURSOR}")?;
        self.out.flush()
    }

    pub fn leave(&mut self) -> io::Result<()> {
        write!(self.out, "{SHOW_CURSOR}")?;
        self.out.flush()
    }

    pub fn paint(&mut self, snapshot: &Snapshot) -> io::Result<()> {
        let frame = render_frame(&self.pair, self.started.elapsed(), snapshot);
        write!(self.out, "{CLEAR_HOME}{frame}")?;
        self.out.flush()
    }
}
