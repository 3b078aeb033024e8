//! Logging setup for the binary and the end-of-run summary colours.
//!
//! Records are prefixed with the crate name; records emitted on a pool thread also carry the
//! worker's thread name (`worker-<id>`), so interleaved per-chunk lines can be told apart.

use colored::{ColoredString, Colorize};
use env_logger::Builder;
use log::{Level, LevelFilter, Record};
use std::io::Write;
use std::thread;

/// Thread-name prefix given to pool threads in `pipeline::pool`.
pub const WORKER_THREAD_PREFIX: &str = "worker-";

/// Info for this crate (Debug when `verbose`), Warn for dependencies; `RUST_LOG` still applies.
/// Safe to call more than once: later calls leave the first logger in place.
pub fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let _ = Builder::from_default_env()
        .filter_level(LevelFilter::Warn)
        .filter_module(env!("CARGO_PKG_NAME"), level)
        .format(|buf, record| writeln!(buf, "{}", format_record(record, worker_tag())))
        .try_init();
}

/// Name of the current thread when it is a pool worker.
pub fn worker_tag() -> Option<String> {
    thread::current()
        .name()
        .filter(|n| n.starts_with(WORKER_THREAD_PREFIX))
        .map(str::to_string)
}

/// `[splitrun worker-2 WARN target] msg` for warnings and errors, `[splitrun worker-2] msg` otherwise.
fn format_record(record: &Record, worker: Option<String>) -> String {
    let mut prefix = env!("CARGO_PKG_NAME").cyan().to_string();
    if let Some(w) = worker {
        prefix.push(' ');
        prefix.push_str(&w.dimmed().to_string());
    }
    match record.level() {
        Level::Error => format!(
            "[{} {} {}] {}",
            prefix,
            "ERROR".red(),
            record.target().white(),
            record.args()
        ),
        Level::Warn => format!(
            "[{} {} {}] {}",
            prefix,
            "WARN".yellow(),
            record.target().white(),
            record.args()
        ),
        _ => format!("[{}] {}", prefix, record.args()),
    }
}

/// Colours for the end-of-run summary.
pub struct Colors;

impl Colors {
    pub const OK: &'static str = "green";
    pub const FAILED: &'static str = "red";
    pub const INFO: &'static str = "cyan";

    pub fn colorize(color: &str, text: &str) -> ColoredString {
        text.color(color)
    }
}
