//! Logging setup using `tracing` and `tracing-subscriber`.
//!
//! Diagnostics go to stderr so stdout stays clean for command output
//! (including `--output json`).
//!
//! # Log Levels
//!
//! - `warn`: skipped or dropped operations, unreadable local state
//! - `info`: reconciliation progress, queued writes
//! - `debug`: individual requests and queue mutations
//! - `trace`: everything else, including dependencies

use std::io;

use tracing::Level;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Configuration for logging behavior.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    /// Whether to include the module path in log lines.
    pub with_target: bool,
    /// Whether to use ANSI colors in output.
    pub with_ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            with_target: false,
            with_ansi: true,
        }
    }
}

impl LogConfig {
    /// Create a `LogConfig` from the `-v` count.
    ///
    /// - 0: warn
    /// - 1 (`-v`): info
    /// - 2 (`-vv`): debug
    /// - 3+ (`-vvv`): trace, with module paths
    #[must_use]
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            with_target: verbosity >= 3,
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn with_ansi(mut self, enable: bool) -> Self {
        self.with_ansi = enable;
        self
    }
}

/// Install the global subscriber, writing to stderr.
///
/// A second call is ignored.
pub fn init_logging(config: &LogConfig) {
    init_logging_with_writer(config, io::stderr);
}

/// Install the global subscriber with a custom writer.
pub fn init_logging_with_writer<W>(config: &LogConfig, writer: W)
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(config.with_ansi)
        .with_target(config.with_target)
        .without_time();

    // Fails only when a subscriber is already installed.
    let _ = tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .try_init();
}

/// Build an `EnvFilter` for `level`; `RUST_LOG` takes precedence.
fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.as_str().to_lowercase();
        // Dependencies stay quiet below trace.
        if level == "trace" {
            EnvFilter::new("trace")
        } else {
            EnvFilter::new(format!("warn,rollcall={level}"))
        }
    })
}
