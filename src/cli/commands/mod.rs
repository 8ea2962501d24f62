//! Command implementations for rollcall.
//!
//! Every command receives a [`Session`] bundling the service client, the
//! local database and the shared availability state, and returns the text to
//! print on stdout.

mod class;
mod queue;
mod student;

pub use class::class;
pub use queue::queue;
pub use student::student;

use std::cell::Cell;
use std::rc::Rc;

use clap::CommandFactory;
use clap_complete::Shell;
use colored::Colorize;
use serde_json::json;
use tracing::info;

use crate::api::Backend;
use crate::cli::args::{Cli, OutputFormat};
use crate::config::Config;
use crate::error::RollcallError;
use crate::features::sync::{
    AvailabilityChange, ConnectivityMonitor, DeadLetters, ExecutorConfig, StudentDispatcher, SyncContext,
    SyncExecutor, SyncQueue, SyncResult,
};
use crate::output::{format_badge_pretty, to_json, StatusBadge};
use crate::storage::Database;

/// Everything a command needs to talk to the service and the offline queue.
pub struct Session<'a> {
    pub backend: &'a dyn Backend,
    pub db: &'a Database,
    pub context: &'a SyncContext,
    pub config: &'a Config,
    /// Base URL of the service, for display.
    pub server: &'a str,
    last_count: Rc<Cell<Option<usize>>>,
}

impl<'a> Session<'a> {
    #[must_use]
    pub fn new(
        backend: &'a dyn Backend,
        db: &'a Database,
        context: &'a SyncContext,
        config: &'a Config,
        server: &'a str,
    ) -> Self {
        Self {
            backend,
            db,
            context,
            config,
            server,
            last_count: Rc::new(Cell::new(None)),
        }
    }

    /// Open the offline queue, tracking its count for the status badge.
    #[must_use]
    pub fn queue(&self) -> SyncQueue<'a> {
        let queue = SyncQueue::new(self.db);
        let sink = Rc::clone(&self.last_count);
        queue.subscribe(move |count| sink.set(Some(count)));
        queue
    }

    #[must_use]
    pub const fn dead_letters(&self) -> DeadLetters<'a> {
        DeadLetters::new(self.db)
    }

    #[must_use]
    pub const fn monitor(&self) -> ConnectivityMonitor<'a> {
        ConnectivityMonitor::new(self.backend, self.context)
    }

    #[must_use]
    pub const fn dispatcher<'q>(&self, queue: &'q SyncQueue<'a>) -> StudentDispatcher<'q>
    where
        'a: 'q,
    {
        StudentDispatcher::new(self.backend, self.context, queue)
    }

    #[must_use]
    pub const fn executor_config(&self, dry_run: bool) -> ExecutorConfig {
        ExecutorConfig {
            dead_letter: self.config.sync.dead_letter,
            dry_run,
        }
    }

    /// Probe the service once; used before commands that need it.
    pub fn connect(&self) -> bool {
        self.monitor().check_now()
    }

    /// Startup sequence for commands that talk to the service.
    ///
    /// `notify` is registered before the first health check so the initial
    /// transition is reported too. Before write commands, pending writes are
    /// replayed through [`Session::auto_sync`].
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be persisted.
    pub fn start(
        &self,
        writes: bool,
        notify: impl Fn(AvailabilityChange) + 'static,
    ) -> Result<Option<SyncResult>, RollcallError> {
        self.context.subscribe(notify);
        self.connect();

        if writes {
            self.auto_sync()
        } else {
            Ok(None)
        }
    }

    /// Replay pending writes before a write command when the service is up
    /// and `sync.auto_sync` is on.
    ///
    /// Returns `None` when nothing was attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be persisted.
    pub fn auto_sync(&self) -> Result<Option<SyncResult>, RollcallError> {
        if !self.config.sync.auto_sync || !self.context.is_available() {
            return Ok(None);
        }

        let queue = self.queue();
        if queue.is_empty() {
            return Ok(None);
        }

        info!(pending = queue.count(), "replaying pending writes before running the command");
        let dead_letters = self.dead_letters();
        let executor = SyncExecutor::with_config(
            self.backend,
            self.context,
            &queue,
            &dead_letters,
            self.executor_config(false),
        );
        executor.reconcile().map(Some)
    }

    /// Current pending count and availability.
    #[must_use]
    pub fn badge(&self) -> StatusBadge {
        let pending = self
            .last_count
            .get()
            .unwrap_or_else(|| SyncQueue::new(self.db).count());

        StatusBadge {
            pending,
            available: self.context.is_available(),
        }
    }

    /// Append the status badge to pretty output of a write command.
    fn with_badge(&self, output: String) -> String {
        format!("{output}\n{}", format_badge_pretty(&self.badge()))
    }
}

/// Convert a 1-based position from the command line into a queue index.
fn position_to_index(position: usize) -> Result<usize, RollcallError> {
    position
        .checked_sub(1)
        .ok_or_else(|| RollcallError::NotFound("Queue positions start at 1".to_string()))
}

/// Execute health command
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn health(session: &Session<'_>, wait: bool, format: OutputFormat) -> Result<String, RollcallError> {
    let monitor = session.monitor();
    let available = if wait {
        monitor.wait_until_available(&session.config.sync.retry)
    } else {
        monitor.check_now()
    };

    match format {
        OutputFormat::Json => to_json(&json!({
            "server": session.server,
            "available": available,
        })),
        OutputFormat::Pretty => Ok(if available {
            format!("{} Service reachable at {}", "✓".green(), session.server)
        } else {
            format!(
                "{} Service unreachable at {}; writes will be queued",
                "✗".red(),
                session.server
            )
        }),
    }
}

/// Generate shell completions for the specified shell.
///
/// # Errors
///
/// Returns an error if the generated script is not valid UTF-8.
pub fn completions(shell: Shell) -> Result<String, RollcallError> {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "rollcall", &mut buf);
    String::from_utf8(buf)
        .map_err(|e| RollcallError::UnexpectedResponse(format!("Completion script is not UTF-8: {e}")))
}
