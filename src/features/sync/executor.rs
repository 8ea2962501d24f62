//! Reconciliation of the offline queue.
//!
//! Replays queued operations against the service strictly in queue order,
//! one call at a time. A network failure stops the run and leaves the failing
//! operation and everything after it queued; a rejection from the service is
//! logged and set aside so it cannot block the rest of the queue.

use colored::Colorize;
use tracing::{info, warn};

use super::context::SyncContext;
use super::operation::{DeadLetter, QueuedOperation};
use super::queue::{DeadLetters, SyncQueue};
use crate::api::Backend;
use crate::error::RollcallError;

/// Configuration for the sync executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Keep rejected operations in the dead-letter list instead of dropping
    /// them.
    pub dead_letter: bool,
    /// Dry run mode (don't actually execute)
    pub dry_run: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            dead_letter: true,
            dry_run: false,
        }
    }
}

/// What happened to a single queued operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// The service accepted it.
    Applied,
    /// The service refused it; it was removed from the queue.
    Rejected,
    /// The service could not be reached; it stays queued.
    Deferred,
    /// Dry run: it would have been sent.
    WouldSend,
}

/// Result of executing a single operation.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Zero-based position in the queue at the start of the run
    pub position: usize,
    pub operation: QueuedOperation,
    pub status: ExecutionStatus,
    /// Error message if it did not apply
    pub error: Option<String>,
}

/// How a reconciliation run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The queue was empty.
    NothingToDo,
    /// Every operation was processed and the queue is now empty.
    Completed,
    /// The service became unreachable; `remaining` operations stay queued.
    Deferred { remaining: usize, reason: String },
    /// Nothing was sent.
    DryRun,
}

/// Result of a reconciliation run.
#[derive(Debug, Clone)]
pub struct SyncResult {
    pub outcome: SyncOutcome,
    /// Number of operations the service accepted
    pub applied: usize,
    /// Number of operations the service refused
    pub rejected: usize,
    /// Individual results
    pub results: Vec<ExecutionResult>,
}

impl SyncResult {
    #[must_use]
    pub const fn nothing_to_do() -> Self {
        Self {
            outcome: SyncOutcome::NothingToDo,
            applied: 0,
            rejected: 0,
            results: Vec::new(),
        }
    }

    /// Add a result.
    pub fn add(&mut self, result: ExecutionResult) {
        match result.status {
            ExecutionStatus::Applied => self.applied += 1,
            ExecutionStatus::Rejected => self.rejected += 1,
            ExecutionStatus::Deferred | ExecutionStatus::WouldSend => {}
        }
        self.results.push(result);
    }

    /// Whether the queue was fully drained.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Completed | SyncOutcome::NothingToDo)
    }

    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        matches!(self.outcome, SyncOutcome::Deferred { .. })
    }
}

/// Executor for replaying the offline queue.
pub struct SyncExecutor<'a> {
    backend: &'a dyn Backend,
    context: &'a SyncContext,
    queue: &'a SyncQueue<'a>,
    dead_letters: &'a DeadLetters<'a>,
    config: ExecutorConfig,
}

impl<'a> SyncExecutor<'a> {
    /// Create a new executor.
    #[must_use]
    pub fn new(
        backend: &'a dyn Backend,
        context: &'a SyncContext,
        queue: &'a SyncQueue<'a>,
        dead_letters: &'a DeadLetters<'a>,
    ) -> Self {
        Self::with_config(backend, context, queue, dead_letters, ExecutorConfig::default())
    }

    /// Create an executor with custom config.
    #[must_use]
    pub const fn with_config(
        backend: &'a dyn Backend,
        context: &'a SyncContext,
        queue: &'a SyncQueue<'a>,
        dead_letters: &'a DeadLetters<'a>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            backend,
            context,
            queue,
            dead_letters,
            config,
        }
    }

    /// Replay every queued operation in order.
    ///
    /// The queue is only cleared once the end is reached. If the service
    /// becomes unreachable part-way, the already-applied head is dropped and
    /// the failing operation plus the rest stay queued.
    ///
    /// # Errors
    ///
    /// Returns an error only if the queue or dead-letter list cannot be
    /// persisted; service failures are reported through [`SyncResult`].
    pub fn reconcile(&self) -> Result<SyncResult, RollcallError> {
        let pending = self.queue.list();
        if pending.is_empty() {
            return Ok(SyncResult::nothing_to_do());
        }

        let mut result = SyncResult::nothing_to_do();

        if self.config.dry_run {
            for (position, operation) in pending.into_iter().enumerate() {
                result.add(ExecutionResult {
                    position,
                    operation,
                    status: ExecutionStatus::WouldSend,
                    error: None,
                });
            }
            result.outcome = SyncOutcome::DryRun;
            return Ok(result);
        }

        info!(count = pending.len(), "reconciling offline queue");
        let mut rejected = Vec::new();

        for (position, operation) in pending.iter().enumerate() {
            match self.apply(operation) {
                Ok(()) => {
                    info!(position, %operation, "applied");
                    result.add(ExecutionResult {
                        position,
                        operation: operation.clone(),
                        status: ExecutionStatus::Applied,
                        error: None,
                    });
                }
                Err(e) if e.is_network() => {
                    warn!(position, %operation, error = %e, "service unreachable, deferring the rest of the queue");
                    self.context.set_available(false);

                    let remaining = &pending[position..];
                    self.park(rejected)?;
                    self.queue.replace(remaining)?;

                    result.add(ExecutionResult {
                        position,
                        operation: operation.clone(),
                        status: ExecutionStatus::Deferred,
                        error: Some(e.to_string()),
                    });
                    result.outcome = SyncOutcome::Deferred {
                        remaining: remaining.len(),
                        reason: e.to_string(),
                    };
                    return Ok(result);
                }
                Err(e) => {
                    warn!(position, %operation, error = %e, "service rejected queued operation, skipping it");
                    rejected.push(DeadLetter::new(operation.clone(), &e));
                    result.add(ExecutionResult {
                        position,
                        operation: operation.clone(),
                        status: ExecutionStatus::Rejected,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        self.park(rejected)?;
        self.queue.clear()?;
        result.outcome = SyncOutcome::Completed;
        info!(applied = result.applied, rejected = result.rejected, "offline queue reconciled");

        Ok(result)
    }

    /// Issue the remote call for one operation.
    ///
    /// Only the status decides the outcome. A create answered with a success
    /// status is applied even when the body does not describe a student, so
    /// it is never dead-lettered and resent.
    fn apply(&self, operation: &QueuedOperation) -> Result<(), RollcallError> {
        match operation {
            QueuedOperation::CreateStudent(student) => match self.backend.create_student(student) {
                Ok(_) => Ok(()),
                Err(RollcallError::UnexpectedResponse(body)) => {
                    warn!(name = student.name(), %body, "student created but the response was not understood");
                    Ok(())
                }
                Err(e) => Err(e),
            },
            QueuedOperation::DeleteStudent { id } => self.backend.delete_student(*id),
        }
    }

    /// Set rejected operations aside, or drop them when dead-lettering is off.
    fn park(&self, rejected: Vec<DeadLetter>) -> Result<(), RollcallError> {
        if self.config.dead_letter {
            self.dead_letters.extend(rejected)
        } else {
            for letter in &rejected {
                warn!(operation = %letter.operation, reason = %letter.reason, "dropping rejected operation");
            }
            Ok(())
        }
    }
}

/// Format sync result for display.
#[must_use]
pub fn format_sync_result(result: &SyncResult) -> String {
    let mut lines = Vec::new();

    match &result.outcome {
        SyncOutcome::NothingToDo => return "Nothing to sync: the offline queue is empty.".to_string(),
        SyncOutcome::DryRun => {
            lines.push(format!("Dry run: {} operations would be sent", result.results.len()));
            lines.push("─".repeat(40));
            for r in &result.results {
                lines.push(format!("  {} {}", format!("{:>3}.", r.position + 1).dimmed(), r.operation));
            }
            return lines.join("\n");
        }
        SyncOutcome::Completed => {
            lines.push(format!("Sync completed: {} operations", result.results.len()));
        }
        SyncOutcome::Deferred { remaining, .. } => {
            lines.push(format!(
                "Sync interrupted: {} operations still queued",
                remaining
            ));
        }
    }
    lines.push("─".repeat(40));

    if result.applied > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} applied", result.applied).green()
        ));
    }

    if result.rejected > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} rejected by the service", result.rejected).red()
        ));
    }

    if let SyncOutcome::Deferred { remaining, reason } = &result.outcome {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{remaining} deferred: {reason}").yellow()
        ));
    }

    // Show first few errors
    let errors: Vec<_> = result
        .results
        .iter()
        .filter(|r| r.status == ExecutionStatus::Rejected)
        .take(3)
        .collect();

    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Rejected:".to_string());
        for err in errors {
            lines.push(format!(
                "  - {}: {}",
                err.operation,
                err.error.as_deref().unwrap_or("Unknown error")
            ));
        }
    }

    lines.join("\n")
}
