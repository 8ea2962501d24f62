//! Offline queue command implementation.
//!
//! Handles offline queue management commands.

use colored::Colorize;
use serde_json::{json, Value};

use super::{position_to_index, Session};
use crate::cli::args::{DeadLetterCommands, OutputFormat, QueueCommands};
use crate::error::RollcallError;
use crate::features::sync::{
    format_sync_result, ExecutionStatus, SyncExecutor, SyncOutcome, SyncResult,
};
use crate::output::{format_badge_pretty, format_dead_letters, format_queue, to_json};

/// Execute queue subcommands.
///
/// # Errors
///
/// Returns an error if the queue cannot be persisted, a position or name
/// does not match a queued write, or a destructive command lacks `--force`.
pub fn queue(
    session: &Session<'_>,
    cmd: QueueCommands,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    match cmd {
        QueueCommands::Status => show_status(session, format),
        QueueCommands::List => format_queue(&session.queue().list(), format),
        QueueCommands::Remove { position } => remove_operation(session, position, format),
        QueueCommands::Discard { name } => discard_student(session, &name, format),
        QueueCommands::Run { dry_run, wait } => run_sync(session, dry_run, wait, format),
        QueueCommands::Clear { force } => clear_queue(session, force, format),
        QueueCommands::DeadLetter(args) => dead_letter(session, args.command, format),
    }
}

/// Show queue status.
fn show_status(session: &Session<'_>, format: OutputFormat) -> Result<String, RollcallError> {
    session.connect();
    let badge = session.badge();
    let dead = session.dead_letters().count();

    match format {
        OutputFormat::Json => to_json(&json!({
            "server": session.server,
            "available": badge.available,
            "pending": badge.pending,
            "dead_letters": dead,
        })),
        OutputFormat::Pretty => {
            let mut lines = Vec::new();

            lines.push("Offline Queue Status".bold().to_string());
            lines.push("─".repeat(40));
            lines.push(format!("  {}", format_badge_pretty(&badge)));
            lines.push(format!("  Server:       {}", session.server.dimmed()));
            lines.push(format!(
                "  Dead letters: {} {}",
                dead,
                if dead > 0 {
                    "refused writes need attention".red()
                } else {
                    "".normal()
                }
            ));

            if badge.pending > 0 {
                lines.push(String::new());
                lines.push(
                    "Run 'rollcall queue run' to send pending writes"
                        .dimmed()
                        .to_string(),
                );
            }

            Ok(lines.join("\n"))
        }
    }
}

/// Replay the queue.
fn run_sync(
    session: &Session<'_>,
    dry_run: bool,
    wait: bool,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let queue = session.queue();
    let dead_letters = session.dead_letters();

    let result = if !dry_run && queue.is_empty() {
        SyncResult::nothing_to_do()
    } else if dry_run || connect(session, wait) {
        SyncExecutor::with_config(
            session.backend,
            session.context,
            &queue,
            &dead_letters,
            session.executor_config(dry_run),
        )
        .reconcile()?
    } else {
        SyncResult {
            outcome: SyncOutcome::Deferred {
                remaining: queue.count(),
                reason: format!("service at {} is unreachable", session.server),
            },
            ..SyncResult::nothing_to_do()
        }
    };

    match format {
        OutputFormat::Json => to_json(&sync_result_json(&result)),
        OutputFormat::Pretty => {
            let text = format_sync_result(&result);
            if dry_run {
                Ok(text)
            } else {
                Ok(session.with_badge(text))
            }
        }
    }
}

fn connect(session: &Session<'_>, wait: bool) -> bool {
    if wait {
        session
            .monitor()
            .wait_until_available(&session.config.sync.retry)
    } else {
        session.connect()
    }
}

fn sync_result_json(result: &SyncResult) -> Value {
    let (outcome, remaining, reason) = match &result.outcome {
        SyncOutcome::NothingToDo => ("nothing_to_do", 0, None),
        SyncOutcome::Completed => ("completed", 0, None),
        SyncOutcome::Deferred { remaining, reason } => ("deferred", *remaining, Some(reason)),
        SyncOutcome::DryRun => ("dry_run", result.results.len(), None),
    };

    let results: Vec<_> = result
        .results
        .iter()
        .map(|r| {
            json!({
                "position": r.position + 1,
                "operation": r.operation,
                "status": match r.status {
                    ExecutionStatus::Applied => "applied",
                    ExecutionStatus::Rejected => "rejected",
                    ExecutionStatus::Deferred => "deferred",
                    ExecutionStatus::WouldSend => "would_send",
                },
                "error": r.error,
            })
        })
        .collect();

    json!({
        "outcome": outcome,
        "applied": result.applied,
        "rejected": result.rejected,
        "remaining": remaining,
        "reason": reason,
        "results": results,
    })
}

/// Remove a queued write by its 1-based position.
fn remove_operation(
    session: &Session<'_>,
    position: usize,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let index = position_to_index(position)?;
    let removed = session
        .queue()
        .dequeue_at(index)?
        .ok_or_else(|| RollcallError::NotFound(format!("Queue position {position}")))?;

    match format {
        OutputFormat::Json => to_json(&json!({"removed": removed, "badge": session.badge()})),
        OutputFormat::Pretty => Ok(session.with_badge(format!(
            "Removed {} from the offline queue",
            removed.to_string().bold()
        ))),
    }
}

/// Remove a queued registration by student name.
fn discard_student(
    session: &Session<'_>,
    name: &str,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let queue = session.queue();
    let student = session
        .dispatcher(&queue)
        .discard_pending_create(name)?
        .ok_or_else(|| RollcallError::NotFound(format!("Queued student '{name}'")))?;

    match format {
        OutputFormat::Json => to_json(&json!({"discarded": student, "badge": session.badge()})),
        OutputFormat::Pretty => Ok(session.with_badge(format!(
            "Discarded queued student {}",
            student.name().bold()
        ))),
    }
}

/// Drop every queued write.
fn clear_queue(
    session: &Session<'_>,
    force: bool,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    if !force {
        return Err(RollcallError::Config(
            "Use --force to drop every queued write".to_string(),
        ));
    }

    let queue = session.queue();
    let count = queue.count();
    queue.clear()?;

    match format {
        OutputFormat::Json => to_json(&json!({"cleared": count})),
        OutputFormat::Pretty => Ok(format!("Cleared {count} operations from the offline queue")),
    }
}

/// Dead-letter list management.
fn dead_letter(
    session: &Session<'_>,
    cmd: DeadLetterCommands,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let dead_letters = session.dead_letters();

    match cmd {
        DeadLetterCommands::List => format_dead_letters(&dead_letters.list(), format),
        DeadLetterCommands::Requeue => {
            let queue = session.queue();
            let count = dead_letters.requeue_into(&queue)?;

            match format {
                OutputFormat::Json => to_json(&json!({"requeued": count, "badge": session.badge()})),
                OutputFormat::Pretty => Ok(session.with_badge(format!(
                    "Moved {count} refused writes back onto the offline queue"
                ))),
            }
        }
        DeadLetterCommands::Clear { force } => {
            if !force {
                return Err(RollcallError::Config(
                    "Use --force to discard every refused write".to_string(),
                ));
            }
            let count = dead_letters.count();
            dead_letters.clear()?;

            match format {
                OutputFormat::Json => to_json(&json!({"cleared": count})),
                OutputFormat::Pretty => Ok(format!("Discarded {count} refused writes")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::api::{MockBackend, StudentDraft, StudentStatus};
    use crate::cli::args::DeadLetterArgs;
    use crate::config::Config;
    use crate::features::sync::{DeadLetter, QueuedOperation, SyncContext, SyncQueue};
    use crate::storage::Database;

    fn create(name: &str) -> QueuedOperation {
        QueuedOperation::CreateStudent(
            StudentDraft {
                name: name.to_string(),
                birth_date: NaiveDate::from_ymd_opt(2012, 3, 14).unwrap(),
                email: None,
                class_id: None,
                status: StudentStatus::Active,
            }
            .validate()
            .unwrap(),
        )
    }

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    fn offline_backend() -> MockBackend {
        let mut backend = MockBackend::new();
        backend
            .expect_health()
            .returning(|| Err(RollcallError::Network("connection refused".to_string())));
        backend
    }

    #[test]
    fn test_status_json() {
        let backend = offline_backend();
        let db = Database::open_in_memory().unwrap();
        SyncQueue::new(&db).enqueue(create("Ana Silva")).unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");

        let parsed = parse(&queue(&session, QueueCommands::Status, OutputFormat::Json).unwrap());
        assert_eq!(parsed["pending"], 1);
        assert_eq!(parsed["available"], false);
        assert_eq!(parsed["dead_letters"], 0);
    }

    #[test]
    fn test_remove_by_position() {
        let backend = MockBackend::new();
        let db = Database::open_in_memory().unwrap();
        let q = SyncQueue::new(&db);
        q.enqueue(create("Ana Silva")).unwrap();
        q.enqueue(QueuedOperation::DeleteStudent { id: 5 }).unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");

        let parsed = parse(
            &queue(&session, QueueCommands::Remove { position: 2 }, OutputFormat::Json).unwrap(),
        );
        assert_eq!(parsed["removed"]["type"], "delete_student");
        assert_eq!(parsed["badge"]["pending"], 1);

        let missing = queue(&session, QueueCommands::Remove { position: 7 }, OutputFormat::Json);
        assert!(matches!(missing, Err(RollcallError::NotFound(_))));
    }

    #[test]
    fn test_discard_by_name() {
        let backend = MockBackend::new();
        let db = Database::open_in_memory().unwrap();
        SyncQueue::new(&db).enqueue(create("Ana Silva")).unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");

        let cmd = QueueCommands::Discard {
            name: "ana silva".to_string(),
        };
        let parsed = parse(&queue(&session, cmd, OutputFormat::Json).unwrap());
        assert_eq!(parsed["discarded"]["name"], "Ana Silva");
        assert_eq!(SyncQueue::new(&db).count(), 0);
    }

    #[test]
    fn test_run_offline_makes_no_calls() {
        let mut backend = offline_backend();
        backend.expect_create_student().never();
        let db = Database::open_in_memory().unwrap();
        SyncQueue::new(&db).enqueue(create("Ana Silva")).unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");

        let cmd = QueueCommands::Run {
            dry_run: false,
            wait: false,
        };
        let parsed = parse(&queue(&session, cmd, OutputFormat::Json).unwrap());
        assert_eq!(parsed["outcome"], "deferred");
        assert_eq!(parsed["remaining"], 1);
        assert_eq!(SyncQueue::new(&db).count(), 1);
    }

    #[test]
    fn test_run_online_drains_queue() {
        let mut backend = MockBackend::new();
        backend.expect_health().returning(|| Ok(()));
        backend
            .expect_delete_student()
            .times(1)
            .returning(|_| Ok(()));
        let db = Database::open_in_memory().unwrap();
        SyncQueue::new(&db)
            .enqueue(QueuedOperation::DeleteStudent { id: 3 })
            .unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");

        let cmd = QueueCommands::Run {
            dry_run: false,
            wait: false,
        };
        let parsed = parse(&queue(&session, cmd, OutputFormat::Json).unwrap());
        assert_eq!(parsed["outcome"], "completed");
        assert_eq!(parsed["applied"], 1);
        assert_eq!(parsed["results"][0]["status"], "applied");
        assert_eq!(parsed["results"][0]["position"], 1);
    }

    #[test]
    fn test_run_empty_queue() {
        let backend = MockBackend::new();
        let db = Database::open_in_memory().unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");

        let cmd = QueueCommands::Run {
            dry_run: false,
            wait: false,
        };
        let parsed = parse(&queue(&session, cmd, OutputFormat::Json).unwrap());
        assert_eq!(parsed["outcome"], "nothing_to_do");
    }

    #[test]
    fn test_clear_requires_force() {
        let backend = MockBackend::new();
        let db = Database::open_in_memory().unwrap();
        SyncQueue::new(&db).enqueue(create("Ana Silva")).unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");

        assert!(queue(&session, QueueCommands::Clear { force: false }, OutputFormat::Json).is_err());
        assert_eq!(SyncQueue::new(&db).count(), 1);

        let parsed =
            parse(&queue(&session, QueueCommands::Clear { force: true }, OutputFormat::Json).unwrap());
        assert_eq!(parsed["cleared"], 1);
        assert_eq!(SyncQueue::new(&db).count(), 0);
    }

    #[test]
    fn test_dead_letter_requeue() {
        let backend = MockBackend::new();
        let db = Database::open_in_memory().unwrap();
        let context = SyncContext::new();
        let config = Config::default();
        let session = Session::new(&backend, &db, &context, &config, "http://localhost:8000");
        let err = RollcallError::Rejected {
            status: 422,
            message: "invalid class".to_string(),
        };
        session
            .dead_letters()
            .extend(vec![DeadLetter::new(create("Ana Silva"), &err)])
            .unwrap();

        let cmd = QueueCommands::DeadLetter(DeadLetterArgs {
            command: DeadLetterCommands::Requeue,
        });
        let parsed = parse(&queue(&session, cmd, OutputFormat::Json).unwrap());

        assert_eq!(parsed["requeued"], 1);
        assert_eq!(parsed["badge"]["pending"], 1);
        assert_eq!(session.dead_letters().count(), 0);
    }
}
