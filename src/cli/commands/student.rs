//! Student command implementation.

use colored::Colorize;
use serde_json::json;
use tracing::warn;

use super::{position_to_index, Session};
use crate::api::{StudentDraft, Student};
use crate::cli::args::{AddStudentArgs, OutputFormat, StudentCommands};
use crate::core::StudentFilter;
use crate::error::RollcallError;
use crate::features::sync::{DeleteTarget, Submission};
use crate::output::{format_student_pretty, format_students, to_json};

/// Execute student subcommands.
///
/// # Errors
///
/// Returns an error on local validation failures, service rejections,
/// storage failures or when a pending position does not exist.
pub fn student(
    session: &Session<'_>,
    cmd: StudentCommands,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    match cmd {
        StudentCommands::List {
            class_id,
            status,
            search,
        } => list_students(session, &StudentFilter::new(class_id, status, search), format),
        StudentCommands::Add(args) => add_student(session, args, format),
        StudentCommands::Delete { id, pending } => {
            let target = match (id, pending) {
                (_, Some(position)) => DeleteTarget::Pending(position_to_index(position)?),
                (Some(id), None) => DeleteTarget::Remote(id),
                (None, None) => {
                    return Err(RollcallError::validation(
                        "target",
                        "give a student id or --pending <position>",
                    ))
                }
            };
            delete_student(session, target, format)
        }
    }
}

/// Server records (when reachable) followed by queued creates, both
/// narrowed by `filter`.
fn list_students(
    session: &Session<'_>,
    filter: &StudentFilter,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let mut students = if session.context.is_available() {
        match session.backend.list_students() {
            Ok(students) => students,
            Err(e) if e.is_network() => {
                warn!(error = %e, "could not list students, showing queued ones only");
                session.context.set_available(false);
                Vec::new()
            }
            Err(e) => return Err(e),
        }
    } else {
        Vec::new()
    };
    students.retain(|student| filter.matches(student));

    let queued = session.queue().list();
    let pending: Vec<_> = queued
        .iter()
        .enumerate()
        .filter_map(|(index, op)| op.as_create().map(|student| (index, student)))
        .filter(|(_, student)| filter.matches(*student))
        .collect();

    let output = format_students(&students, &pending, format)?;
    if format == OutputFormat::Pretty && !session.context.is_available() {
        return Ok(format!(
            "{}\n{output}",
            "Service unreachable: only students waiting in the offline queue are shown".yellow()
        ));
    }
    Ok(output)
}

fn add_student(
    session: &Session<'_>,
    args: AddStudentArgs,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let draft = StudentDraft {
        name: args.name,
        birth_date: args.birth_date,
        email: args.email,
        class_id: args.class_id,
        status: args.status,
    };

    let queue = session.queue();
    let submission = session.dispatcher(&queue).create(draft)?;
    format_submission(session, &submission, format)
}

fn delete_student(
    session: &Session<'_>,
    target: DeleteTarget,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let queue = session.queue();
    let submission = session.dispatcher(&queue).delete(target)?;
    format_submission(session, &submission, format)
}

fn format_submission(
    session: &Session<'_>,
    submission: &Submission,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let badge = session.badge();

    match format {
        OutputFormat::Json => {
            let data = match submission {
                Submission::Sent(student) => json!({"result": "sent", "student": student}),
                Submission::Deleted(id) => json!({"result": "deleted", "id": id}),
                Submission::Queued { count } => json!({"result": "queued", "position": count}),
                Submission::DiscardedLocal(student) => {
                    json!({"result": "discarded", "student": student})
                }
            };
            to_json(&json!({"submission": data, "badge": badge}))
        }
        OutputFormat::Pretty => {
            let text = match submission {
                Submission::Sent(student) => created_text(student),
                Submission::Deleted(id) => format!("{} Deleted student #{id}", "✓".green()),
                Submission::Queued { count } => queued_text(session, *count),
                Submission::DiscardedLocal(student) => format!(
                    "{} Removed '{}' from the offline queue; it was never sent",
                    "✓".green(),
                    student.name()
                ),
            };
            Ok(session.with_badge(text))
        }
    }
}

/// Queued writes are either waiting for the service or for earlier writes.
fn queued_text(session: &Session<'_>, position: usize) -> String {
    let reason = if session.context.is_available() {
        "Earlier writes are still pending"
    } else {
        "Service unreachable"
    };
    format!(
        "{} {reason}; saved at position {position} of the offline queue",
        "⏳".yellow()
    )
}

fn created_text(student: &Student) -> String {
    format!(
        "{} Created student\n{}",
        "✓".green(),
        format_student_pretty(student).trim_end()
    )
}
