use colored::Colorize;

use crate::api::{Class, NewStudent, Student, StudentStatus};
use crate::features::sync::{AvailabilityChange, DeadLetter, QueuedOperation};

use super::StatusBadge;

fn status_icon(status: StudentStatus) -> colored::ColoredString {
    match status {
        StudentStatus::Active => "●".green(),
        StudentStatus::Inactive => "○".dimmed(),
    }
}

/// Format server students followed by students that only exist in the queue.
///
/// `pending` pairs each queued student with its zero-based queue index.
pub fn format_students_pretty(students: &[Student], pending: &[(usize, &NewStudent)]) -> String {
    let total = students.len() + pending.len();
    if total == 0 {
        return "Students (0)\n  No students".to_string();
    }

    let mut output = format!("Students ({total})\n");
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for student in students {
        let mut line = format!(
            "{} {} {}",
            status_icon(student.status),
            format!("#{:<4}", student.id).dimmed(),
            student.name.bold()
        );
        line.push_str(&format!("  {}", student.birth_date.to_string().yellow()));

        if let Some(class_id) = student.class_id {
            line.push_str(&format!("  {}", format!("class {class_id}").cyan()));
        }
        if let Some(email) = &student.email {
            line.push_str(&format!("  {}", email.dimmed()));
        }

        output.push_str(&line);
        output.push('\n');
    }

    if !pending.is_empty() {
        output.push_str(&format!("{}\n", "Not yet sent".yellow()));
        for (index, student) in pending {
            let mut line = format!(
                "{} {} {}",
                "⏳".yellow(),
                format!("q{:<4}", index + 1).dimmed(),
                student.name().bold()
            );
            line.push_str(&format!("  {}", student.birth_date().to_string().yellow()));
            if let Some(class_id) = student.class_id() {
                line.push_str(&format!("  {}", format!("class {class_id}").cyan()));
            }

            output.push_str(&line);
            output.push('\n');
        }
    }

    output
}

/// Format a created student.
pub fn format_student_pretty(student: &Student) -> String {
    let mut output = format!("{} {}\n", status_icon(student.status), student.name.bold());
    output.push_str(&format!("  {}: {}\n", "ID".dimmed(), student.id));
    output.push_str(&format!("  {}: {}\n", "Born".dimmed(), student.birth_date));
    output.push_str(&format!("  {}: {}\n", "Status".dimmed(), student.status));

    if let Some(email) = &student.email {
        output.push_str(&format!("  {}: {}\n", "Email".dimmed(), email));
    }

    if let Some(class_id) = student.class_id {
        output.push_str(&format!("  {}: {}\n", "Class".dimmed(), class_id));
    }

    output
}

/// Format a list of classes as pretty output
pub fn format_classes_pretty(classes: &[Class]) -> String {
    if classes.is_empty() {
        return "Classes (0)\n  No classes. Run 'rollcall class seed' to create the defaults."
            .to_string();
    }

    let mut output = format!("Classes ({})\n", classes.len());
    output.push_str(&"─".repeat(40));
    output.push('\n');

    for class in classes {
        let mut line = format!("{} {}", format!("#{:<4}", class.id).dimmed(), class.name.bold());
        if let Some(capacity) = class.capacity {
            line.push_str(&format!("  {}", format!("{capacity} seats").dimmed()));
        }
        output.push_str(&line);
        output.push('\n');
    }

    output
}

/// Format queued operations with their 1-based positions.
pub fn format_queue_pretty(operations: &[QueuedOperation]) -> String {
    if operations.is_empty() {
        return "Offline queue (0)\n  Nothing waiting".to_string();
    }

    let mut output = format!("Offline queue ({})\n", operations.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');
    output.push_str(&format!("{:<5} {:<16} {}\n", "Pos", "Type", "Target"));

    for (index, op) in operations.iter().enumerate() {
        output.push_str(&format!(
            "{:<5} {:<16} {}\n",
            index + 1,
            op.display_name(),
            op.target().bold()
        ));
    }

    output
}

/// Format the dead-letter list.
pub fn format_dead_letters_pretty(letters: &[DeadLetter]) -> String {
    if letters.is_empty() {
        return "Dead letters (0)\n  Nothing was refused".to_string();
    }

    let mut output = format!("Dead letters ({})\n", letters.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for letter in letters {
        let status = letter
            .status
            .map_or_else(|| "---".to_string(), |s| s.to_string());
        output.push_str(&format!(
            "{} {}  {}\n",
            "✗".red(),
            letter.operation.to_string().bold(),
            letter.failed_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        ));
        output.push_str(&format!("    {} {}\n", status.red(), letter.reason));
    }

    output
}

/// One-line summary of pending writes and service availability.
pub fn format_badge_pretty(badge: &StatusBadge) -> String {
    let availability = if badge.available {
        "online".green()
    } else {
        "offline".red()
    };

    let pending = match badge.pending {
        0 => "nothing pending".dimmed(),
        1 => "1 pending write".yellow(),
        n => format!("{n} pending writes").yellow(),
    };

    format!("[{availability}] {pending}")
}

/// Notice printed when the service comes or goes.
pub fn format_toast_pretty(change: AvailabilityChange) -> String {
    if change.came_online() {
        format!(
            "{} Service reachable; pending writes are sent by 'rollcall queue run'",
            "●".green()
        )
    } else {
        format!(
            "{} Service unreachable; new writes will be queued",
            "●".red()
        )
    }
}
