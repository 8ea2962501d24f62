use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

use crate::api::StudentStatus;
use crate::core::parse_date;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Student registration client that keeps working offline")]
#[command(long_about = "rollcall - student registration from the command line

Registers and removes students on a school registration service. When the
service cannot be reached, writes are kept in a local offline queue and
replayed in order once it answers again.

QUICK START:
  rollcall health                                   Check the service
  rollcall student add --name \"Ana Silva\" --birth-date 2012-03-14
  rollcall student list                             Server and pending students
  rollcall queue status                             Pending writes and availability
  rollcall queue run --wait                         Replay pending writes

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  rollcall <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Use 'pretty' for human-readable colored output (default),
    /// or 'json' for machine-readable output suitable for scripting.
    /// Falls back to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Base URL of the registration service
    #[arg(long, env = "ROLLCALL_SERVER", global = true)]
    pub server: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether the registration service is reachable
    ///
    /// Probes the health endpoint once, bypassing any caches.
    ///
    /// # Examples
    ///
    ///   rollcall health
    ///   rollcall health --wait       Keep retrying with backoff
    Health {
        /// Retry with exponential backoff until the service answers
        #[arg(long)]
        wait: bool,
    },

    /// Manage students
    ///
    /// # Subcommands
    ///
    ///   list     Students on the server plus those still queued
    ///   add      Register a student (queued when offline)
    ///   delete   Remove a student (queued when offline)
    ///
    /// # Examples
    ///
    ///   rollcall student list --class 1 --status active --search silva
    ///   rollcall student add --name "Ana Silva" --birth-date 2012-03-14 --class 1
    ///   rollcall student delete 5
    ///   rollcall student delete --pending 2
    #[command(alias = "s")]
    Student(StudentArgs),

    /// Manage classes
    ///
    /// # Examples
    ///
    ///   rollcall class list
    ///   rollcall class seed          Create the default classes
    #[command(alias = "c")]
    Class(ClassArgs),

    /// Offline queue management
    ///
    /// Writes made while the service is unreachable wait here and are
    /// replayed in the order they were made.
    ///
    /// # Subcommands
    ///
    ///   status        Pending count and service availability
    ///   list          Show queued writes in replay order
    ///   remove        Drop a queued write by position
    ///   discard       Drop a queued student by name
    ///   run           Replay queued writes
    ///   clear         Drop every queued write
    ///   dead-letter   Writes the service refused during replay
    ///
    /// # Examples
    ///
    ///   rollcall queue status
    ///   rollcall queue run --dry-run
    ///   rollcall queue remove 2
    ///   rollcall queue dead-letter requeue
    #[command(alias = "q")]
    Queue(QueueArgs),

    /// Generate shell completions
    ///
    /// Example: rollcall completions bash > ~/.bash_completion.d/rollcall
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for student management.
#[derive(Args)]
pub struct StudentArgs {
    #[command(subcommand)]
    pub command: StudentCommands,
}

/// Student subcommands.
#[derive(Subcommand)]
pub enum StudentCommands {
    /// List students
    ///
    /// Shows server records followed by students that only exist in the
    /// offline queue. When the service is unreachable only the queued ones
    /// are shown. Filters apply to both.
    List {
        /// Only students in this class
        #[arg(long = "class", short = 'c', value_name = "ID")]
        class_id: Option<i64>,

        /// Only students with this status (active, inactive)
        #[arg(long, short = 's')]
        status: Option<StudentStatus>,

        /// Only students whose name contains this text (case-insensitive)
        #[arg(long, short = 'q', value_name = "TEXT")]
        search: Option<String>,
    },

    /// Register a new student
    Add(AddStudentArgs),

    /// Delete a student
    ///
    /// Use an id for students known to the server, or --pending with a
    /// queue position for a student that was never sent.
    Delete {
        /// Server id of the student
        #[arg(required_unless_present = "pending", conflicts_with = "pending")]
        id: Option<i64>,

        /// Position (as shown by 'queue list') of a queued student
        #[arg(long, value_name = "POSITION")]
        pending: Option<usize>,
    },
}

/// Arguments for registering a student.
#[derive(Args, Debug)]
pub struct AddStudentArgs {
    /// Full name (3 to 80 characters)
    #[arg(long, short = 'n')]
    pub name: String,

    /// Birth date (YYYY-MM-DD, not in the future)
    #[arg(long, short = 'b', value_parser = parse_date)]
    pub birth_date: NaiveDate,

    /// Contact email
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Class id
    #[arg(long = "class", short = 'c')]
    pub class_id: Option<i64>,

    /// Enrollment status (active, inactive)
    #[arg(long, short = 's', default_value = "active")]
    pub status: StudentStatus,
}

/// Arguments for class management.
#[derive(Args)]
pub struct ClassArgs {
    #[command(subcommand)]
    pub command: ClassCommands,
}

/// Class subcommands.
#[derive(Subcommand)]
pub enum ClassCommands {
    /// List classes
    List,
    /// Ask the service to create its default classes
    Seed,
}

/// Arguments for the offline queue.
#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub command: QueueCommands,
}

/// Offline queue subcommands.
#[derive(Subcommand)]
pub enum QueueCommands {
    /// Show pending count and service availability
    Status,

    /// List queued writes in replay order
    List,

    /// Remove the queued write at a position
    Remove {
        /// Position as shown by 'queue list' (starting at 1)
        position: usize,
    },

    /// Remove the first queued registration of a student by name
    Discard {
        /// Student name (case-insensitive)
        name: String,
    },

    /// Replay queued writes against the service
    ///
    /// Stops at the first write that cannot reach the service and keeps it
    /// and everything after it queued.
    Run {
        /// Dry run - show what would be sent
        #[arg(long)]
        dry_run: bool,

        /// Retry the health check with backoff before replaying
        #[arg(long)]
        wait: bool,
    },

    /// Remove every queued write
    Clear {
        /// Skip confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Writes the service refused during replay
    #[command(name = "dead-letter")]
    DeadLetter(DeadLetterArgs),
}

/// Arguments for the dead-letter list.
#[derive(Args)]
pub struct DeadLetterArgs {
    #[command(subcommand)]
    pub command: DeadLetterCommands,
}

/// Dead-letter subcommands.
#[derive(Subcommand)]
pub enum DeadLetterCommands {
    /// List refused writes
    List,
    /// Move refused writes back onto the end of the queue
    Requeue,
    /// Discard refused writes
    Clear {
        /// Skip confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_health_command() {
        let cli = Cli::try_parse_from(["rollcall", "health"]).unwrap();
        assert!(matches!(cli.command, Commands::Health { wait: false }));
        assert_eq!(cli.output, None);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "rollcall",
            "queue",
            "status",
            "-o",
            "json",
            "--server",
            "http://school.local:9000",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert_eq!(cli.server.as_deref(), Some("http://school.local:9000"));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_student_add() {
        let cli = Cli::try_parse_from([
            "rollcall",
            "student",
            "add",
            "--name",
            "Ana Silva",
            "--birth-date",
            "2012-03-14",
            "--class",
            "1",
        ])
        .unwrap();

        match cli.command {
            Commands::Student(StudentArgs {
                command: StudentCommands::Add(args),
            }) => {
                assert_eq!(args.name, "Ana Silva");
                assert_eq!(args.birth_date, NaiveDate::from_ymd_opt(2012, 3, 14).unwrap());
                assert_eq!(args.class_id, Some(1));
                assert_eq!(args.email, None);
                assert_eq!(args.status, StudentStatus::Active);
            }
            _ => panic!("Expected student add"),
        }
    }

    #[test]
    fn test_cli_student_add_rejects_bad_date() {
        let result = Cli::try_parse_from([
            "rollcall",
            "student",
            "add",
            "--name",
            "Ana Silva",
            "--birth-date",
            "14/03/2012",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_student_add_status() {
        let cli = Cli::try_parse_from([
            "rollcall", "s", "add", "-n", "Ana Silva", "-b", "2012-03-14", "-s", "inactive",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Student(StudentArgs {
                command: StudentCommands::Add(AddStudentArgs {
                    status: StudentStatus::Inactive,
                    ..
                })
            })
        ));
    }

    #[test]
    fn test_cli_student_list_filters() {
        let cli = Cli::try_parse_from(["rollcall", "student", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Student(StudentArgs {
                command: StudentCommands::List {
                    class_id: None,
                    status: None,
                    search: None
                }
            })
        ));

        let cli = Cli::try_parse_from([
            "rollcall", "s", "list", "--class", "2", "--status", "inactive", "--search", "silva",
        ])
        .unwrap();
        match cli.command {
            Commands::Student(StudentArgs {
                command:
                    StudentCommands::List {
                        class_id,
                        status,
                        search,
                    },
            }) => {
                assert_eq!(class_id, Some(2));
                assert_eq!(status, Some(StudentStatus::Inactive));
                assert_eq!(search.as_deref(), Some("silva"));
            }
            _ => panic!("Expected student list"),
        }

        assert!(Cli::try_parse_from(["rollcall", "student", "list", "--status", "away"]).is_err());
    }

    #[test]
    fn test_cli_student_delete_targets() {
        let cli = Cli::try_parse_from(["rollcall", "student", "delete", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Student(StudentArgs {
                command: StudentCommands::Delete {
                    id: Some(5),
                    pending: None
                }
            })
        ));

        let cli = Cli::try_parse_from(["rollcall", "student", "delete", "--pending", "2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Student(StudentArgs {
                command: StudentCommands::Delete {
                    id: None,
                    pending: Some(2)
                }
            })
        ));
    }

    #[test]
    fn test_cli_student_delete_requires_target() {
        assert!(Cli::try_parse_from(["rollcall", "student", "delete"]).is_err());
        assert!(
            Cli::try_parse_from(["rollcall", "student", "delete", "5", "--pending", "1"]).is_err()
        );
    }

    #[test]
    fn test_cli_queue_run() {
        let cli = Cli::try_parse_from(["rollcall", "q", "run", "--dry-run"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Queue(QueueArgs {
                command: QueueCommands::Run {
                    dry_run: true,
                    wait: false
                }
            })
        ));
    }

    #[test]
    fn test_cli_queue_dead_letter() {
        let cli =
            Cli::try_parse_from(["rollcall", "queue", "dead-letter", "clear", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Queue(QueueArgs {
                command: QueueCommands::DeadLetter(DeadLetterArgs {
                    command: DeadLetterCommands::Clear { force: true }
                })
            })
        ));
    }

    #[test]
    fn test_cli_completions() {
        let cli = Cli::try_parse_from(["rollcall", "completions", "zsh"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Zsh }
        ));
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Pretty);
    }
}
