use clap::Parser;
use colored::Colorize;

use rollcall::api::HttpBackend;
use rollcall::cli::args::{Cli, Commands, OutputFormat, StudentCommands};
use rollcall::cli::commands::{self, Session};
use rollcall::config::{Config, Paths};
use rollcall::error::RollcallError;
use rollcall::features::sync::{format_sync_result, SyncContext};
use rollcall::logging::{init_logging, LogConfig};
use rollcall::output::format_toast_pretty;
use rollcall::storage::Database;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), RollcallError> {
    let cli = Cli::parse();
    let paths = Paths::new()?;
    let config = Config::load_from_path(&paths.config_file)?;
    config.general.color.apply();
    init_logging(&LogConfig::from_verbosity(cli.verbose));

    let format = cli.output.unwrap_or(config.general.default_output);

    let output = match cli.command {
        Commands::Completions { shell } => commands::completions(shell)?,
        command => {
            let server = cli
                .server
                .unwrap_or_else(|| config.server.base_url.clone());
            run_command(command, &paths, &config, &server, format)?
        }
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn run_command(
    command: Commands,
    paths: &Paths,
    config: &Config,
    server: &str,
    format: OutputFormat,
) -> Result<String, RollcallError> {
    let backend = HttpBackend::new(server, config.timeout())?;
    paths.ensure_dirs()?;
    let db = Database::open_at(&paths.database)?;
    let context = SyncContext::new();
    let session = Session::new(&backend, &db, &context, config, backend.base_url());

    match command {
        Commands::Health { wait } => commands::health(&session, wait, format),
        Commands::Student(args) => {
            let writes = !matches!(args.command, StudentCommands::List { .. });
            let notify = |change| eprintln!("{}", format_toast_pretty(change));
            if let Some(result) = session.start(writes, notify)? {
                eprintln!("{}", format_sync_result(&result));
            }
            commands::student(&session, args.command, format)
        }
        Commands::Class(args) => commands::class(&session, args.command, format),
        Commands::Queue(args) => commands::queue(&session, args.command, format),
        Commands::Completions { shell } => commands::completions(shell),
    }
}
