use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use milestones::config::Settings;
use milestones::handlers;
use milestones::identity::{self, GlobalGitIdentity};
use milestones::logger;
use milestones::report::OutboxSender;
use milestones::ui::{ConsoleUi, Notifier};

#[derive(Parser)]
#[command(name = "milestones")]
#[command(about = "Mark, browse and return to milestones of a file or folder", long_about = None)]
#[command(version)]
struct Cli {
    /// Log everything to the terminal instead of the log file
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the current state of a file or folder as a milestone
    Mark {
        /// File or folder to mark
        path: PathBuf,

        /// What this milestone is about (asked for when omitted)
        message: Option<String>,
    },

    /// Recreate every milestone next to the file or folder
    Show {
        /// File or folder to show milestones of
        path: PathBuf,
    },

    /// Return to a milestone
    Return {
        /// A milestone copy, or the file or folder itself with --revision
        path: PathBuf,

        /// Revision id (or a unique prefix) to return to
        #[arg(long)]
        revision: Option<String>,
    },

    /// Send a report about a problem
    Report,

    /// Copy a file or folder into the share folder
    Share {
        /// File or folder to share
        path: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let ui = ConsoleUi::new();

    if let Err(e) = logger::rotate_log_if_needed() {
        eprintln!("Warning: Failed to rotate log file: {e:#}");
    }
    if let Err(e) = logger::init_logger(cli.debug) {
        eprintln!("Warning: Failed to initialize logging: {e:#}");
    }

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            log::warn!("Using default settings: {e:#}");
            ui.alert(&format!("Your settings could not be read, using defaults: {e:#}"));
            Settings::default()
        }
    };

    if !matches!(cli.command, Commands::Report) {
        if let Err(e) = identity::ensure_identity(&ui, &GlobalGitIdentity) {
            log::warn!("Identity check failed: {e:#}");
        }
    }

    let result = match &cli.command {
        Commands::Mark { path, message } => handlers::handle_mark(&ui, path, message.as_deref()),
        Commands::Show { path } => handlers::handle_show(&ui, &settings, path),
        Commands::Return { path, revision } => {
            handlers::handle_return(&ui, &settings, path, revision.as_deref())
        }
        Commands::Report => handlers::handle_report(&ui, &settings),
        Commands::Share { path } => handlers::handle_share(&ui, &settings, path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let outbox = OutboxSender::from_config().unwrap_or_else(|_| {
                OutboxSender::new(std::env::temp_dir().join("milestones-outbox"))
            });
            ExitCode::from(handlers::report_failure(&ui, &settings, &outbox, &err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_return_with_revision() {
        let cli = Cli::try_parse_from([
            "milestones",
            "return",
            "report.docx",
            "--revision=abc123",
            "--debug",
        ])
        .unwrap();

        assert!(cli.debug);
        match cli.command {
            Commands::Return { path, revision } => {
                assert_eq!(path, PathBuf::from("report.docx"));
                assert_eq!(revision.as_deref(), Some("abc123"));
            }
            _ => panic!("expected return"),
        }
    }

    #[test]
    fn test_parse_mark_message_is_optional() {
        let cli = Cli::try_parse_from(["milestones", "mark", "notes.txt"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Mark { message: None, .. }
        ));
    }
}
