//! Deep Discovery Analyzer CLI.
//!
//! This tool provides commands for:
//! - Registering this client with an analyzer
//! - Submitting samples, plain or as a packaged archive
//! - Fetching blacklists and analysis reports
//! - Computing the SHA1 a report is looked up by
//! - Validating configuration files

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use ddan_common::constants::DEFAULT_ARCHIVE_PASSWORD;
use ddan_common::logging::{init_logging, level_from_verbosity};
use ddan_common::report::ReportType;

mod commands;
mod config;
mod error;

use commands::Action;
use error::CliError;

#[derive(Parser)]
#[command(name = "ddancli")]
#[command(about = "Deep Discovery Analyzer sample submission client")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the TOML configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "DDAN_CONFIG",
        default_value = "ddan.toml"
    )]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Register this client with the analyzer
    Register,

    /// Check the settings and the connection to the analyzer
    TestConnection,

    /// Fetch blacklist entries added since a query id
    Blacklists {
        /// Last query id seen; 0 fetches everything
        #[arg(long, default_value = "0")]
        last_query_id: String,
    },

    /// Submit a file for analysis
    Submit {
        /// File to submit
        file: PathBuf,
    },

    /// Upload a file packaged as a sample archive
    Upload {
        /// File to upload
        file: PathBuf,

        /// Archive password recorded in the metadata entry
        #[arg(long, default_value = DEFAULT_ARCHIVE_PASSWORD)]
        password: String,
    },

    /// Fetch the analysis report for a sample
    Report {
        /// SHA1 of the sample
        sha1: String,

        /// Which report to return
        #[arg(long, value_enum, default_value = "single")]
        report_type: ReportKind,
    },

    /// Print the SHA1 of a file, as used by `report`
    Hash {
        /// File to hash
        file: PathBuf,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate config against settings validation
    Validate,
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum ReportKind {
    Single,
    Multiple,
}

impl From<ReportKind> for ReportType {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Single => ReportType::SingleImage,
            ReportKind::Multiple => ReportType::MultipleImages,
        }
    }
}

impl Commands {
    fn into_action(self) -> Option<Action> {
        let action = match self {
            Commands::Register => Action::Register,
            Commands::TestConnection => Action::TestConnection,
            Commands::Blacklists { last_query_id } => Action::BlackLists { last_query_id },
            Commands::Submit { file } => Action::Submit { file },
            Commands::Upload { file, password } => Action::Upload { file, password },
            Commands::Report { sha1, report_type } => Action::Report {
                sha1,
                report_type: report_type.into(),
            },
            Commands::Hash { .. } | Commands::Config { .. } => return None,
        };
        Some(action)
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(level_from_verbosity(cli.verbose)) {
        eprintln!("Warning: {}", e.current_context());
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let output = match cli.command {
        Commands::Config {
            action: ConfigAction::Validate,
        } => config::validate(&cli.config, cli.verbose > 0)?,
        Commands::Hash { file } => commands::hash(&file)?,
        command => {
            let settings = config::load_settings(&cli.config)?;
            match command.into_action() {
                Some(action) => commands::run(&settings, &action)?,
                None => return Ok(()),
            }
        }
    };

    println!("{}", output.trim_end());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid arguments")
    }

    #[test]
    fn test_parse_defaults() {
        let cli = parse(&["ddancli", "blacklists"]);
        assert_eq!(cli.verbose, 0);
        assert_eq!(
            cli.command.into_action(),
            Some(Action::BlackLists {
                last_query_id: "0".into()
            })
        );
    }

    #[test]
    fn test_parse_global_options_after_command() {
        let cli = parse(&["ddancli", "test-connection", "-c", "/etc/ddan.toml", "-vv"]);
        assert_eq!(cli.config, PathBuf::from("/etc/ddan.toml"));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.command.into_action(), Some(Action::TestConnection));
    }

    #[test]
    fn test_parse_upload_default_password() {
        let cli = parse(&["ddancli", "upload", "sample.exe"]);
        assert_eq!(
            cli.command.into_action(),
            Some(Action::Upload {
                file: PathBuf::from("sample.exe"),
                password: "1234".into(),
            })
        );
    }

    #[test]
    fn test_parse_report_type() {
        let cli = parse(&[
            "ddancli",
            "report",
            "deadbeef",
            "--report-type",
            "multiple",
        ]);
        assert_eq!(
            cli.command.into_action(),
            Some(Action::Report {
                sha1: "deadbeef".into(),
                report_type: ReportType::MultipleImages,
            })
        );
    }

    #[test]
    fn test_config_validate_has_no_action() {
        let cli = parse(&["ddancli", "config", "validate"]);
        assert_eq!(cli.command.into_action(), None);
    }

    #[test]
    fn test_hash_has_no_action() {
        let cli = parse(&["ddancli", "hash", "sample.exe"]);
        assert!(matches!(cli.command, Commands::Hash { ref file } if file == &PathBuf::from("sample.exe")));
        assert_eq!(cli.command.into_action(), None);
    }

    #[test]
    fn test_submit_requires_file() {
        assert!(Cli::try_parse_from(["ddancli", "submit"]).is_err());
    }

    #[test]
    fn test_unknown_report_type_rejected() {
        assert!(
            Cli::try_parse_from(["ddancli", "report", "x", "--report-type", "all"]).is_err()
        );
    }
}
