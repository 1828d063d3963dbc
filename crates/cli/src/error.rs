//! CLI error types.

use std::fmt;

use ddan_common::error::DdanError;
use ddan_common::logging::is_debug_enabled;
use error_stack::Report;

#[derive(Debug)]
pub enum CliError {
    /// Configuration file error
    Config(String),
    /// Analyzer request error
    Analyzer(String),
    /// Unreadable file or rejected argument
    Input(String),
    /// TOML serialization error
    Toml(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Analyzer(msg) => write!(f, "Analyzer error: {}", msg),
            CliError::Input(msg) => write!(f, "Input error: {}", msg),
            CliError::Toml(msg) => write!(f, "TOML error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        CliError::Toml(err.to_string())
    }
}

impl From<Report<DdanError>> for CliError {
    fn from(report: Report<DdanError>) -> Self {
        // The full report, with attachments, only at debug verbosity.
        let message = if is_debug_enabled() {
            format!("{report:?}")
        } else {
            report.current_context().to_string()
        };

        match report.current_context() {
            DdanError::Configuration { .. } => CliError::Config(message),
            DdanError::Io { .. } | DdanError::InvalidArgument { .. } => CliError::Input(message),
            _ => CliError::Analyzer(message),
        }
    }
}
