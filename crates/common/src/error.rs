//! Error types for the DDAN client.
//!
//! Every fallible operation returns `Result<T, Report<DdanError>>`; call sites
//! add context with [`error_stack::ResultExt::change_context`] and `attach`.

use derive_more::{Display, Error};

#[derive(Debug, Display, Error)]
pub enum DdanError {
    /// Malformed configuration or checksum-order contract.
    #[display("Configuration error: {message}")]
    Configuration { message: String },

    /// The checksum order names a header that is not present.
    #[display("Missing header referenced by checksum order: {name}")]
    MissingHeader { name: String },

    /// Caller supplied an argument the appliance would reject.
    #[display("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Network or HTTP failure talking to the analyzer.
    #[display("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// Local file access failed.
    #[display("IO error: {message}")]
    Io { message: String },

    /// Building the upload archive failed.
    #[display("Archive error: {message}")]
    Archive { message: String },

    /// The report body was not well-formed XML.
    #[display("Report parse error: {message}")]
    Parse { message: String },
}

impl DdanError {
    /// HTTP status attached to a transport failure, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            DdanError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, error_stack::Report<DdanError>>;
