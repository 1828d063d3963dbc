//! SHA1 helpers for samples and archives.

use std::fs::File;
use std::io;
use std::path::Path;

use error_stack::{Report, ResultExt};
use sha1::{Digest, Sha1};

use crate::error::DdanError;

/// Lowercase hex SHA1 of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Lowercase hex SHA1 of the file at `path`, streamed without loading it.
///
/// The file handle is closed before this returns.
///
/// # Errors
///
/// Returns [`DdanError::Io`] if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> Result<String, Report<DdanError>> {
    let io_error = || DdanError::Io {
        message: format!("Failed to hash {}", path.display()),
    };

    let mut file = File::open(path).change_context_lazy(io_error)?;
    let mut hasher = Sha1::new();
    io::copy(&mut file, &mut hasher).change_context_lazy(io_error)?;
    Ok(hex::encode(hasher.finalize()))
}
