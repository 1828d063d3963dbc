//! DTAS checksum derivation.
//!
//! The checksum is `hex(SHA1(secret || v1 || v2 || ...))` where `v1..vn` are
//! the values of the headers listed in `X-DTAS-ChecksumCalculatingOrder`, in
//! that order, with no separators.

use error_stack::Report;
use sha1::{Digest, Sha1};

use crate::constants::{HEADER_CHECKSUM, HEADER_CHECKSUM_CALCULATING_ORDER};
use crate::error::DdanError;
use crate::headers::HeaderSet;

/// Split a checksum order value into header names.
///
/// # Errors
///
/// Returns [`DdanError::Configuration`] if the list is empty, has an empty or
/// padded entry, or names the order header or the checksum header itself.
pub fn parse_checksum_order(order: &str) -> Result<Vec<String>, Report<DdanError>> {
    if order.is_empty() {
        return Err(Report::new(DdanError::Configuration {
            message: "Checksum calculating order is empty".into(),
        }));
    }

    order
        .split(',')
        .map(|name| {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(Report::new(DdanError::Configuration {
                    message: format!("Malformed checksum order entry {name:?} in {order:?}"),
                }));
            }
            if name == HEADER_CHECKSUM_CALCULATING_ORDER || name == HEADER_CHECKSUM {
                return Err(Report::new(DdanError::Configuration {
                    message: format!("Checksum order may not reference {name}"),
                }));
            }
            Ok(name.to_string())
        })
        .collect()
}

/// Concatenate the named header values in order.
///
/// # Errors
///
/// Returns [`DdanError::MissingHeader`] naming the first absent header.
pub fn concatenate_values(
    headers: &HeaderSet,
    order: &[String],
) -> Result<String, Report<DdanError>> {
    let mut input = String::new();
    for name in order {
        let value = headers.get(name).ok_or_else(|| {
            Report::new(DdanError::MissingHeader { name: name.clone() })
        })?;
        input.push_str(value);
    }
    Ok(input)
}

/// Lowercase hex SHA1 over `secret` followed by `concatenated`.
pub fn digest_hex(secret: &str, concatenated: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(secret.as_bytes());
    hasher.update(concatenated.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compute the checksum of `headers` for the given order.
///
/// # Errors
///
/// Returns [`DdanError::MissingHeader`] if `order` names an absent header.
pub fn compute_checksum(
    secret: &str,
    headers: &HeaderSet,
    order: &[String],
) -> Result<String, Report<DdanError>> {
    let concatenated = concatenate_values(headers, order)?;
    Ok(digest_hex(secret, &concatenated))
}
