//! DTAS request signing.
//!
//! A signed header set is the caller's headers plus `X-DTAS-ProtocolVersion`,
//! `X-DTAS-Time`, `X-DTAS-Challenge` and finally `X-DTAS-Checksum`, which is
//! computed last, once every header it covers is final.

use std::fmt;

use error_stack::{Report, ResultExt};

use crate::constants::{
    DEFAULT_PROTOCOL_VERSION, HEADER_CHALLENGE, HEADER_CHECKSUM,
    HEADER_CHECKSUM_CALCULATING_ORDER, HEADER_PROTOCOL_VERSION, HEADER_TIME,
};
use crate::error::DdanError;
use crate::headers::HeaderSet;

use super::challenge::CommonFields;
use super::checksum::{compute_checksum, parse_checksum_order};

/// Where the signer takes the checksum order from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChecksumOrder {
    /// Use the `X-DTAS-ChecksumCalculatingOrder` header supplied by the caller.
    #[default]
    FromHeader,
    /// Use these names and publish them as the order header.
    Pinned(Vec<String>),
}

/// Per-call signing options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningConfig {
    pub protocol_version: String,
    pub order: ChecksumOrder,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            order: ChecksumOrder::FromHeader,
        }
    }
}

impl SigningConfig {
    pub fn with_protocol_version(protocol_version: impl Into<String>) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            ..Self::default()
        }
    }
}

/// Signs outgoing requests with the shared API key.
#[derive(Clone)]
pub struct RequestSigner {
    secret: String,
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl RequestSigner {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign `call_headers` with a fresh timestamp and challenge.
    ///
    /// # Errors
    ///
    /// See [`RequestSigner::sign_with`].
    pub fn sign(
        &self,
        call_headers: &HeaderSet,
        config: &SigningConfig,
    ) -> Result<HeaderSet, Report<DdanError>> {
        self.sign_with(call_headers, config, CommonFields::fresh())
    }

    /// Sign `call_headers` using the given time and challenge.
    ///
    /// Call-specific headers override the injected common fields on collision.
    /// `call_headers` is left untouched; a new set is returned.
    ///
    /// # Errors
    ///
    /// - [`DdanError::Configuration`] if the checksum order is absent or malformed
    /// - [`DdanError::MissingHeader`] if the order names a header with no value
    pub fn sign_with(
        &self,
        call_headers: &HeaderSet,
        config: &SigningConfig,
        common: CommonFields,
    ) -> Result<HeaderSet, Report<DdanError>> {
        let mut headers = HeaderSet::new();
        headers.insert(HEADER_PROTOCOL_VERSION, config.protocol_version.as_str());
        headers.insert(HEADER_TIME, common.time);
        headers.insert(HEADER_CHALLENGE, common.challenge);
        headers.extend_from(call_headers);

        let order = match &config.order {
            ChecksumOrder::FromHeader => {
                let declared = headers.get(HEADER_CHECKSUM_CALCULATING_ORDER).ok_or_else(|| {
                    Report::new(DdanError::Configuration {
                        message: format!("Request has no {HEADER_CHECKSUM_CALCULATING_ORDER} header"),
                    })
                })?;
                parse_checksum_order(declared)?
            }
            ChecksumOrder::Pinned(names) => {
                let declared = names.join(",");
                let order = parse_checksum_order(&declared)
                    .attach("Pinned checksum order is invalid")?;
                headers.insert(HEADER_CHECKSUM_CALCULATING_ORDER, declared);
                order
            }
        };

        let checksum = compute_checksum(&self.secret, &headers, &order)?;
        log::debug!("Signed request over [{}]: {}", order.join(","), checksum);

        headers.insert(HEADER_CHECKSUM, checksum);
        Ok(headers)
    }
}
