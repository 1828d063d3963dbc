//! HTTP transport for signed DTAS requests.
//!
//! [`Transport`] is the seam between the client and the network. The
//! production implementation, [`UreqTransport`], performs blocking HTTPS calls
//! with TLS verification either disabled or pinned to a CA bundle.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use error_stack::{Report, ResultExt};
use ureq::tls::{parse_pem, Certificate, PemItem, RootCerts, TlsConfig};
use ureq::Agent;

use crate::error::DdanError;
use crate::headers::HeaderSet;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
        }
    }
}

/// Encoded request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestBody {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HeaderSet,
    pub body: Option<RequestBody>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into a [`DdanError::Transport`].
    ///
    /// # Errors
    ///
    /// Returns the transport error carrying status and body when the status
    /// is not in the 2xx range.
    pub fn error_for_status(self) -> Result<Self, Report<DdanError>> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(Report::new(DdanError::Transport {
                message: format!("Analyzer returned HTTP {}", self.status),
                status: Some(self.status),
                body: Some(self.body),
            }))
        }
    }
}

/// Performs one HTTP exchange.
///
/// Implementations return the response for any status code; interpreting the
/// status is left to the caller.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`DdanError::Transport`] when no response could be obtained.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Report<DdanError>>;
}

/// Certificate verification mode for a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    /// Accept any certificate. Appliances ship with self-signed certificates.
    Disabled,
    /// Trust only the certificates in this PEM bundle.
    CaBundle(PathBuf),
}

impl TlsMode {
    pub fn from_settings(settings: &Settings) -> Self {
        match (settings.tls.verify, &settings.tls.ca_bundle) {
            (true, Some(path)) => TlsMode::CaBundle(path.clone()),
            _ => TlsMode::Disabled,
        }
    }
}

/// Blocking HTTPS transport backed by `ureq`.
pub struct UreqTransport {
    agent: Agent,
    tls_mode: TlsMode,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport")
            .field("tls_mode", &self.tls_mode)
            .finish_non_exhaustive()
    }
}

impl UreqTransport {
    /// Build a transport with the given verification mode and global timeout.
    ///
    /// # Errors
    ///
    /// Returns [`DdanError::Configuration`] if the CA bundle cannot be read or
    /// holds no certificates.
    pub fn new(tls_mode: TlsMode, timeout: Duration) -> Result<Self, Report<DdanError>> {
        let tls_config = match &tls_mode {
            TlsMode::Disabled => {
                log::warn!("TLS certificate verification is disabled for analyzer requests");
                TlsConfig::builder().disable_verification(true).build()
            }
            TlsMode::CaBundle(path) => {
                let certs = load_ca_bundle(path)?;
                TlsConfig::builder()
                    .root_certs(RootCerts::Specific(Arc::new(certs)))
                    .build()
            }
        };

        let config = Agent::config_builder()
            .tls_config(tls_config)
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: Agent::new_with_config(config),
            tls_mode,
        })
    }

    /// Build a transport from the `[tls]` settings section.
    ///
    /// # Errors
    ///
    /// See [`UreqTransport::new`].
    pub fn from_settings(settings: &Settings) -> Result<Self, Report<DdanError>> {
        Self::new(
            TlsMode::from_settings(settings),
            Duration::from_secs(settings.tls.timeout_secs),
        )
    }

    pub fn tls_mode(&self) -> &TlsMode {
        &self.tls_mode
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Report<DdanError>> {
        let transport_error = || DdanError::Transport {
            message: format!("{} {} failed", request.method, request.url),
            status: None,
            body: None,
        };

        log::debug!("{} {}", request.method, request.url);

        // Header names go out lowercased (`x-dtas-clientuuid`); the appliance
        // matches them case-insensitively. Values are sent verbatim, so the
        // mixed-case names inside `X-DTAS-ChecksumCalculatingOrder` still have
        // to match the names the checksum was computed over.
        let response = match request.method {
            HttpMethod::Get => {
                let mut builder = self.agent.get(&request.url);
                for (name, value) in request.headers.iter() {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Put => {
                let mut builder = if request.method == HttpMethod::Post {
                    self.agent.post(&request.url)
                } else {
                    self.agent.put(&request.url)
                };
                for (name, value) in request.headers.iter() {
                    builder = builder.header(name, value);
                }
                match &request.body {
                    Some(body) => builder
                        .header("Content-Type", body.content_type.as_str())
                        .send(body.bytes.as_slice()),
                    None => builder.send_empty(),
                }
            }
        }
        .change_context_lazy(transport_error)?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .change_context_lazy(transport_error)
            .attach(format!("Reading body of HTTP {status} response"))?;

        log::debug!("{} {} -> HTTP {}", request.method, request.url, status);
        Ok(HttpResponse { status, body })
    }
}

fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate<'static>>, Report<DdanError>> {
    let pem = fs::read(path).change_context(DdanError::Configuration {
        message: format!("Failed to read CA bundle {}", path.display()),
    })?;

    let certs: Vec<Certificate<'static>> = parse_pem(&pem)
        .filter_map(|item| match item {
            Ok(PemItem::Certificate(cert)) => Some(cert.to_owned()),
            _ => None,
        })
        .collect();

    if certs.is_empty() {
        return Err(Report::new(DdanError::Configuration {
            message: format!("CA bundle {} contains no certificates", path.display()),
        }));
    }
    Ok(certs)
}
