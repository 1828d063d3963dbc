//! Deep Discovery Analyzer sample upload client.
//!
//! One method per web service endpoint under `/web_service/sample_upload/`.
//! Every request is signed independently: a fresh time and challenge are drawn
//! and the checksum is recomputed over the endpoint's checksum order.

use std::fs;
use std::path::Path;

use chrono::Local;
use error_stack::{Report, ResultExt};
use serde_json::Value;

use crate::archive::build_sample_archive;
use crate::constants::{
    ENDPOINT_GET_BLACK_LISTS, ENDPOINT_GET_REPORT, ENDPOINT_REGISTER,
    ENDPOINT_SIMPLE_UPLOAD_SAMPLE, ENDPOINT_TEST_CONNECTION, ENDPOINT_UPLOAD_SAMPLE,
    FORM_FIELD_ARCHIVE, FORM_FIELD_UPLOAD_SAMPLE, HEADER_ARCHIVE_FILENAME, HEADER_ARCHIVE_SHA1,
    HEADER_CHALLENGE, HEADER_CHECKSUM_CALCULATING_ORDER, HEADER_CLIENT_HOSTNAME,
    HEADER_CLIENT_UUID, HEADER_LAST_QUERY_ID, HEADER_PRODUCT_NAME, HEADER_PROTOCOL_VERSION,
    HEADER_REPORT_TYPE, HEADER_SAMPLE_TYPE, HEADER_SHA1, HEADER_SOURCE_ID, HEADER_SOURCE_NAME,
    HEADER_TIME, SAMPLE_TYPE_FILE,
};
use crate::error::DdanError;
use crate::hash::sha1_hex;
use crate::headers::HeaderSet;
use crate::identity::ClientIdentity;
use crate::multipart::file_part;
use crate::report::{empty_report, parse_report, ReportType};
use crate::request_signing::{RequestSigner, SigningConfig};
use crate::settings::Settings;
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, UreqTransport};

fn checksum_order(names: &[&str]) -> String {
    names.join(",")
}

/// Client for one analyzer appliance.
#[derive(Debug)]
pub struct DdanClient<T: Transport> {
    identity: ClientIdentity,
    signer: RequestSigner,
    signing: SigningConfig,
    base_url: String,
    transport: T,
}

impl DdanClient<UreqTransport> {
    /// Create a client over HTTPS and register it with the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport cannot be configured or registration
    /// fails.
    pub fn connect(settings: &Settings) -> Result<Self, Report<DdanError>> {
        let transport = UreqTransport::from_settings(settings)?;
        Self::new(settings, transport)
    }
}

impl<T: Transport> DdanClient<T> {
    /// Create a client with a new identity and register it with the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the registration request fails.
    pub fn new(settings: &Settings, transport: T) -> Result<Self, Report<DdanError>> {
        let client = Self::with_identity(settings, ClientIdentity::from_settings(settings), transport);
        client
            .register()
            .attach(format!("Registering client {}", client.identity.uuid()))?;
        Ok(client)
    }

    /// Create a client for an existing identity without registering.
    pub fn with_identity(settings: &Settings, identity: ClientIdentity, transport: T) -> Self {
        Self {
            signer: RequestSigner::new(identity.api_key()),
            identity,
            signing: SigningConfig::with_protocol_version(settings.analyzer.protocol_version.as_str()),
            base_url: settings.service_url(),
            transport,
        }
    }

    pub fn identity(&self) -> &ClientIdentity {
        &self.identity
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Register or update this client's registration on the analyzer.
    ///
    /// # Errors
    ///
    /// Returns [`DdanError::Transport`] on network failure or a non-2xx status.
    pub fn register(&self) -> Result<HttpResponse, Report<DdanError>> {
        let headers: HeaderSet = [
            (HEADER_PRODUCT_NAME, self.identity.product_name()),
            (HEADER_CLIENT_HOSTNAME, self.identity.hostname()),
            (HEADER_CLIENT_UUID, self.identity.uuid()),
            (HEADER_SOURCE_ID, self.identity.source_id()),
            (HEADER_SOURCE_NAME, self.identity.source_name()),
            (
                HEADER_CHECKSUM_CALCULATING_ORDER,
                checksum_order(&[
                    HEADER_PROTOCOL_VERSION,
                    HEADER_PRODUCT_NAME,
                    HEADER_CLIENT_HOSTNAME,
                    HEADER_CLIENT_UUID,
                    HEADER_SOURCE_ID,
                    HEADER_SOURCE_NAME,
                    HEADER_TIME,
                    HEADER_CHALLENGE,
                ])
                .as_str(),
            ),
        ]
        .into_iter()
        .collect();

        log::info!("Registering client {} with analyzer", self.identity.uuid());
        self.send(HttpMethod::Get, ENDPOINT_REGISTER, &headers, None)
    }

    /// Check that the settings and the connection to the analyzer API work.
    ///
    /// # Errors
    ///
    /// Returns [`DdanError::Transport`] on network failure or a non-2xx status.
    pub fn test_connection(&self) -> Result<HttpResponse, Report<DdanError>> {
        let headers: HeaderSet = [(
            HEADER_CHECKSUM_CALCULATING_ORDER,
            checksum_order(&[HEADER_PROTOCOL_VERSION, HEADER_TIME, HEADER_CHALLENGE]),
        )]
        .into_iter()
        .collect();

        self.send(HttpMethod::Get, ENDPOINT_TEST_CONNECTION, &headers, None)
    }

    /// Fetch blacklist entries added since `last_query_id` (`"0"` for all).
    ///
    /// # Errors
    ///
    /// - [`DdanError::InvalidArgument`] if `last_query_id` is not a decimal number
    /// - [`DdanError::Transport`] on network failure or a non-2xx status
    pub fn get_black_lists(&self, last_query_id: &str) -> Result<HttpResponse, Report<DdanError>> {
        if last_query_id.is_empty() || !last_query_id.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Report::new(DdanError::InvalidArgument {
                message: format!("last_query_id must be a decimal string, got {last_query_id:?}"),
            }));
        }

        let headers: HeaderSet = [
            (HEADER_CLIENT_UUID, self.identity.uuid()),
            (HEADER_LAST_QUERY_ID, last_query_id),
            (
                HEADER_CHECKSUM_CALCULATING_ORDER,
                checksum_order(&[
                    HEADER_PROTOCOL_VERSION,
                    HEADER_CLIENT_UUID,
                    HEADER_LAST_QUERY_ID,
                    HEADER_TIME,
                    HEADER_CHALLENGE,
                ])
                .as_str(),
            ),
        ]
        .into_iter()
        .collect();

        self.send(HttpMethod::Get, ENDPOINT_GET_BLACK_LISTS, &headers, None)
    }

    /// Upload a single file for analysis.
    ///
    /// # Errors
    ///
    /// - [`DdanError::Io`] if the file cannot be read
    /// - [`DdanError::Transport`] on network failure or a non-2xx status
    pub fn submit_file(&self, path: &Path) -> Result<HttpResponse, Report<DdanError>> {
        // The signed SHA1 must describe exactly the bytes that are uploaded.
        let contents = fs::read(path).change_context(DdanError::Io {
            message: format!("Failed to read sample {}", path.display()),
        })?;
        let sha1 = sha1_hex(&contents);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| sha1.clone());

        let headers: HeaderSet = [
            (HEADER_CLIENT_UUID, self.identity.uuid()),
            (HEADER_SOURCE_ID, self.identity.source_id()),
            (HEADER_SOURCE_NAME, self.identity.source_name()),
            (HEADER_SHA1, sha1.as_str()),
            (HEADER_SAMPLE_TYPE, SAMPLE_TYPE_FILE),
            (
                HEADER_CHECKSUM_CALCULATING_ORDER,
                checksum_order(&[
                    HEADER_PROTOCOL_VERSION,
                    HEADER_CLIENT_UUID,
                    HEADER_SOURCE_ID,
                    HEADER_SOURCE_NAME,
                    HEADER_SHA1,
                    HEADER_TIME,
                    HEADER_SAMPLE_TYPE,
                    HEADER_CHALLENGE,
                ])
                .as_str(),
            ),
        ]
        .into_iter()
        .collect();

        log::info!("Submitting {} ({})", path.display(), sha1);
        let body = file_part(FORM_FIELD_UPLOAD_SAMPLE, &file_name, &contents);
        self.send(
            HttpMethod::Post,
            ENDPOINT_SIMPLE_UPLOAD_SAMPLE,
            &headers,
            Some(body),
        )
    }

    /// Upload a file packaged as a metadata + log + payload archive.
    ///
    /// # Errors
    ///
    /// - [`DdanError::Io`] / [`DdanError::Archive`] if packaging fails
    /// - [`DdanError::Transport`] on network failure or a non-2xx status
    pub fn upload_sample(
        &self,
        path: &Path,
        archive_password: &str,
    ) -> Result<HttpResponse, Report<DdanError>> {
        let archive = build_sample_archive(path, archive_password, &self.identity, &Local::now())?;

        let headers: HeaderSet = [
            (HEADER_CLIENT_UUID, self.identity.uuid()),
            (HEADER_SOURCE_ID, self.identity.source_id()),
            (HEADER_SOURCE_NAME, self.identity.source_name()),
            (HEADER_ARCHIVE_SHA1, archive.sha1.as_str()),
            (HEADER_ARCHIVE_FILENAME, archive.file_name.as_str()),
            (
                HEADER_CHECKSUM_CALCULATING_ORDER,
                checksum_order(&[
                    HEADER_PROTOCOL_VERSION,
                    HEADER_CLIENT_UUID,
                    HEADER_SOURCE_ID,
                    HEADER_SOURCE_NAME,
                    HEADER_ARCHIVE_SHA1,
                    HEADER_ARCHIVE_FILENAME,
                    HEADER_TIME,
                    HEADER_CHALLENGE,
                ])
                .as_str(),
            ),
        ]
        .into_iter()
        .collect();

        let body = file_part(FORM_FIELD_ARCHIVE, FORM_FIELD_ARCHIVE, &archive.bytes);
        self.send(HttpMethod::Put, ENDPOINT_UPLOAD_SAMPLE, &headers, Some(body))
    }

    /// Fetch the analysis report for a sample SHA1.
    ///
    /// A body that is not well-formed XML yields an empty object rather than
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`DdanError::Transport`] on network failure or a non-2xx status.
    pub fn get_report(
        &self,
        sha1: &str,
        report_type: ReportType,
    ) -> Result<Value, Report<DdanError>> {
        let headers: HeaderSet = [
            (HEADER_CLIENT_UUID, self.identity.uuid()),
            (HEADER_SHA1, sha1),
            (HEADER_REPORT_TYPE, report_type.header_value()),
            (
                HEADER_CHECKSUM_CALCULATING_ORDER,
                checksum_order(&[
                    HEADER_PROTOCOL_VERSION,
                    HEADER_CLIENT_UUID,
                    HEADER_SHA1,
                    HEADER_REPORT_TYPE,
                    HEADER_TIME,
                    HEADER_CHALLENGE,
                ])
                .as_str(),
            ),
        ]
        .into_iter()
        .collect();

        let response = self.send(HttpMethod::Get, ENDPOINT_GET_REPORT, &headers, None)?;

        match parse_report(&response.body) {
            Ok(report) => Ok(report),
            Err(e) => {
                log::warn!("Discarding unparseable report for {}: {:?}", sha1, e);
                Ok(empty_report())
            }
        }
    }

    fn send(
        &self,
        method: HttpMethod,
        endpoint: &str,
        call_headers: &HeaderSet,
        body: Option<RequestBody>,
    ) -> Result<HttpResponse, Report<DdanError>> {
        let headers = self
            .signer
            .sign(call_headers, &self.signing)
            .attach(format!("Signing {endpoint} request"))?;

        let request = HttpRequest {
            method,
            url: format!("{}/{}", self.base_url, endpoint),
            headers,
            body,
        };

        let response = self.transport.execute(&request)?;
        log::info!("{} {} -> HTTP {}", method, endpoint, response.status);
        response.error_for_status()
    }
}
