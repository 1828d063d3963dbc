//! Client configuration.
//!
//! Settings are read from TOML and merged with environment variables prefixed
//! with `DDAN__`. For example, `DDAN__ANALYZER__API_KEY` overrides
//! `analyzer.api_key`.

use std::fs;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::constants::{
    DEFAULT_PRODUCT_NAME, DEFAULT_PROTOCOL_VERSION, DEFAULT_SOURCE_ID, DEFAULT_SOURCE_NAME,
};
use crate::error::DdanError;

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Analyzer {
    /// Address of the appliance, without scheme.
    #[validate(length(min = 1))]
    pub host: String,
    /// API key shown under the appliance help menu.
    #[validate(length(min = 1))]
    pub api_key: String,
    #[serde(default = "default_protocol_version")]
    #[validate(length(min = 1))]
    pub protocol_version: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Client {
    #[serde(default = "default_product_name")]
    #[validate(length(min = 1))]
    pub product_name: String,
    #[serde(default = "default_source_id")]
    #[validate(length(min = 1))]
    pub source_id: String,
    #[serde(default = "default_source_name")]
    #[validate(length(min = 1))]
    pub source_name: String,
    /// Reported client hostname; the system hostname is used when unset.
    #[serde(default)]
    pub hostname: Option<String>,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            product_name: default_product_name(),
            source_id: default_source_id(),
            source_name: default_source_name(),
            hostname: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[validate(schema(function = "validate_tls"))]
pub struct Tls {
    /// Verify the appliance certificate against `ca_bundle`.
    #[serde(default)]
    pub verify: bool,
    #[serde(default)]
    pub ca_bundle: Option<PathBuf>,
    #[serde(default = "default_timeout_secs")]
    #[validate(range(min = 1, max = 3600))]
    pub timeout_secs: u64,
}

impl Default for Tls {
    fn default() -> Self {
        Self {
            verify: false,
            ca_bundle: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub analyzer: Analyzer,
    #[serde(default)]
    #[validate(nested)]
    pub client: Client,
    #[serde(default)]
    #[validate(nested)]
    pub tls: Tls,
}

fn default_protocol_version() -> String {
    DEFAULT_PROTOCOL_VERSION.to_string()
}

fn default_product_name() -> String {
    DEFAULT_PRODUCT_NAME.to_string()
}

fn default_source_id() -> String {
    DEFAULT_SOURCE_ID.to_string()
}

fn default_source_name() -> String {
    DEFAULT_SOURCE_NAME.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn validate_tls(tls: &Tls) -> Result<(), ValidationError> {
    if tls.verify && tls.ca_bundle.is_none() {
        let mut err = ValidationError::new("ca_bundle_required");
        err.message = Some("tls.ca_bundle is required when tls.verify is true".into());
        return Err(err);
    }
    Ok(())
}

impl Settings {
    /// Parse settings from a TOML string, applying `DDAN__` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`DdanError::Configuration`] if the TOML is malformed, a required
    /// field is missing, or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<DdanError>> {
        let environment = Environment::default().prefix("DDAN").separator("__");

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(DdanError::Configuration {
                message: "Failed to build configuration".into(),
            })?;

        let settings: Settings =
            config
                .try_deserialize()
                .change_context(DdanError::Configuration {
                    message: "Failed to deserialize configuration".into(),
                })?;

        settings
            .validate()
            .change_context(DdanError::Configuration {
                message: "Settings validation failed".into(),
            })?;

        Ok(settings)
    }

    /// Read and parse a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns [`DdanError::Io`] if the file cannot be read, otherwise the
    /// errors of [`Settings::from_toml`].
    pub fn from_file(path: &Path) -> Result<Self, Report<DdanError>> {
        let content = fs::read_to_string(path).change_context(DdanError::Io {
            message: format!("Failed to read settings file {}", path.display()),
        })?;
        Self::from_toml(&content).attach(format!("Settings file: {}", path.display()))
    }

    /// Base URL of the sample upload web service.
    pub fn service_url(&self) -> String {
        format!(
            "https://{}{}",
            self.analyzer.host,
            crate::constants::SAMPLE_UPLOAD_BASE_PATH
        )
    }
}
