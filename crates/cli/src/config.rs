//! Configuration commands.
//!
//! Configuration is loaded from a TOML file and merged with environment
//! variables prefixed with `DDAN__`. For example, `DDAN__ANALYZER__HOST` will
//! override `analyzer.host` in the TOML file.

use std::fmt::Write as _;
use std::path::Path;

use ddan_common::settings::Settings;
use ddan_common::transport::TlsMode;

use crate::error::CliError;

const REDACTED: &str = "********";

/// Load configuration from a TOML file merged with environment variables.
pub(crate) fn load_settings(file: &Path) -> Result<Settings, CliError> {
    log::info!("Loading config from: {}", file.display());
    log::info!("Environment variables with DDAN__ prefix will be merged");

    Ok(Settings::from_file(file)?)
}

/// Render merged settings as TOML with the API key masked.
pub(crate) fn redacted_toml(settings: &Settings) -> Result<String, CliError> {
    let mut masked = settings.clone();
    masked.analyzer.api_key = REDACTED.to_string();
    Ok(toml::to_string_pretty(&masked)?)
}

/// Validate a configuration file and describe the result.
///
/// With `verbose`, the merged configuration is appended with the API key
/// masked.
pub fn validate(file: &Path, verbose: bool) -> Result<String, CliError> {
    let settings = load_settings(file)?;

    let tls = match TlsMode::from_settings(&settings) {
        TlsMode::Disabled => "disabled".to_string(),
        TlsMode::CaBundle(path) => path.display().to_string(),
    };
    let mut output = format!(
        "Configuration is valid\n  File: {}\n  Service URL: {}\n  TLS verification: {}\n",
        file.display(),
        settings.service_url(),
        tls
    );

    if verbose {
        let _ = write!(
            output,
            "\nMerged configuration:\n---\n{}---\n",
            redacted_toml(&settings)?
        );
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_config(dir: &TempDir) -> PathBuf {
        let config_path = dir.path().join("ddan.toml");
        fs::write(
            &config_path,
            r#"
[analyzer]
host = "10.0.0.5"
api_key = "00000000-AAAA-BBBB-CCCC-000000000000"

[client]
hostname = "sensor-01"
"#,
        )
        .expect("write config");
        config_path
    }

    #[test]
    fn test_validate_valid_config() {
        let dir = TempDir::new().expect("temp dir");
        let config_path = create_test_config(&dir);

        let output = validate(&config_path, false).expect("valid config");
        assert!(output.starts_with("Configuration is valid\n"));
        assert!(output.contains("Service URL: https://10.0.0.5/web_service/sample_upload"));
        assert!(!output.contains("Merged configuration"));
    }

    #[test]
    fn test_verbose_validate_output_starts_with_result() {
        let dir = TempDir::new().expect("temp dir");
        let config_path = create_test_config(&dir);

        let output = validate(&config_path, true).expect("valid config");
        assert!(output.starts_with("Configuration is valid\n"));
        assert!(!output.contains("Loading config"));
        assert!(output.contains("Merged configuration:"));
        assert!(output.contains(REDACTED));
    }

    #[test]
    fn test_validate_invalid_toml() {
        let dir = TempDir::new().expect("temp dir");
        let config_path = dir.path().join("invalid.toml");
        fs::write(&config_path, "invalid { toml").expect("write config");

        let result = validate(&config_path, false);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_validate_missing_required_fields() {
        let dir = TempDir::new().expect("temp dir");
        let config_path = dir.path().join("incomplete.toml");
        fs::write(&config_path, "[analyzer]\nhost = \"10.0.0.5\"\n").expect("write config");

        let result = validate(&config_path, false);
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn test_validate_nonexistent_file() {
        let dir = TempDir::new().expect("temp dir");
        let config_path = dir.path().join("nonexistent.toml");

        let result = validate(&config_path, false);
        assert!(matches!(result, Err(CliError::Input(_))));
    }

    #[test]
    fn test_redacted_toml_masks_api_key() {
        let dir = TempDir::new().expect("temp dir");
        let settings = load_settings(&create_test_config(&dir)).expect("settings");

        let rendered = redacted_toml(&settings).expect("toml");
        assert!(rendered.contains("host = \"10.0.0.5\""));
        assert!(rendered.contains(REDACTED));
        assert!(!rendered.contains("00000000-AAAA"));
        assert_eq!(settings.analyzer.api_key, "00000000-AAAA-BBBB-CCCC-000000000000");
    }
}
