//! Analyzer commands.

use std::path::{Path, PathBuf};

use ddan_common::hash::hash_file;
use ddan_common::identity::ClientIdentity;
use ddan_common::report::ReportType;
use ddan_common::settings::Settings;
use ddan_common::transport::{HttpResponse, Transport, UreqTransport};
use ddan_common::DdanClient;

use crate::error::CliError;

/// One call against the analyzer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Register,
    TestConnection,
    BlackLists { last_query_id: String },
    Submit { file: PathBuf },
    Upload { file: PathBuf, password: String },
    Report { sha1: String, report_type: ReportType },
}

/// Connect to the configured analyzer and perform `action`.
///
/// Every action except `Register` registers the client first.
pub fn run(settings: &Settings, action: &Action) -> Result<String, CliError> {
    let transport = UreqTransport::from_settings(settings)?;
    let client = match action {
        Action::Register => DdanClient::with_identity(
            settings,
            ClientIdentity::from_settings(settings),
            transport,
        ),
        _ => DdanClient::new(settings, transport)?,
    };

    log::info!("Analyzer: {}", settings.service_url());
    log::info!("Client UUID: {}", client.identity().uuid());

    execute(&client, action)
}

/// Perform `action` with an already constructed client and render the output.
pub fn execute<T: Transport>(client: &DdanClient<T>, action: &Action) -> Result<String, CliError> {
    let output = match action {
        Action::Register => {
            let response = client.register()?;
            format!(
                "Registered client {}\n{}",
                client.identity().uuid(),
                render(&response)
            )
        }
        Action::TestConnection => render(&client.test_connection()?),
        Action::BlackLists { last_query_id } => render(&client.get_black_lists(last_query_id)?),
        Action::Submit { file } => render(&client.submit_file(file)?),
        Action::Upload { file, password } => render(&client.upload_sample(file, password)?),
        Action::Report { sha1, report_type } => {
            let report = client.get_report(sha1, *report_type)?;
            serde_json::to_string_pretty(&report)
                .map_err(|e| CliError::Analyzer(format!("Failed to render report: {e}")))?
        }
    };
    Ok(output)
}

/// SHA1 of a local file, as `get_report` expects it.
pub fn hash(file: &Path) -> Result<String, CliError> {
    Ok(hash_file(file)?)
}

fn render(response: &HttpResponse) -> String {
    if response.body.trim().is_empty() {
        format!("HTTP {}", response.status)
    } else {
        response.body.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;

    use ddan_common::error::DdanError;
    use ddan_common::transport::HttpRequest;
    use error_stack::Report;

    struct FixedTransport {
        status: u16,
        body: String,
        urls: Mutex<Vec<String>>,
    }

    impl FixedTransport {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().expect("urls lock").clone()
        }
    }

    impl std::fmt::Debug for FixedTransport {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FixedTransport")
                .field("status", &self.status)
                .finish_non_exhaustive()
        }
    }

    impl Transport for FixedTransport {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, Report<DdanError>> {
            self.urls
                .lock()
                .expect("urls lock")
                .push(request.url.clone());
            Ok(HttpResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }
    }

    fn client(status: u16, body: &str) -> DdanClient<FixedTransport> {
        let settings = Settings::from_toml(
            "[analyzer]\nhost = \"analyzer.test\"\napi_key = \"ABCD\"\n[client]\nhostname = \"h\"\n",
        )
        .expect("settings");
        let identity = ClientIdentity::with_uuid(&settings, "u1");
        DdanClient::with_identity(&settings, identity, FixedTransport::new(status, body))
    }

    #[test]
    fn test_register_output() {
        let client = client(200, "");
        let output = execute(&client, &Action::Register).expect("registered");
        assert_eq!(output, "Registered client u1\nHTTP 200");
        assert_eq!(
            client.transport().urls(),
            vec!["https://analyzer.test/web_service/sample_upload/register"]
        );
    }

    #[test]
    fn test_blacklists_prints_body() {
        let client = client(200, "<BLACK_LISTS/>");
        let output = execute(
            &client,
            &Action::BlackLists {
                last_query_id: "0".into(),
            },
        )
        .expect("blacklists");
        assert_eq!(output, "<BLACK_LISTS/>");
    }

    #[test]
    fn test_report_renders_json() {
        let client = client(200, "<REPORTS><R>1</R></REPORTS>");
        let output = execute(
            &client,
            &Action::Report {
                sha1: "deadbeef".into(),
                report_type: ReportType::SingleImage,
            },
        )
        .expect("report");
        let value: serde_json::Value = serde_json::from_str(&output).expect("json output");
        assert_eq!(value["REPORTS"]["R"], "1");
    }

    #[test]
    fn test_submit_sends_to_simple_upload() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let file = dir.path().join("sample.bin");
        fs::write(&file, b"payload").expect("write sample");

        let client = client(200, "");
        execute(&client, &Action::Submit { file }).expect("submitted");
        assert_eq!(
            client.transport().urls(),
            vec!["https://analyzer.test/web_service/sample_upload/simple_upload_sample"]
        );
    }

    #[test]
    fn test_hash_prints_file_sha1() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let file = dir.path().join("sample.bin");
        fs::write(&file, b"abc").expect("write sample");

        assert_eq!(
            hash(&file).expect("hash"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert!(matches!(
            hash(&dir.path().join("missing.bin")),
            Err(CliError::Input(_))
        ));
    }

    #[test]
    fn test_http_error_becomes_analyzer_error() {
        let client = client(403, "denied");
        let result = execute(&client, &Action::TestConnection);
        assert!(matches!(result, Err(CliError::Analyzer(_))));
    }

    #[test]
    fn test_invalid_last_query_id_is_rejected() {
        let client = client(200, "");
        let result = execute(
            &client,
            &Action::BlackLists {
                last_query_id: "latest".into(),
            },
        );
        assert!(matches!(result, Err(CliError::Input(_))));
        assert!(client.transport().urls().is_empty());
    }
}
