//! Per-process client identity.

use std::fmt;

use uuid::Uuid;

use crate::settings::Settings;

/// Values identifying this client to the analyzer.
///
/// Built once when the client is created; nothing mutates it afterwards, so it
/// can be shared freely between threads.
#[derive(Clone)]
pub struct ClientIdentity {
    uuid: String,
    api_key: String,
    product_name: String,
    source_id: String,
    source_name: String,
    hostname: String,
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("uuid", &self.uuid)
            .field("api_key", &"<redacted>")
            .field("product_name", &self.product_name)
            .field("source_id", &self.source_id)
            .field("source_name", &self.source_name)
            .field("hostname", &self.hostname)
            .finish()
    }
}

impl ClientIdentity {
    /// Create an identity with a freshly generated client UUID.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_uuid(settings, Uuid::new_v4().to_string())
    }

    /// Create an identity reusing a known client UUID.
    pub fn with_uuid(settings: &Settings, uuid: impl Into<String>) -> Self {
        let hostname = settings
            .client
            .hostname
            .clone()
            .unwrap_or_else(system_hostname);

        Self {
            uuid: uuid.into(),
            api_key: settings.analyzer.api_key.clone(),
            product_name: settings.client.product_name.clone(),
            source_id: settings.client.source_id.clone(),
            source_name: settings.client.source_name.clone(),
            hostname,
        }
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }
}

/// Best-effort local hostname.
pub fn system_hostname() -> String {
    ["HOSTNAME", "COMPUTERNAME"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .chain(std::fs::read_to_string("/etc/hostname").ok())
        .map(|name| name.trim().to_string())
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_string())
}
