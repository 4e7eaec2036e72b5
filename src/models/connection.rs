//! Connection settings for the storage server the console talks to.

use crate::errors::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_REGION: &str = "us-east-1";

/// Everything needed to reach one S3-compatible server.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Host name or IP, without scheme or path.
    #[serde(alias = "endPoint")]
    pub endpoint: String,
    #[serde(default = "default_port", deserialize_with = "port_from_number_or_string")]
    pub port: u16,
    pub access_key: String,
    pub secret_key: String,
    #[serde(rename = "useTLS", alias = "useSSL", alias = "useTls", default)]
    pub use_tls: bool,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

/// Browser forms post the port as text; accept both shapes.
fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(port) => Ok(port),
        Port::Text(text) if text.trim().is_empty() => Ok(DEFAULT_PORT),
        Port::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port `{text}`"))),
    }
}

impl ConnectionConfig {
    pub fn validate(&self) -> StorageResult<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(StorageError::Validation("endpoint is required".into()));
        }
        if endpoint.contains("://") || endpoint.contains('/') || endpoint.contains(char::is_whitespace)
        {
            return Err(StorageError::Validation(format!(
                "endpoint `{endpoint}` must be a bare host name"
            )));
        }
        if self.port == 0 {
            return Err(StorageError::Validation("port must be non-zero".into()));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(StorageError::Validation(
                "access key and secret key are required".into(),
            ));
        }
        Ok(())
    }

    /// `http(s)://host:port` as the SDK expects it.
    pub fn endpoint_url(&self) -> String {
        let scheme = if self.use_tls { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.endpoint.trim(), self.port)
    }

    pub fn summary(&self) -> ConnectionSummary {
        ConnectionSummary {
            endpoint: self.endpoint.clone(),
            port: self.port,
            use_tls: self.use_tls,
            region: self.region.clone(),
        }
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("region", &self.region)
            .finish()
    }
}

/// The part of a [`ConnectionConfig`] that is safe to show. Never carries keys.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub endpoint: String,
    pub port: u16,
    #[serde(rename = "useTLS")]
    pub use_tls: bool,
    pub region: String,
}

/// Body of `GET /status`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    pub config: Option<ConnectionSummary>,
    pub session_id: Option<Uuid>,
    pub connected_at: Option<DateTime<Utc>>,
}
