//! Configuration types for dock-collector

use crate::error::{Error, Result};
use crate::types::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Placeholder substituted with the tenant identifier in [`ApiConfig::url_template`]
pub const TENANT_PLACEHOLDER: &str = "{tenant}";

/// Remote API settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint template; `{tenant}` is replaced with the tenant identifier
    /// (default: the VTEX logistics docks endpoint)
    #[serde(default = "default_url_template")]
    pub url_template: String,

    /// Per-request timeout (default: 15 seconds)
    #[serde(default = "default_request_timeout", with = "duration_secs_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url_template: default_url_template(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Per-tenant loop settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Fixed pause between two tenants (default: 100 ms)
    #[serde(default = "default_inter_tenant_delay", with = "duration_millis_serde")]
    pub inter_tenant_delay: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            inter_tenant_delay: default_inter_tenant_delay(),
        }
    }
}

/// Output file settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory used when the caller gives no output path (default: `~/Documents`)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Format used by front ends when none is chosen (default: xlsx)
    #[serde(default)]
    pub default_format: OutputFormat,

    /// Prefix of generated file names (default: "dock_times")
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            default_format: OutputFormat::default(),
            file_prefix: default_file_prefix(),
        }
    }
}

/// Audit trail settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Append-only CSV log of every log event (default: `~/Documents/api_logs.csv`)
    #[serde(default = "default_audit_log")]
    pub log_file: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_file: default_audit_log(),
        }
    }
}

/// Main configuration for [`DockCollector`](crate::DockCollector)
///
/// Every section has defaults, so an empty JSON object is a valid configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Per-tenant loop settings
    #[serde(default)]
    pub collection: CollectionConfig,

    /// Output file settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Load a configuration from a JSON file and validate it
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot enforce
    pub fn validate(&self) -> Result<()> {
        if !self.api.url_template.contains(TENANT_PLACEHOLDER) {
            return Err(Error::config(
                "api.url_template",
                format!("template must contain {}", TENANT_PLACEHOLDER),
            ));
        }

        let sample = self.api.url_template.replace(TENANT_PLACEHOLDER, "tenant");
        let parsed = url::Url::parse(&sample)
            .map_err(|e| Error::config("api.url_template", format!("invalid URL: {}", e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(
                "api.url_template",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        if self.api.request_timeout.is_zero() {
            return Err(Error::config(
                "api.request_timeout",
                "timeout must be greater than zero",
            ));
        }

        if self.output.file_prefix.trim().is_empty() {
            return Err(Error::config("output.file_prefix", "prefix cannot be empty"));
        }

        Ok(())
    }
}

// Default value functions
fn default_url_template() -> String {
    "https://{tenant}.vtexcommercestable.com.br/api/logistics/pvt/configuration/docks".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_inter_tenant_delay() -> Duration {
    Duration::from_millis(100)
}

fn default_file_prefix() -> String {
    "dock_times".into()
}

fn documents_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(|home| PathBuf::from(home).join("Documents"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_output_dir() -> PathBuf {
    documents_dir()
}

fn default_audit_log() -> PathBuf {
    documents_dir().join("api_logs.csv")
}

// Duration serialization helpers
mod duration_secs_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
