//! Core types for dock-collector

use crate::error::FetchError;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// Synthetic tenant id used for log events that are not tied to a tenant
pub const SYSTEM_TENANT: &str = "SYSTEM";

/// Literal written in place of any optional field missing from the API payload
pub const NOT_AVAILABLE: &str = "N/A";

/// Column order of the output file
pub const DOCK_RECORD_COLUMNS: [&str; 7] = [
    "timestamp",
    "tenant_id",
    "dock_id",
    "dock_name",
    "is_active",
    "dock_time_fake",
    "priority",
];

/// Timestamp format used in records and audit rows
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Account identifier used to template the per-tenant endpoint
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    /// Create a new TenantId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is empty once trimmed
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for TenantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TenantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse a free-text tenant list, one tenant per line
///
/// Lines are trimmed and blank lines dropped. Order and duplicates are kept.
///
/// # Examples
///
/// ```
/// use dock_collector::types::parse_tenant_list;
///
/// let tenants = parse_tenant_list("storea\n\n  storeb \nstorea\n");
/// let names: Vec<_> = tenants.iter().map(|t| t.as_str()).collect();
/// assert_eq!(names, ["storea", "storeb", "storea"]);
/// ```
pub fn parse_tenant_list(text: &str) -> Vec<TenantId> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(TenantId::from)
        .collect()
}

/// API credentials for one run
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Value of the `X-VTEX-API-AppKey` header
    pub app_key: String,
    /// Value of the `X-VTEX-API-AppToken` header
    pub app_token: String,
}

impl Credentials {
    /// Create a new credential pair
    pub fn new(app_key: impl Into<String>, app_token: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            app_token: app_token.into(),
        }
    }

    /// Both key and token are non-empty
    pub fn is_complete(&self) -> bool {
        !self.app_key.trim().is_empty() && !self.app_token.trim().is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_key", &self.app_key)
            .field("app_token", &"<redacted>")
            .finish()
    }
}

/// Tabular output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Comma-separated values
    Csv,
    /// Excel workbook (default)
    #[default]
    Xlsx,
}

impl OutputFormat {
    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "xlsx" | "excel" => Ok(OutputFormat::Xlsx),
            other => Err(format!("unknown output format '{}' (expected csv or xlsx)", other)),
        }
    }
}

/// One dock object as returned by the API
///
/// Every field is optional; values are kept as raw JSON so the payload is
/// returned unmodified by the client.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct DockPayload {
    /// Dock identifier
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Display name
    #[serde(default)]
    pub name: Option<serde_json::Value>,
    /// Whether the dock is active
    #[serde(default, rename = "isActive")]
    pub is_active: Option<serde_json::Value>,
    /// Simulated dock time
    #[serde(default, rename = "dockTimeFake")]
    pub dock_time_fake: Option<serde_json::Value>,
    /// Dock priority
    #[serde(default)]
    pub priority: Option<serde_json::Value>,
}

/// A single cell of a [`DockRecord`]
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Field absent from the payload (or JSON null); renders as `"N/A"`
    NotAvailable,
    /// Boolean value
    Bool(bool),
    /// Integral number
    Integer(i64),
    /// Non-integral number
    Float(f64),
    /// Text, or the JSON text of a nested value
    Text(String),
}

impl FieldValue {
    /// Map an optional JSON value, substituting the sentinel when absent
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        use serde_json::Value;

        match value {
            None | Some(Value::Null) => FieldValue::NotAvailable,
            Some(Value::Bool(b)) => FieldValue::Bool(*b),
            Some(Value::Number(n)) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => FieldValue::Integer(i),
                // Beyond i64: keep every digit rather than rounding to f64
                (None, Some(_)) => FieldValue::Text(n.to_string()),
                (None, None) => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Some(Value::String(s)) => FieldValue::Text(s.clone()),
            Some(other) => FieldValue::Text(other.to_string()),
        }
    }

    /// Whether this is the `"N/A"` sentinel
    pub fn is_not_available(&self) -> bool {
        matches!(self, FieldValue::NotAvailable)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::NotAvailable => f.write_str(NOT_AVAILABLE),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Float(x) => serializer.serialize_f64(*x),
            FieldValue::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One row of the output file
///
/// Field order matches [`DOCK_RECORD_COLUMNS`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DockRecord {
    /// Local time the tenant's response was aggregated
    pub timestamp: String,
    /// Tenant the dock belongs to
    pub tenant_id: String,
    /// Dock identifier
    pub dock_id: FieldValue,
    /// Dock display name
    pub dock_name: FieldValue,
    /// Active flag
    pub is_active: FieldValue,
    /// Simulated dock time
    pub dock_time_fake: FieldValue,
    /// Dock priority
    pub priority: FieldValue,
}

impl DockRecord {
    /// Build a record from an API payload, substituting `"N/A"` for absent fields
    pub fn from_payload(tenant: &TenantId, payload: &DockPayload, timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            tenant_id: tenant.0.clone(),
            dock_id: FieldValue::from_json(payload.id.as_ref()),
            dock_name: FieldValue::from_json(payload.name.as_ref()),
            is_active: FieldValue::from_json(payload.is_active.as_ref()),
            dock_time_fake: FieldValue::from_json(payload.dock_time_fake.as_ref()),
            priority: FieldValue::from_json(payload.priority.as_ref()),
        }
    }

    /// The record's cells after the timestamp and tenant columns, in column order
    pub fn dock_fields(&self) -> [&FieldValue; 5] {
        [
            &self.dock_id,
            &self.dock_name,
            &self.is_active,
            &self.dock_time_fake,
            &self.priority,
        ]
    }
}

/// Collection pipeline lifecycle phase
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No run has started yet
    #[default]
    Idle,
    /// A run is in progress
    Running,
    /// The last run reached its end and its output was written
    Completed,
    /// The last run ended with a persistence or pipeline failure
    Failed,
}

impl RunState {
    pub(crate) const fn to_u8(self) -> u8 {
        match self {
            RunState::Idle => 0,
            RunState::Running => 1,
            RunState::Completed => 2,
            RunState::Failed => 3,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Completed,
            3 => RunState::Failed,
            _ => RunState::Idle,
        }
    }

    /// Completed or Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// Outcome of a logged operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogStatus {
    /// Operation succeeded
    Success,
    /// Operation failed
    Error,
}

impl LogStatus {
    /// Upper-case label written to logs
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "SUCCESS",
            LogStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for LogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one per-tenant (or system) operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Tenant id, or [`SYSTEM_TENANT`]
    pub tenant_id: String,
    /// Success or error
    pub status: LogStatus,
    /// Free-form description
    pub details: String,
}

impl LogEvent {
    /// Successful operation for a tenant
    pub fn success(tenant_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            status: LogStatus::Success,
            details: details.into(),
        }
    }

    /// Failed operation for a tenant
    pub fn error(tenant_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            status: LogStatus::Error,
            details: details.into(),
        }
    }

    /// Whether this event was emitted by the pipeline itself
    pub fn is_system(&self) -> bool {
        self.tenant_id == SYSTEM_TENANT
    }
}

/// Fractional batch completion
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Tenants processed so far
    pub current: usize,
    /// Tenants in the run (at least 1)
    pub total: usize,
    /// Optional status message (errors, completion)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressEvent {
    /// Completion percentage (0.0 to 100.0)
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.current as f32 / self.total as f32) * 100.0
    }

    /// Text to show to a user: the message if any, otherwise a counter
    pub fn label(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => format!("Processing: {}/{} tenants", self.current, self.total),
        }
    }
}

/// Item carried by the progress channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// A progress report
    Progress(ProgressEvent),
    /// Terminal sentinel; the run has ended and no more events follow for it
    Finished,
}

/// Result of one tenant's fetch within a run
#[derive(Clone, Debug, PartialEq)]
pub struct TenantOutcome {
    /// Tenant that was processed
    pub tenant_id: TenantId,
    /// Number of records aggregated, or the isolated failure
    pub result: Result<usize, FetchError>,
}

/// Summary of a finished run, returned by [`RunHandle::wait`](crate::RunHandle::wait)
#[derive(Clone, Debug)]
pub struct RunReport {
    /// Completed or Failed
    pub state: RunState,
    /// Where the output file was (or would have been) written
    pub output_path: PathBuf,
    /// One entry per tenant processed, in input order
    pub outcomes: Vec<TenantOutcome>,
    /// Number of records in the collection result
    pub records: usize,
    /// Persistence failure message, if the writer failed
    pub persistence_error: Option<String>,
    /// Unclassified pipeline failure message, if the loop aborted
    pub pipeline_error: Option<String>,
}

impl RunReport {
    /// Tenants whose fetch failed
    pub fn failed_tenants(&self) -> impl Iterator<Item = &TenantOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Number of tenants whose fetch succeeded
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }
}

/// Parameters of [`DockCollector::start`](crate::DockCollector::start)
#[derive(Clone, Debug)]
pub struct StartRequest {
    /// Tenants to process, in order
    pub tenants: Vec<TenantId>,
    /// API credentials
    pub credentials: Credentials,
    /// Output format
    pub output_format: OutputFormat,
    /// Output file; derived from the current time when `None`
    pub output_path: Option<PathBuf>,
}

impl StartRequest {
    /// Create a request writing to a generated path
    pub fn new<I, T>(tenants: I, credentials: Credentials, output_format: OutputFormat) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TenantId>,
    {
        Self {
            tenants: tenants.into_iter().map(Into::into).collect(),
            credentials,
            output_format,
            output_path: None,
        }
    }

    /// Write to an explicit path
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }
}
