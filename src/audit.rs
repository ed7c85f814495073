//! Durable audit trail of log events
//!
//! Every [`LogEvent`] the observer drains is appended to a CSV file that
//! accumulates across runs and process lifetimes. The file is never truncated
//! or rotated.

use crate::error::{Error, Result};
use crate::types::{LogEvent, TIMESTAMP_FORMAT};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Header row written when the trail is created
pub const AUDIT_HEADER: &str = "timestamp,store_id,status,details";

/// Append-only CSV sink for log events
#[derive(Debug, Clone)]
pub struct AuditLogger {
    path: PathBuf,
}

impl AuditLogger {
    /// Open the trail at `path`, creating it with a header row if absent
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create audit log directory '{}': {}", parent.display(), e),
                ))
            })?;
        }

        // Only the process that creates the file writes the header
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(mut file) => {
                file.write_all(format!("{}\n", AUDIT_HEADER).as_bytes())
                    .await?;
                file.flush().await?;
                tracing::info!(path = %path.display(), "created audit log");
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(Error::Io(e)),
        }

        Ok(Self { path })
    }

    /// Location of the trail
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event and return its human-readable line
    ///
    /// The returned line has the form `[timestamp] tenant - STATUS: details`.
    pub async fn record(&self, event: &LogEvent) -> Result<String> {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.append(&timestamp, event).await?;
        Ok(format!(
            "[{}] {} - {}: {}",
            timestamp, event.tenant_id, event.status, event.details
        ))
    }

    async fn append(&self, timestamp: &str, event: &LogEvent) -> Result<()> {
        let row = format_row(timestamp, event)?;
        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(row.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    /// Copy the whole trail to `dest`
    pub async fn export(&self, dest: impl AsRef<Path>) -> Result<u64> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = tokio::fs::copy(&self.path, dest).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to export logs to '{}': {}", dest.display(), e),
            ))
        })?;
        tracing::info!(dest = %dest.display(), bytes, "exported audit log");
        Ok(bytes)
    }
}

/// One CSV row with every field quoted and embedded quotes doubled
fn format_row(timestamp: &str, event: &LogEvent) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer
        .write_record([
            timestamp,
            event.tenant_id.as_str(),
            event.status.as_str(),
            event.details.as_str(),
        ])
        .map_err(std::io::Error::from)?;

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}
