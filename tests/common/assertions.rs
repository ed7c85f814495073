//! Observer helpers and assertions for integration tests

use dock_collector::{AuditLogger, EventSubscriber, LogEvent, ProgressEvent, ProgressUpdate};
use std::path::Path;
use std::time::Duration;
use tokio_stream::StreamExt;

/// What an observer saw during one run
#[derive(Debug, Default)]
pub struct Observed {
    /// Progress events in arrival order
    pub progress: Vec<ProgressEvent>,
    /// Human-readable lines returned by the audit logger
    pub lines: Vec<String>,
    /// Log events in arrival order
    pub logs: Vec<LogEvent>,
}

/// Consume both streams until the sentinel, recording every log event
///
/// Mirrors a push-style observer: progress and log streams are polled
/// independently and correlated by tenant id.
pub async fn observe_run(
    events: EventSubscriber,
    audit: &AuditLogger,
    timeout: Duration,
) -> Observed {
    let (mut progress, mut logs) = events.into_streams();
    let mut observed = Observed::default();

    tokio::time::timeout(timeout, async {
        loop {
            tokio::select! {
                update = progress.next() => match update {
                    Some(ProgressUpdate::Progress(p)) => observed.progress.push(p),
                    Some(ProgressUpdate::Finished) | None => break,
                },
                Some(log) = logs.next() => {
                    observed.lines.push(audit.record(&log).await.unwrap());
                    observed.logs.push(log);
                }
            }
        }

        // Logs queued before the sentinel may still be pending
        while let Ok(Some(log)) = tokio::time::timeout(Duration::from_millis(50), logs.next()).await
        {
            observed.lines.push(audit.record(&log).await.unwrap());
            observed.logs.push(log);
        }
    })
    .await
    .expect("run did not finish in time");

    observed
}

/// Data rows of a CSV file, header excluded
pub fn csv_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

/// Header row of a CSV file
pub fn csv_header(path: &Path) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.headers().unwrap().iter().map(String::from).collect()
}
