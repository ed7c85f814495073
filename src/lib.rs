//! # dock-collector
//!
//! Collects logistics dock configuration for a list of tenant accounts from
//! the VTEX logistics API, aggregates the results, and persists them to a CSV
//! or XLSX file while reporting progress to an observer.
//!
//! ## Design
//!
//! - **Sequential and rate-limited** - tenants are fetched one at a time, in
//!   input order, with a fixed pause between them
//! - **Fault isolated** - one tenant's failure is logged and skipped, never
//!   aborting the batch
//! - **Event-driven** - a background run reports through two unbounded
//!   channels (progress and log); observers poll or stream them
//! - **Single run** - a collector refuses to start while a run is active
//!
//! ## Quick Start
//!
//! ```no_run
//! use dock_collector::{
//!     AuditLogger, Config, Credentials, DockCollector, OutputFormat, ProgressUpdate, StartRequest,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let audit = AuditLogger::open(&config.audit.log_file).await?;
//!     let collector = DockCollector::new(config)?;
//!     let mut events = collector.take_events().expect("events already taken");
//!
//!     let handle = collector.start(StartRequest::new(
//!         ["storea", "storeb"],
//!         Credentials::new("app-key", "app-token"),
//!         OutputFormat::Xlsx,
//!     ))?;
//!
//!     while let Some(update) = events.recv_progress().await {
//!         for log in events.drain_logs() {
//!             println!("{}", audit.record(&log).await?);
//!         }
//!         if update == ProgressUpdate::Finished {
//!             break;
//!         }
//!     }
//!
//!     let report = handle.wait().await?;
//!     println!("{} docks written to {}", report.records, report.output_path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Durable audit trail of log events
pub mod audit;
/// Remote source client for the docks API
pub mod client;
/// Collection pipeline
pub mod collector;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Event bus between the pipeline and its observer
pub mod events;
/// Output file writer
pub mod persistence;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use audit::AuditLogger;
pub use client::{ApiHeaders, DockSource, HttpDockSource};
pub use collector::{DockCollector, RunHandle};
pub use config::Config;
pub use error::{Error, FetchError, FetchErrorKind, PersistenceError, Result, ValidationError};
pub use events::{EventPublisher, EventSubscriber};
pub use types::{
    Credentials, DockPayload, DockRecord, FieldValue, LogEvent, LogStatus, OutputFormat,
    ProgressEvent, ProgressUpdate, RunReport, RunState, StartRequest, TenantId, TenantOutcome,
};
