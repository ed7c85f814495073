//! Collection pipeline split into focused submodules.
//!
//! The `DockCollector` struct and its methods are organized by concern:
//! - [`run_state`] - Four-state lifecycle and the single-run guard
//! - [`run`] - Per-tenant loop, fault isolation, persistence and termination

mod run;
mod run_state;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::client::{ApiHeaders, DockSource, HttpDockSource};
use crate::config::Config;
use crate::error::{Error, Result, ValidationError};
use crate::events::{self, EventPublisher, EventSubscriber};
use crate::persistence;
use crate::types::{OutputFormat, RunReport, RunState, StartRequest, TenantId};
use run_state::RunStateCell;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Everything a spawned run needs, fixed at `start()` time
#[derive(Debug)]
pub(crate) struct RunJob {
    pub(crate) tenants: Vec<TenantId>,
    pub(crate) headers: ApiHeaders,
    pub(crate) format: OutputFormat,
    pub(crate) output_path: PathBuf,
}

/// Background dock collection pipeline (cloneable - all fields are shared)
///
/// Only one run may be active per process; a second `start()` from this or
/// any other collector fails with [`Error::AlreadyRunning`] until it ends.
///
/// # Example
///
/// ```no_run
/// use dock_collector::{Config, Credentials, DockCollector, OutputFormat, ProgressUpdate, StartRequest};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let collector = DockCollector::new(Config::default())?;
/// let mut events = collector.take_events().expect("first subscriber");
///
/// let request = StartRequest::new(
///     ["storea", "storeb"],
///     Credentials::new("app-key", "app-token"),
///     OutputFormat::Csv,
/// );
/// let handle = collector.start(request)?;
///
/// // The channels outlive a single run; the sentinel marks its end
/// while let Some(update) = events.recv_progress().await {
///     match update {
///         ProgressUpdate::Progress(p) => println!("{} ({:.0}%)", p.label(), p.percent()),
///         ProgressUpdate::Finished => break,
///     }
/// }
/// let report = handle.wait().await?;
/// println!("{} records -> {}", report.records, report.output_path.display());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct DockCollector {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Where dock payloads come from
    pub(crate) source: Arc<dyn DockSource>,
    /// Producer half of the event bus
    pub(crate) publisher: EventPublisher,
    /// Lifecycle state shared by every collector in the process
    pub(crate) state: &'static RunStateCell,
    /// Consumer half of the event bus until an observer takes it
    subscriber: Arc<Mutex<Option<EventSubscriber>>>,
}

impl DockCollector {
    /// Create a collector that fetches from the configured HTTP API
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let source = HttpDockSource::new(&config.api)?;
        Ok(Self::with_source(config, Arc::new(source)))
    }

    /// Create a collector around any [`DockSource`]
    pub fn with_source(config: Config, source: Arc<dyn DockSource>) -> Self {
        let (publisher, subscriber) = events::channel();
        Self {
            config: Arc::new(config),
            source,
            publisher,
            state: RunStateCell::process(),
            subscriber: Arc::new(Mutex::new(Some(subscriber))),
        }
    }

    /// Hand the consumer half of the event bus to its observer
    ///
    /// The bus has a single consumer; returns `None` once it has been taken.
    /// Events published before this call are kept and delivered.
    pub fn take_events(&self) -> Option<EventSubscriber> {
        match self.subscriber.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Current lifecycle state of the process-wide run
    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Whether a run is in progress anywhere in the process
    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Return a finished collector to Idle, yielding the state it was in
    ///
    /// Has no effect while Idle or Running.
    pub fn acknowledge(&self) -> RunState {
        self.state.acknowledge()
    }

    /// Get the current configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Start a collection run in the background
    ///
    /// Validation and the single-run check happen synchronously; on error no
    /// state changes and nothing is spawned. Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    /// - [`Error::Validation`] for an empty tenant list, a blank tenant or
    ///   incomplete credentials
    /// - [`Error::AlreadyRunning`] if any collector in the process is running
    pub fn start(&self, request: StartRequest) -> Result<RunHandle> {
        let StartRequest {
            tenants,
            credentials,
            output_format,
            output_path,
        } = request;

        let headers = ApiHeaders::from_credentials(&credentials)?;
        if tenants.is_empty() {
            return Err(ValidationError::EmptyTenantList.into());
        }
        if let Some(index) = tenants.iter().position(TenantId::is_blank) {
            return Err(ValidationError::BlankTenant { index }.into());
        }

        let guard = self.state.try_begin().ok_or(Error::AlreadyRunning)?;

        let output_path = output_path.unwrap_or_else(|| {
            persistence::default_output_path(
                &self.config.output.output_dir,
                &self.config.output.file_prefix,
                output_format,
            )
        });

        let job = RunJob {
            tenants,
            headers,
            format: output_format,
            output_path,
        };

        let collector = self.clone();
        let task = tokio::spawn(async move { collector.run(job, guard).await });

        Ok(RunHandle { task })
    }
}

/// Handle to a spawned run
#[derive(Debug)]
pub struct RunHandle {
    task: tokio::task::JoinHandle<RunReport>,
}

impl RunHandle {
    /// Wait for the run to reach a terminal state
    ///
    /// # Errors
    /// Returns [`Error::TaskFailed`] if the run task itself panicked outside
    /// the guarded loop. The collector's state is Failed in that case.
    pub async fn wait(self) -> Result<RunReport> {
        self.task
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))
    }

    /// Whether the run task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
