//! Shared test helpers for driving DockCollector runs in tests.

use crate::client::{ApiHeaders, DockSource};
use crate::collector::DockCollector;
use crate::config::Config;
use crate::error::{FetchError, FetchErrorKind};
use crate::events::EventSubscriber;
use crate::types::{Credentials, DockPayload, LogEvent, ProgressEvent, ProgressUpdate, TenantId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Upper bound for waiting on a run in tests
pub(crate) const RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Config writing into `dir` with no inter-tenant delay
pub(crate) fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.output.output_dir = dir.join("out");
    config.audit.log_file = dir.join("api_logs.csv");
    config.collection.inter_tenant_delay = Duration::ZERO;
    config
}

pub(crate) fn credentials() -> Credentials {
    Credentials::new("test-key", "test-token")
}

/// Parse a JSON array into dock payloads
pub(crate) fn docks(value: serde_json::Value) -> Vec<DockPayload> {
    serde_json::from_value(value).unwrap()
}

/// Canned response for one tenant
#[derive(Clone, Debug)]
pub(crate) enum StubResponse {
    Docks(Vec<DockPayload>),
    Fail(FetchErrorKind, String),
    Panic(String),
}

/// In-memory source answering from a fixed table
///
/// Unknown tenants answer with an HTTP 404 failure.
#[derive(Default)]
pub(crate) struct StubSource {
    responses: HashMap<String, StubResponse>,
    calls: Mutex<Vec<String>>,
}

impl StubSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, tenant: &str, response: StubResponse) -> Self {
        self.responses.insert(tenant.to_string(), response);
        self
    }

    /// Tenants fetched so far, in call order
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DockSource for StubSource {
    async fn fetch(
        &self,
        tenant: &TenantId,
        _headers: &ApiHeaders,
    ) -> Result<Vec<DockPayload>, FetchError> {
        self.calls.lock().unwrap().push(tenant.to_string());
        match self.responses.get(tenant.as_str()) {
            Some(StubResponse::Docks(docks)) => Ok(docks.clone()),
            Some(StubResponse::Fail(kind, message)) => {
                Err(FetchError::new(tenant.as_str(), *kind, message.clone()))
            }
            Some(StubResponse::Panic(message)) => panic!("{}", message),
            None => Err(FetchError::new(
                tenant.as_str(),
                FetchErrorKind::Status(404),
                format!("HTTP error 404 Not Found for tenant {}", tenant),
            )),
        }
    }
}

/// Source that blocks every fetch until the test opens the gate
pub(crate) struct GatedSource {
    pub(crate) gate: Arc<tokio::sync::Semaphore>,
    pub(crate) entered: Arc<tokio::sync::Notify>,
}

impl GatedSource {
    pub(crate) fn new() -> Self {
        Self {
            gate: Arc::new(tokio::sync::Semaphore::new(0)),
            entered: Arc::new(tokio::sync::Notify::new()),
        }
    }
}

#[async_trait]
impl DockSource for GatedSource {
    async fn fetch(
        &self,
        _tenant: &TenantId,
        _headers: &ApiHeaders,
    ) -> Result<Vec<DockPayload>, FetchError> {
        self.entered.notify_one();
        let permit = self.gate.acquire().await.unwrap();
        permit.forget();
        Ok(docks(serde_json::json!([{"id": "gated"}])))
    }
}

/// Build a collector around `source` and take its events
///
/// Earlier runs in the test binary leave the process-wide state terminal, so
/// it is acknowledged back to Idle here. Callers must be `#[serial]`.
pub(crate) fn collector_with(
    config: Config,
    source: Arc<dyn DockSource>,
) -> (DockCollector, EventSubscriber) {
    let collector = DockCollector::with_source(config, source);
    collector.acknowledge();
    let events = collector.take_events().unwrap();
    (collector, events)
}

/// Everything one run pushed onto the bus
#[derive(Debug, Default)]
pub(crate) struct RunEvents {
    pub(crate) progress: Vec<ProgressEvent>,
    pub(crate) logs: Vec<LogEvent>,
}

impl RunEvents {
    pub(crate) fn logs_for(&self, tenant: &str) -> Vec<&LogEvent> {
        self.logs.iter().filter(|l| l.tenant_id == tenant).collect()
    }

    pub(crate) fn last_progress(&self) -> &ProgressEvent {
        self.progress.last().unwrap()
    }
}

/// Read progress until the sentinel, then take every queued log event
pub(crate) async fn collect_run(events: &mut EventSubscriber) -> RunEvents {
    tokio::time::timeout(RUN_TIMEOUT, async {
        let mut run = RunEvents::default();
        while let Some(update) = events.recv_progress().await {
            match update {
                ProgressUpdate::Progress(event) => run.progress.push(event),
                ProgressUpdate::Finished => break,
            }
        }
        run.logs = events.drain_logs();
        run
    })
    .await
    .expect("run did not finish in time")
}
