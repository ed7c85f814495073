//! Per-tenant collection loop and run termination.

use super::run_state::RunGuard;
use super::{DockCollector, RunJob};
use crate::persistence;
use crate::types::{
    DockRecord, LogEvent, RunReport, RunState, SYSTEM_TENANT, TIMESTAMP_FORMAT, TenantOutcome,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

impl DockCollector {
    /// Drive one run from the first tenant to the terminal sentinel
    ///
    /// Persistence runs even if the loop panics, with whatever was collected
    /// up to that point. The guard is released before the sentinel is pushed,
    /// so an observer reacting to the sentinel can start the next run.
    pub(crate) async fn run(self, job: RunJob, guard: RunGuard) -> RunReport {
        let total = job.tenants.len();
        tracing::info!(
            tenants = total,
            format = %job.format,
            output = %job.output_path.display(),
            "starting dock collection"
        );

        let mut records = Vec::new();
        let mut outcomes = Vec::with_capacity(total);

        let collected = AssertUnwindSafe(self.collect_all(&job, &mut records, &mut outcomes))
            .catch_unwind()
            .await;

        let pipeline_error = match collected {
            Ok(()) => None,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(error = %message, "collection loop aborted");
                self.publisher.log(LogEvent::error(
                    SYSTEM_TENANT,
                    format!("Collection failed: {}", message),
                ));
                Some(message)
            }
        };

        let record_count = records.len();
        let persistence_error =
            match persistence::write_records(records, job.format, job.output_path.clone()).await {
                Ok(path) => {
                    tracing::info!(records = record_count, path = %path.display(), "data saved");
                    self.publisher.log(LogEvent::success(
                        SYSTEM_TENANT,
                        format!("Data saved to: {}", path.display()),
                    ));
                    None
                }
                Err(e) => {
                    tracing::error!(error = %e, path = %job.output_path.display(), "failed to save data");
                    self.publisher.log(LogEvent::error(
                        SYSTEM_TENANT,
                        format!("Error saving data: {}", e),
                    ));
                    Some(e.to_string())
                }
            };

        let (state, message) = match (&pipeline_error, &persistence_error) {
            (None, None) => (RunState::Completed, "Completed successfully".to_string()),
            (Some(e), _) => (RunState::Failed, format!("Error: Collection failed: {}", e)),
            (None, Some(e)) => (RunState::Failed, format!("Error: {}", e)),
        };

        self.publisher.progress(total, total, Some(message));
        guard.release(state);
        self.publisher.finish();

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        tracing::info!(
            state = ?state,
            tenants = total,
            failed,
            records = record_count,
            "dock collection finished"
        );

        RunReport {
            state,
            output_path: job.output_path,
            outcomes,
            records: record_count,
            persistence_error,
            pipeline_error,
        }
    }

    /// Fetch every tenant in order, isolating failures
    async fn collect_all(
        &self,
        job: &RunJob,
        records: &mut Vec<DockRecord>,
        outcomes: &mut Vec<TenantOutcome>,
    ) {
        let total = job.tenants.len();
        let delay = self.config.collection.inter_tenant_delay;

        for (index, tenant) in job.tenants.iter().enumerate() {
            let result = match self.source.fetch(tenant, &job.headers).await {
                Ok(docks) => {
                    let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
                    records.extend(
                        docks
                            .iter()
                            .map(|dock| DockRecord::from_payload(tenant, dock, &timestamp)),
                    );

                    tracing::debug!(tenant = %tenant, docks = docks.len(), "tenant collected");
                    self.publisher.log(LogEvent::success(
                        tenant.as_str(),
                        format!("Found {} docks", docks.len()),
                    ));
                    self.publisher.progress(index + 1, total, None);
                    Ok(docks.len())
                }
                Err(e) => {
                    tracing::warn!(tenant = %tenant, error = %e, "tenant fetch failed");
                    self.publisher
                        .log(LogEvent::error(tenant.as_str(), e.message.clone()));
                    self.publisher
                        .progress(index + 1, total, Some(format!("Error: {}", e.message)));
                    Err(e)
                }
            };

            outcomes.push(TenantOutcome {
                tenant_id: tenant.clone(),
                result,
            });

            if index + 1 < total && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
