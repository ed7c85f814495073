use super::*;
use std::time::{Duration, Instant};

fn mixed_source() -> StubSource {
    StubSource::new()
        .with(
            "alpha",
            StubResponse::Docks(docks(json!([
                {"id": "d1", "name": "North", "isActive": true, "dockTimeFake": "1.00:00:00", "priority": 1},
                {"id": "d2", "name": "South", "isActive": false, "dockTimeFake": "0.12:00:00", "priority": 2},
                {"id": "d3", "name": "East", "isActive": true, "dockTimeFake": "0.06:00:00", "priority": 3}
            ]))),
        )
        .with(
            "beta",
            StubResponse::Fail(
                FetchErrorKind::Status(401),
                "HTTP error 401 Unauthorized for url: beta".into(),
            ),
        )
        .with("gamma", StubResponse::Docks(docks(json!([{"id": "g1"}]))))
        .with("delta", StubResponse::Docks(vec![]))
}

#[tokio::test]
#[serial]
async fn one_progress_event_per_tenant_then_terminal() {
    let dir = tempdir().unwrap();
    let (collector, mut events) =
        collector_with(test_config(dir.path()), Arc::new(mixed_source()));

    let tenants = ["alpha", "beta", "gamma", "delta", "omega"];
    let handle = collector
        .start(
            StartRequest::new(tenants, credentials(), OutputFormat::Csv)
                .with_output_path(dir.path().join("docks.csv")),
        )
        .unwrap();
    let run = collect_run(&mut events).await;
    handle.wait().await.unwrap();

    let n = tenants.len();
    assert_eq!(run.progress.len(), n + 1);
    assert!(run.progress.iter().all(|p| p.total == n));

    let per_tenant: Vec<usize> = run.progress[..n].iter().map(|p| p.current).collect();
    assert_eq!(per_tenant, (1..=n).collect::<Vec<_>>());

    let last = run.last_progress();
    assert_eq!(last.current, n);
    assert_eq!(last.message.as_deref(), Some("Completed successfully"));

    // One log per tenant, in input order, then the save confirmation
    let order: Vec<&str> = run.logs.iter().map(|l| l.tenant_id.as_str()).collect();
    assert_eq!(order, vec!["alpha", "beta", "gamma", "delta", "omega", SYSTEM_TENANT]);
}

#[tokio::test]
#[serial]
async fn failed_tenant_is_logged_and_contributes_no_records() {
    let dir = tempdir().unwrap();
    let (collector, mut events) =
        collector_with(test_config(dir.path()), Arc::new(mixed_source()));
    let path = dir.path().join("docks.csv");

    let handle = collector
        .start(
            StartRequest::new(["alpha", "beta", "gamma"], credentials(), OutputFormat::Csv)
                .with_output_path(&path),
        )
        .unwrap();
    let run = collect_run(&mut events).await;
    let report = handle.wait().await.unwrap();

    assert_eq!(report.state, RunState::Completed);

    let beta = run.logs_for("beta");
    assert_eq!(beta.len(), 1);
    assert_eq!(beta[0].status, LogStatus::Error);
    assert!(beta[0].details.contains("401"));

    assert_eq!(
        run.progress[1].message.as_deref(),
        Some("Error: HTTP error 401 Unauthorized for url: beta")
    );
    assert!(run.progress[0].message.is_none());

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r[1] != "beta"));
    let tenants: Vec<&str> = rows.iter().map(|r| r[1].as_str()).collect();
    assert_eq!(tenants, vec!["alpha", "alpha", "alpha", "gamma"]);
}

#[tokio::test]
#[serial]
async fn records_carry_payload_fields_in_column_order() {
    let dir = tempdir().unwrap();
    let (collector, mut events) =
        collector_with(test_config(dir.path()), Arc::new(mixed_source()));
    let path = dir.path().join("docks.csv");

    let handle = collector
        .start(
            StartRequest::new(["alpha"], credentials(), OutputFormat::Csv).with_output_path(&path),
        )
        .unwrap();
    let run = collect_run(&mut events).await;
    handle.wait().await.unwrap();

    let alpha = run.logs_for("alpha");
    assert_eq!(alpha[0].status, LogStatus::Success);
    assert_eq!(alpha[0].details, "Found 3 docks");

    let rows = read_rows(&path);
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[1][1..], ["alpha", "d2", "South", "false", "0.12:00:00", "2"]);

    // All docks of one tenant share a timestamp
    assert!(rows.iter().all(|r| r[0] == rows[0][0]));
}

#[tokio::test]
#[serial]
async fn missing_fields_are_written_as_not_available() {
    let dir = tempdir().unwrap();
    let source = StubSource::new().with(
        "a",
        StubResponse::Docks(docks(json!([{"id": 7, "name": null, "priority": 0}]))),
    );
    let (collector, mut events) = collector_with(test_config(dir.path()), Arc::new(source));
    let path = dir.path().join("docks.csv");

    let handle = collector
        .start(StartRequest::new(["a"], credentials(), OutputFormat::Csv).with_output_path(&path))
        .unwrap();
    collect_run(&mut events).await;
    handle.wait().await.unwrap();

    let rows = read_rows(&path);
    assert_eq!(&rows[0][1..], ["a", "7", "N/A", "N/A", "N/A", "0"]);
}

#[tokio::test]
#[serial]
async fn duplicate_tenants_are_processed_each_time() {
    let dir = tempdir().unwrap();
    let source = Arc::new(
        StubSource::new()
            .with("a", StubResponse::Docks(docks(json!([{"id": 1}]))))
            .with("b", StubResponse::Docks(docks(json!([{"id": 2}])))),
    );
    let (collector, mut events) = collector_with(test_config(dir.path()), source.clone());
    let path = dir.path().join("docks.csv");

    let handle = collector
        .start(
            StartRequest::new(["a", "b", "a"], credentials(), OutputFormat::Csv)
                .with_output_path(&path),
        )
        .unwrap();
    let run = collect_run(&mut events).await;
    let report = handle.wait().await.unwrap();

    assert_eq!(source.calls(), vec!["a", "b", "a"]);
    assert_eq!(run.logs_for("a").len(), 2);
    assert_eq!(report.records, 3);

    let ids: Vec<String> = read_rows(&path).into_iter().map(|r| r[2].clone()).collect();
    assert_eq!(ids, vec!["1", "2", "1"]);
}

#[tokio::test]
#[serial]
async fn rerun_with_same_responses_yields_same_records() {
    let dir = tempdir().unwrap();
    let (collector, mut events) =
        collector_with(test_config(dir.path()), Arc::new(mixed_source()));

    let mut outputs = Vec::new();
    for name in ["first.csv", "second.csv"] {
        let path = dir.path().join(name);
        let handle = collector
            .start(
                StartRequest::new(["alpha", "beta", "gamma"], credentials(), OutputFormat::Csv)
                    .with_output_path(&path),
            )
            .unwrap();
        collect_run(&mut events).await;
        handle.wait().await.unwrap();

        let rows: Vec<Vec<String>> = read_rows(&path)
            .into_iter()
            .map(|mut r| {
                r.remove(0);
                r
            })
            .collect();
        outputs.push(rows);
    }

    assert_eq!(outputs[0], outputs[1]);
}

#[tokio::test]
#[serial]
async fn report_lists_every_tenant_outcome() {
    let dir = tempdir().unwrap();
    let (collector, mut events) =
        collector_with(test_config(dir.path()), Arc::new(mixed_source()));

    let handle = collector
        .start(
            StartRequest::new(["alpha", "beta", "delta"], credentials(), OutputFormat::Csv)
                .with_output_path(dir.path().join("docks.csv")),
        )
        .unwrap();
    collect_run(&mut events).await;
    let report = handle.wait().await.unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.records, 3);
    assert!(report.persistence_error.is_none());
    assert!(report.pipeline_error.is_none());

    let failed: Vec<_> = report.failed_tenants().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].tenant_id.as_str(), "beta");
    let err = failed[0].result.as_ref().unwrap_err();
    assert_eq!(err.kind, FetchErrorKind::Status(401));

    assert_eq!(report.outcomes[2].result.as_ref().ok(), Some(&0));
}

#[tokio::test]
#[serial]
async fn default_output_path_lands_in_configured_directory() {
    let dir = tempdir().unwrap();
    let config = test_config(dir.path());
    let output_dir = config.output.output_dir.clone();
    let (collector, mut events) = collector_with(config, Arc::new(mixed_source()));

    let handle = collector
        .start(StartRequest::new(["gamma"], credentials(), OutputFormat::Xlsx))
        .unwrap();
    let run = collect_run(&mut events).await;
    let report = handle.wait().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.output_path.parent(), Some(output_dir.as_path()));
    let name = report.output_path.file_name().unwrap().to_string_lossy();
    assert!(name.starts_with("dock_times_"));
    assert!(name.ends_with(".xlsx"));
    assert!(report.output_path.is_file());

    let saved = run.logs_for(SYSTEM_TENANT);
    assert_eq!(
        saved[0].details,
        format!("Data saved to: {}", report.output_path.display())
    );
}

#[tokio::test]
#[serial]
async fn all_tenants_failing_still_writes_header_only_file() {
    let dir = tempdir().unwrap();
    let (collector, mut events) =
        collector_with(test_config(dir.path()), Arc::new(StubSource::new()));
    let path = dir.path().join("empty.csv");

    let handle = collector
        .start(StartRequest::new(["x", "y"], credentials(), OutputFormat::Csv).with_output_path(&path))
        .unwrap();
    let run = collect_run(&mut events).await;
    let report = handle.wait().await.unwrap();

    assert_eq!(report.state, RunState::Completed);
    assert_eq!(report.succeeded(), 0);
    assert!(run.logs_for("x").iter().all(|l| l.status == LogStatus::Error));
    assert!(path.is_file());
    assert!(read_rows(&path).is_empty());
}

#[tokio::test]
#[serial]
async fn delay_separates_tenants_but_not_after_the_last() {
    let dir = tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.collection.inter_tenant_delay = Duration::from_millis(60);
    let (collector, mut events) = collector_with(config, Arc::new(mixed_source()));

    let started = Instant::now();
    let handle = collector
        .start(
            StartRequest::new(["gamma", "delta", "gamma"], credentials(), OutputFormat::Csv)
                .with_output_path(dir.path().join("docks.csv")),
        )
        .unwrap();
    collect_run(&mut events).await;
    handle.wait().await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(120));
}

#[test]
fn not_available_renders_like_missing_payload_field() {
    let record = crate::types::DockRecord::from_payload(
        &"a".into(),
        &docks(json!([{}])).remove(0),
        "2024-01-01 00:00:00",
    );
    assert!(record.dock_fields().iter().all(|f| **f == FieldValue::NotAvailable));
}
