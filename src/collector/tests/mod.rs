use crate::collector::test_helpers::{
    GatedSource, RUN_TIMEOUT, StubResponse, StubSource, collect_run, collector_with, credentials,
    docks, test_config,
};
use crate::error::{Error, FetchErrorKind, ValidationError};
use crate::types::{
    Credentials, FieldValue, LogStatus, OutputFormat, ProgressUpdate, RunState, SYSTEM_TENANT,
    StartRequest,
};
use serde_json::json;
use serial_test::serial;
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;

mod collection;

/// Rows of a CSV output file, header excluded
fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}
