//! Persistence writer for the aggregated record set
//!
//! Output is written to a hidden sibling file first and renamed into place, so
//! callers either get a complete file or a [`PersistenceError`].

use crate::error::PersistenceError;
use crate::types::{DOCK_RECORD_COLUMNS, DockRecord, FieldValue, OutputFormat};
use chrono::{DateTime, Local};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};

/// Timestamp layout used in generated file names
const FILE_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Largest magnitude an XLSX number cell holds without losing digits
const MAX_EXACT_XLSX_INTEGER: u64 = 1 << 53;

/// Derive an output path from the current local time
///
/// Produces `<dir>/<prefix>_<YYYYmmdd_HHMMSS>.<ext>`.
pub fn default_output_path(dir: &Path, prefix: &str, format: OutputFormat) -> PathBuf {
    output_path_at(dir, prefix, format, Local::now())
}

fn output_path_at(dir: &Path, prefix: &str, format: OutputFormat, now: DateTime<Local>) -> PathBuf {
    dir.join(format!(
        "{}_{}.{}",
        prefix,
        now.format(FILE_STAMP_FORMAT),
        format.extension()
    ))
}

/// Write `records` to `path` on the blocking thread pool
///
/// Takes ownership of the record set; it is not touched again by the caller.
pub async fn write_records(
    records: Vec<DockRecord>,
    format: OutputFormat,
    path: PathBuf,
) -> Result<PathBuf, PersistenceError> {
    tokio::task::spawn_blocking(move || {
        write_records_blocking(&records, format, &path)?;
        Ok(path)
    })
    .await
    .map_err(|e| PersistenceError::Task(e.to_string()))?
}

/// Write `records` to `path` synchronously
///
/// Creates the destination directory if missing and writes the header row
/// followed by one row per record, in order.
pub fn write_records_blocking(
    records: &[DockRecord],
    format: OutputFormat,
    path: &Path,
) -> Result<(), PersistenceError> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| PersistenceError::InvalidPath {
            path: path.to_path_buf(),
            reason: "path has no file name".to_string(),
        })?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|source| PersistenceError::Io {
        path: parent.clone(),
        source,
    })?;

    let partial = parent.join(format!(".{}.partial", file_name));
    let written = match format {
        OutputFormat::Csv => write_csv(records, &partial),
        OutputFormat::Xlsx => write_xlsx(records, &partial),
    };

    let committed = written.and_then(|()| {
        std::fs::rename(&partial, path).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    });

    if committed.is_err() {
        // The write or rename error is reported, not the cleanup one
        let _ = std::fs::remove_file(&partial);
    }

    committed
}

fn write_csv(records: &[DockRecord], path: &Path) -> Result<(), PersistenceError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(DOCK_RECORD_COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.flush().map_err(|source| PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_xlsx(records: &[DockRecord], path: &Path) -> Result<(), PersistenceError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    for (col, name) in DOCK_RECORD_COLUMNS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row = u32::try_from(index + 1).map_err(|_| PersistenceError::InvalidPath {
            path: path.to_path_buf(),
            reason: "too many rows for a worksheet".to_string(),
        })?;

        worksheet.write_string(row, 0, record.timestamp.as_str())?;
        worksheet.write_string(row, 1, record.tenant_id.as_str())?;
        for (offset, value) in record.dock_fields().into_iter().enumerate() {
            write_cell(worksheet, row, (offset + 2) as u16, value)?;
        }
    }
    worksheet.autofit();

    workbook.save(path)?;
    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &FieldValue,
) -> Result<(), PersistenceError> {
    match value {
        FieldValue::Bool(b) => worksheet.write_boolean(row, col, *b)?,
        FieldValue::Integer(i) if i.unsigned_abs() > MAX_EXACT_XLSX_INTEGER => {
            worksheet.write_string(row, col, i.to_string())?
        }
        FieldValue::Integer(i) => worksheet.write_number(row, col, *i as f64)?,
        FieldValue::Float(x) => worksheet.write_number(row, col, *x)?,
        FieldValue::Text(s) => worksheet.write_string(row, col, s.as_str())?,
        FieldValue::NotAvailable => worksheet.write_string(row, col, value.to_string())?,
    };
    Ok(())
}
