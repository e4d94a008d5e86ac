use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use cyimport_types::candidate::ImportCandidate;
use fs_err as fs;
use glob::glob;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Key of the wrapper object some exports use: `{ "records": [...] }`.
const RECORDS_KEY: &str = "records";

#[derive(Debug, Clone)]
pub struct LoadedExport {
    pub path: Utf8PathBuf,
    pub records: Result<Vec<ImportCandidate>, ExportLoadError>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExportLoadError {
    #[error("io error: {message}")]
    Io { message: String },

    #[error("json parse error: {message}")]
    Json { message: String },

    #[error("unsupported export shape: {message}")]
    Shape { message: String },
}

/// Loads one export file, or every `*.json` directly under a directory.
///
/// A missing input is an error; a directory with no JSON files yields an empty list.
pub fn load_exports(input: &Utf8Path) -> anyhow::Result<Vec<LoadedExport>> {
    if input.is_file() {
        return Ok(vec![load_file(input)]);
    }
    if !input.is_dir() {
        anyhow::bail!("input {} does not exist", input);
    }

    let pattern = input.join("*.json");
    let pattern_str = pattern.as_str();
    debug!(pattern = %pattern_str, "scanning for export files");

    let mut out = Vec::new();
    for entry in glob(pattern_str).context("glob *.json")? {
        let path = entry
            .map_err(|e| anyhow::anyhow!("glob error: {e}"))?
            .to_string_lossy()
            .to_string();
        out.push(load_file(&Utf8PathBuf::from(path)));
    }

    // Batch order follows file order.
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}

/// All records from successfully loaded files, in file order.
pub fn flatten_records(exports: &[LoadedExport]) -> Vec<ImportCandidate> {
    exports
        .iter()
        .filter_map(|e| e.records.as_ref().ok())
        .flat_map(|r| r.iter().cloned())
        .collect()
}

fn load_file(path: &Utf8Path) -> LoadedExport {
    let records = match fs::read_to_string(path) {
        Ok(s) => serde_json::from_str::<Value>(&s)
            .map_err(|e| ExportLoadError::Json {
                message: e.to_string(),
            })
            .and_then(records_from_value),
        Err(e) => Err(ExportLoadError::Io {
            message: e.to_string(),
        }),
    };

    match &records {
        Ok(r) => debug!(path = %path, records = r.len(), "loaded export"),
        Err(e) => warn!(path = %path, error = %e, "skipping unreadable export"),
    }

    LoadedExport {
        path: path.to_path_buf(),
        records,
    }
}

fn records_from_value(value: Value) -> Result<Vec<ImportCandidate>, ExportLoadError> {
    match value {
        Value::Array(items) => items.into_iter().map(record_from_item).collect(),
        Value::Object(mut map) => match map.remove(RECORDS_KEY) {
            Some(Value::Array(items)) if map.is_empty() => {
                items.into_iter().map(record_from_item).collect()
            }
            Some(other) => {
                // Not a wrapper: a record that happens to have a `records` field.
                map.insert(RECORDS_KEY.to_string(), other);
                Ok(vec![ImportCandidate::new(Value::Object(map))])
            }
            None => Ok(vec![ImportCandidate::new(Value::Object(map))]),
        },
        other => Err(ExportLoadError::Shape {
            message: format!("expected an object or array, got {}", kind_of(&other)),
        }),
    }
}

fn record_from_item(item: Value) -> Result<ImportCandidate, ExportLoadError> {
    if item.is_object() {
        Ok(ImportCandidate::new(item))
    } else {
        Err(ExportLoadError::Shape {
            message: format!("expected record objects, got {}", kind_of(&item)),
        })
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
