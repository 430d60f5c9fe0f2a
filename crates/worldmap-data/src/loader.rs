//! Record parsing: format detection (RON/JSON/TOML) and deserialization of
//! definition files into typed records.
//!
//! Paths are workspace-relative strings with `/` separators, the same form
//! the loaders use as cache keys and dependency globs.

use serde::de::DeserializeOwned;
use std::path::Path;

use worldmap_core::id::SourceSpan;
use worldmap_core::reconcile::ReconcileError;

use crate::source::SourceError;
use crate::spans::record_spans;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: String },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: String, detail: String },

    /// The file could not be read.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Id reconciliation gave up.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    /// The province definitions named by the default map are missing.
    #[error("province definitions '{file}' not found")]
    MissingDefinitions { file: String },

    /// The workspace configuration is invalid.
    #[error("invalid configuration in {file}: {detail}")]
    Config { file: String, detail: String },
}

impl DataLoadError {
    fn parse(file: &str, detail: impl ToString) -> Self {
        DataLoadError::Parse {
            file: file.to_string(),
            detail: detail.to_string(),
        }
    }
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &str) -> Result<Format, DataLoadError> {
    match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_string(),
        }),
    }
}

/// Returns `true` if the file has a data file extension.
pub fn is_data_file(path: &str) -> bool {
    detect_format(path).is_ok()
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize a whole document according to its format.
pub fn parse_document<T: DeserializeOwned>(path: &str, text: &str) -> Result<T, DataLoadError> {
    match detect_format(path)? {
        Format::Ron => ron::from_str(text).map_err(|e| DataLoadError::parse(path, e)),
        Format::Json => serde_json::from_str(text).map_err(|e| DataLoadError::parse(path, e)),
        Format::Toml => toml::from_str(text).map_err(|e| DataLoadError::parse(path, e)),
    }
}

/// Deserialize a list of records. For TOML files, extracts the array of
/// tables at `toml_key`; RON and JSON files hold the list at the top level.
/// An empty TOML file, or one without the key, has no records.
pub fn parse_records<T: DeserializeOwned>(
    path: &str,
    text: &str,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    match detect_format(path)? {
        Format::Ron => ron::from_str(text).map_err(|e| DataLoadError::parse(path, e)),
        Format::Json => serde_json::from_str(text).map_err(|e| DataLoadError::parse(path, e)),
        Format::Toml => {
            let mut table: toml::Table =
                toml::from_str(text).map_err(|e| DataLoadError::parse(path, e))?;
            let Some(array) = table.remove(toml_key) else {
                return Ok(Vec::new());
            };
            array
                .try_into()
                .map_err(|e: toml::de::Error| DataLoadError::parse(path, e))
        }
    }
}

/// Parse records and pair each with its source span. Spans are `None` when
/// the scanner's record count does not match the deserialized count.
pub fn parse_records_with_spans<T: DeserializeOwned>(
    path: &str,
    text: &str,
    toml_key: &str,
) -> Result<Vec<(T, Option<SourceSpan>)>, DataLoadError> {
    let records: Vec<T> = parse_records(path, text, toml_key)?;
    let format = detect_format(path)?;
    let spans = record_spans(text, format, toml_key);
    if spans.len() == records.len() {
        Ok(records.into_iter().zip(spans.into_iter().map(Some)).collect())
    } else {
        Ok(records.into_iter().map(|r| (r, None)).collect())
    }
}

/// Resolve `file` relative to the folder containing `base`.
pub fn sibling_path(base: &str, file: &str) -> String {
    let file = file.replace('\\', "/");
    match base.rfind('/') {
        Some(i) if !file.contains('/') => format!("{}/{}", &base[..i], file),
        _ => file,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
