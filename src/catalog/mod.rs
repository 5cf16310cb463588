//! The run catalog the plots read from.
//!
//! [`Catalog`] is the narrow interface the plotting code needs from a data
//! server: run metadata documents, stream and field discovery, and the
//! current contents of a stream. [`memory::MemoryCatalog`] is an in-process
//! implementation used by the demo and by tests.

pub mod analysis;
pub mod field_selection;
pub mod memory;

use std::fmt::Display;

use indexmap::IndexMap;
use serde_json::Value;

/// Field name → values, in stream order.
pub type StreamData = IndexMap<String, Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    RunNotFound(String),
    StreamNotFound { run: String, stream: String },
    FieldNotFound { stream: String, field: String },
    Backend(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::RunNotFound(run) => write!(f, "Run '{run}' not found"),
            CatalogError::StreamNotFound { run, stream } => {
                write!(f, "Stream '{stream}' not found in run '{run}'")
            }
            CatalogError::FieldNotFound { stream, field } => {
                write!(f, "Field '{field}' not found in stream '{stream}'")
            }
            CatalogError::Backend(msg) => write!(f, "Catalog error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {}

pub trait Catalog {
    fn name(&self) -> &str;

    /// The run's metadata documents (`start`, `stop`, ...).
    fn run_metadata(&self, run: &str) -> Result<Value, CatalogError>;

    fn list_streams(&self, run: &str) -> Result<Vec<String>, CatalogError>;

    fn stream_fields(&self, run: &str, stream: &str) -> Result<Vec<String>, CatalogError>;

    fn field_shape(&self, run: &str, stream: &str, field: &str) -> Result<Vec<usize>, CatalogError>;

    /// Current data of a stream. With `fields`, only those that exist are
    /// returned; missing ones are left out rather than reported.
    fn read_stream_data(
        &self,
        run: &str,
        stream: &str,
        fields: Option<&[String]>,
    ) -> Result<StreamData, CatalogError>;

    /// True until the run has a stop document.
    fn is_run_active(&self, run: &str) -> Result<bool, CatalogError>;

    /// Stream metadata, including its `descriptors`.
    fn stream_metadata(&self, _run: &str, _stream: &str) -> Result<Value, CatalogError> {
        Ok(Value::Null)
    }
}

/// `metadata[doc][key]`, treating null as missing.
pub fn get_md<'a>(metadata: &'a Value, doc: &str, key: &str) -> Option<&'a Value> {
    metadata
        .get(doc)
        .and_then(|doc| doc.get(key))
        .filter(|value| !value.is_null())
}

pub fn get_md_str<'a>(metadata: &'a Value, doc: &str, key: &str) -> Option<&'a str> {
    get_md(metadata, doc, key).and_then(Value::as_str)
}

fn scan_id(metadata: &Value) -> String {
    match get_md(metadata, "start", "scan_id") {
        Some(Value::String(s)) => s.clone(),
        Some(value) => value.to_string(),
        None => "?".to_owned(),
    }
}

/// `"{plan_name} #{scan_id} {title}"`
pub fn run_summary(metadata: &Value) -> String {
    format!(
        "{} #{} {}",
        get_md_str(metadata, "start", "plan_name").unwrap_or_default(),
        scan_id(metadata),
        get_md_str(metadata, "start", "title").unwrap_or_default()
    )
}

/// `"{scan_id} ({uid prefix}) - {field}"`
pub fn curve_label(metadata: &Value, field: &str, uid_chars: usize) -> String {
    let uid: String = get_md_str(metadata, "start", "uid")
        .unwrap_or_default()
        .chars()
        .take(uid_chars)
        .collect();
    format!("{} ({uid}) - {field}", scan_id(metadata))
}
