//! CSV / JSON export of a list view.
//!
//! Exports are built synchronously from the already-filtered in-memory
//! array. Row order follows the input order.

use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::document::{format_timestamp, Document};
use crate::error::CoreError;
use crate::schema::Column;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Parse the `format` query value; `None` defaults to CSV.
    pub fn parse(value: Option<&str>) -> Result<Self, CoreError> {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(Self::Csv),
            Some(v) if v.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(v) if v.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(other) => Err(CoreError::Validation(format!(
                "Unknown export format '{other}'. Must be one of: csv, json"
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

/// Attachment filename: `<collection>-<YYYY-MM-DD>.<ext>`.
pub fn export_filename(collection: &str, format: ExportFormat, date: NaiveDate) -> String {
    format!(
        "{collection}-{}.{}",
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Quote a CSV field when it contains a delimiter, a quote or a line break.
pub fn escape_csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render `docs` as CSV: one header row, then exactly one row per document.
///
/// Every row ends with `\n`; embedded line breaks are kept inside quoted
/// fields.
pub fn to_csv(docs: &[Document], columns: &[Column]) -> String {
    let mut out = String::new();

    let header: Vec<String> = columns.iter().map(|c| escape_csv_field(c.header)).collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for doc in docs {
        let row: Vec<String> = columns
            .iter()
            .map(|c| escape_csv_field(&doc.text(c.field)))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }

    out
}

/// Render `docs` as a JSON array of flat records (`id`, timestamps, body).
pub fn to_json(docs: &[Document]) -> Value {
    Value::Array(docs.iter().map(flatten_document).collect())
}

/// A document as one flat JSON object, metadata first.
pub fn flatten_document(doc: &Document) -> Value {
    let mut record = json!({
        "id": doc.id,
        "created_at": format_timestamp(&doc.created_at),
        "updated_at": format_timestamp(&doc.updated_at),
    });
    if let Value::Object(map) = &mut record {
        for (key, value) in &doc.fields {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    record
}
