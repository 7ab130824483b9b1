use drover_core::{ColumnMapping, Result, Value};
use tempfile::NamedTempFile;

use std::io::Write;

/// Line terminator of the staged file, mirrored by the LOAD statement.
pub(crate) const NEWLINE: &str = if cfg!(windows) { "\r\n" } else { "\n" };

/// Writes one batch of rows to a randomly named file in the temp directory.
/// The file is removed when the returned handle drops.
pub(crate) fn write(columns: &[ColumnMapping], rows: &[Vec<Value>]) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("drover_")
        .suffix(".csv")
        .tempfile()?;

    file.write_all(render_document(columns, rows).as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Renders the delimited document: a header row naming the database columns,
/// then one line per row.
pub(crate) fn render_document(columns: &[ColumnMapping], rows: &[Vec<Value>]) -> String {
    let mut out = String::new();

    let header = columns
        .iter()
        .map(|c| c.name_in_database.as_str())
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&header);
    out.push_str(NEWLINE);

    for row in rows {
        let line = row.iter().map(render_value).collect::<Vec<_>>().join(",");
        out.push_str(&line);
        out.push_str(NEWLINE);
    }

    out
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "\\N".to_string(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::I32(value) => value.to_string(),
        Value::I64(value) => value.to_string(),
        Value::F64(value) => value.to_string(),
        Value::Str(value) => format!("\"{value}\""),
        Value::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
    }
}
