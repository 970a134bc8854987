//! Result exporter: writes an [`ExportTable`] to a tabular file.
//!
//! Writers are chosen by the destination's extension: `csv`, `tsv`, or
//! `json` (the table serialized as `{header, rows}`).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::population::ExportTable;

pub type WriteFn = fn(&mut dyn Write, &ExportTable) -> Result<(), ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unknown export format for {} (expected one of: {expected})", .path.display())]
    UnknownFormat { path: PathBuf, expected: String },
    #[error("serialization error: {0}")]
    Serde(String),
    #[error("no rows to export")]
    EmptyDataset,
}

pub struct ExportFormats {
    writers: HashMap<String, WriteFn>,
}

impl Default for ExportFormats {
    fn default() -> Self {
        let mut writers: HashMap<String, WriteFn> = HashMap::new();
        writers.insert("csv".to_string(), write_csv);
        writers.insert("tsv".to_string(), write_tsv);
        writers.insert("json".to_string(), write_json);
        Self { writers }
    }
}

impl ExportFormats {
    pub fn extensions(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.writers.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn insert(&mut self, extension: impl Into<String>, writer: WriteFn) {
        self.writers
            .insert(extension.into().to_ascii_lowercase(), writer);
    }

    pub fn resolve(&self, path: &Path) -> Result<WriteFn, ExportError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.writers.get(&ext.to_ascii_lowercase()))
            .copied()
            .ok_or_else(|| ExportError::UnknownFormat {
                path: path.to_path_buf(),
                expected: self.extensions().join(", "),
            })
    }

    /// Write `table` to `path`. The format is checked before the file is
    /// created, so a rejected export leaves nothing behind.
    pub fn write(&self, path: &Path, table: &ExportTable) -> Result<(), ExportError> {
        if table.is_empty() {
            return Err(ExportError::EmptyDataset);
        }
        let writer = self.resolve(path)?;
        debug!(path = %path.display(), "writing export table");

        let mut out = BufWriter::new(File::create(path)?);
        writer(&mut out, table)?;
        out.flush()?;

        info!(rows = table.len(), path = %path.display(), "export written");
        Ok(())
    }
}

/// Write with the default format registry.
pub fn write_table(path: impl AsRef<Path>, table: &ExportTable) -> Result<(), ExportError> {
    ExportFormats::default().write(path.as_ref(), table)
}

fn write_csv(out: &mut dyn Write, table: &ExportTable) -> Result<(), ExportError> {
    write_delimited(out, table, ',')
}

fn write_tsv(out: &mut dyn Write, table: &ExportTable) -> Result<(), ExportError> {
    write_delimited(out, table, '\t')
}

fn write_json(out: &mut dyn Write, table: &ExportTable) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut *out, table).map_err(|e| ExportError::Serde(e.to_string()))?;
    writeln!(out)?;
    Ok(())
}

fn write_delimited(
    out: &mut dyn Write,
    table: &ExportTable,
    delimiter: char,
) -> Result<(), ExportError> {
    write_record(out, &table.header, delimiter)?;
    for row in &table.rows {
        write_record(out, row, delimiter)?;
    }
    Ok(())
}

fn write_record(out: &mut dyn Write, fields: &[String], delimiter: char) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|f| escape_field(f, delimiter))
        .collect::<Vec<_>>()
        .join(&delimiter.to_string());
    writeln!(out, "{line}")
}

/// RFC 4180 quoting: wrap in quotes and double embedded quotes when the
/// field contains the delimiter, a quote, or a line break.
fn escape_field(field: &str, delimiter: char) -> Cow<'_, str> {
    if field.contains(delimiter) || field.contains(['"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn table() -> ExportTable {
        ExportTable {
            header: vec!["1".to_string(), "2".to_string()],
            rows: vec![
                vec!["daily".to_string(), "yes, two".to_string()],
                vec!["never".to_string(), "say \"no\"".to_string()],
            ],
        }
    }

    #[test]
    fn csv_quotes_fields_that_need_it() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &table()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "1,2\ndaily,\"yes, two\"\nnever,\"say \"\"no\"\"\"\n");
    }

    #[test]
    fn tsv_leaves_commas_alone() {
        let mut buf = Vec::new();
        write_tsv(&mut buf, &table()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().nth(1), Some("daily\tyes, two"));
    }

    #[test]
    fn json_round_trips_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_table(&path, &table()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: ExportTable = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, table());
    }

    #[test]
    fn empty_table_is_rejected_before_touching_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let empty = ExportTable {
            header: vec!["1".to_string()],
            rows: vec![],
        };
        assert!(matches!(
            write_table(&path, &empty),
            Err(ExportError::EmptyDataset)
        ));
        assert!(!path.exists());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        assert!(matches!(
            write_table(&path, &table()),
            Err(ExportError::UnknownFormat { .. })
        ));
        assert!(!path.exists());
    }
}
