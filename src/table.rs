//! Tabular dataset loading
//!
//! Turns uploaded CSV bytes into an in-memory `Table` and renders the
//! prompt context (schema, row count, raw data) handed to the analysis
//! agent. Parsing is strict: ragged rows are a format fault, not data.

use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Row-sampling cap for column kind inference on large datasets.
const KIND_SAMPLE_ROWS: usize = 200;

#[derive(Debug, Clone)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    raw_csv: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Float,
    Boolean,
    Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
}

/// Everything the agent gets to know about the dataset.
#[derive(Debug, Clone)]
pub struct TableContext {
    pub row_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub csv_text: String,
}

impl Table {
    /// Parse uploaded bytes into a table.
    ///
    /// Undecodable or malformed input is a format fault; parseable input
    /// with zero data rows (header-only or empty upload) is an empty-data
    /// fault, whatever the column count.
    pub fn load(bytes: &[u8]) -> Result<Table> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| AnalysisError::Format(format!("file is not valid UTF-8 ({})", e)))?;

        let mut reader = csv::ReaderBuilder::new().from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AnalysisError::Format(e.to_string()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| AnalysisError::Format(e.to_string()))?;
            rows.push(record.iter().map(|field| field.to_string()).collect());
        }

        if rows.is_empty() {
            return Err(AnalysisError::EmptyData);
        }

        Ok(Table {
            headers,
            rows,
            raw_csv: text.to_string(),
        })
    }

    /// Build a table programmatically (tests, embedded callers). Unlike
    /// `load`, zero rows are allowed here; sessions re-check before use.
    pub fn from_parts(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Table> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&headers)
            .map_err(|e| AnalysisError::Format(e.to_string()))?;
        for row in &rows {
            writer
                .write_record(row)
                .map_err(|e| AnalysisError::Format(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AnalysisError::Format(e.to_string()))?;
        let raw_csv =
            String::from_utf8(bytes).map_err(|e| AnalysisError::Format(e.to_string()))?;

        Ok(Table {
            headers,
            rows,
            raw_csv,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Render the prompt context: inferred schema plus the upload verbatim,
    /// so provider-side code sees exactly the bytes the user sent.
    pub fn context(&self) -> TableContext {
        let sample = self.sample_rows();

        let columns = self
            .headers
            .iter()
            .enumerate()
            .map(|(idx, name)| ColumnProfile {
                name: name.clone(),
                kind: infer_kind(sample.iter().filter_map(|row| row.get(idx))),
            })
            .collect();

        TableContext {
            row_count: self.rows.len(),
            columns,
            csv_text: self.raw_csv.clone(),
        }
    }

    /// Sample rows evenly so kind inference stays cheap on large files.
    fn sample_rows(&self) -> Vec<&Vec<String>> {
        if self.rows.len() <= KIND_SAMPLE_ROWS {
            return self.rows.iter().collect();
        }

        let step = self.rows.len() / KIND_SAMPLE_ROWS;
        self.rows.iter().step_by(step).take(KIND_SAMPLE_ROWS).collect()
    }
}

impl TableContext {
    /// One-line schema summary, e.g. `revenue (float), region (text)`.
    pub fn schema_line(&self) -> String {
        self.columns
            .iter()
            .map(|col| format!("{} ({})", col.name, col.kind))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn infer_kind<'a>(values: impl Iterator<Item = &'a String>) -> ColumnKind {
    let non_empty: Vec<&str> = values
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();

    if non_empty.is_empty() {
        return ColumnKind::Text;
    }

    if non_empty.iter().all(|v| v.parse::<i64>().is_ok()) {
        return ColumnKind::Integer;
    }

    if non_empty.iter().all(|v| v.parse::<f64>().is_ok()) {
        return ColumnKind::Float;
    }

    if non_empty
        .iter()
        .all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
    {
        return ColumnKind::Boolean;
    }

    ColumnKind::Text
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Float => "float",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Text => "text",
        };
        write!(f, "{}", s)
    }
}
