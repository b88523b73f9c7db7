//! Decoding of downloaded dataset content into JSON-ready rows.

use std::io::Read;

use serde_json::{Number, Value};

use crate::error::Result;
use crate::models::ColumnType;

/// Tabular dataset content with positional rows.
///
/// Each row holds exactly one value per entry in `columns`, in the same
/// order. Every cell is already a JSON value, so the table can be serialized
/// without further conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Decode CSV text, reading at most `row_limit` records.
    ///
    /// Cells of numeric columns become JSON numbers when they parse, empty
    /// cells become `null`, everything else is kept as a string.
    pub fn from_csv(bytes: &[u8], types: &[ColumnType], row_limit: usize) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let numeric: Vec<bool> = columns
            .iter()
            .map(|name| {
                types
                    .iter()
                    .find(|t| &t.column == name)
                    .map(ColumnType::is_numeric)
                    .unwrap_or(false)
            })
            .collect();

        let mut rows = Vec::new();
        for record in reader.records().take(row_limit) {
            let record = record?;
            let row = (0..columns.len())
                .map(|idx| convert_cell(record.get(idx), numeric[idx]))
                .collect();
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Length of the leading part of `bytes` that holds the header and
    /// `row_limit` complete records, or `None` while more input is needed.
    ///
    /// A record counts as complete once its unquoted terminator has been
    /// read, so a partial body can be cut there and handed to
    /// [`Table::from_csv`].
    pub fn complete_prefix(bytes: &[u8], row_limit: usize) -> Option<usize> {
        // A trailing sentinel makes the reader stop at the last terminator
        // instead of treating end of input as one.
        let sentinel: &[u8] = b"#";
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes.chain(sentinel));

        let mut record = csv::ByteRecord::new();
        for _ in 0..=row_limit {
            match reader.read_byte_record(&mut record) {
                Ok(true) => {}
                Ok(false) | Err(_) => return None,
            }
        }
        let end = usize::try_from(reader.position().byte()).ok()?;
        (end <= bytes.len()).then_some(end)
    }

    /// Keep only the first `limit` rows.
    pub fn head(mut self, limit: usize) -> Self {
        self.rows.truncate(limit);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

fn convert_cell(cell: Option<&str>, numeric: bool) -> Value {
    let text = match cell {
        Some(text) if !text.is_empty() => text,
        _ => return Value::Null,
    };

    if numeric {
        let trimmed = text.trim();
        if let Ok(int) = trimmed.parse::<i64>() {
            return Value::from(int);
        }
        if let Some(float) = trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
            return Value::Number(float);
        }
    }

    Value::String(text.to_string())
}
