//! Tabular time-series results.
//!
//! The simulator writes, and references are stored as, comma-separated
//! text with a header of quoted signal names:
//!
//! ```text
//! "time","h","v"
//! 0,1,0
//! 0.05,0.987738,-0.4905
//! ```

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReferenceError, Result};

/// A time-indexed table of named signal values.
///
/// Cells are kept as written so non-numeric signals survive a round trip;
/// the first column must be numeric time.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    columns: Vec<String>,
    times: Vec<f64>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    /// Build a table from columns and raw rows.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        Self::build(Path::new("<memory>"), columns, rows)
    }

    /// Parse table text. `source` is only used in error messages.
    pub fn parse(text: &str, source: &Path) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().ok_or_else(|| invalid(source, "empty table"))?;
        let columns = split_fields(header);
        let rows = lines.map(split_fields).collect();
        Self::build(source, columns, rows)
    }

    /// Read and parse a table file.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    fn build(source: &Path, columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if columns.is_empty() || columns[0].is_empty() {
            return Err(invalid(source, "missing header"));
        }
        let mut times = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(invalid(
                    source,
                    format!(
                        "row {} has {} fields, header has {}",
                        i + 1,
                        row.len(),
                        columns.len()
                    ),
                ));
            }
            let t: f64 = row[0]
                .parse()
                .map_err(|_| invalid(source, format!("row {}: time '{}' is not a number", i + 1, row[0])))?;
            if times.last().is_some_and(|prev| t < *prev) {
                return Err(invalid(source, format!("row {}: time {t} decreases", i + 1)));
            }
            times.push(t);
        }
        Ok(Self {
            columns,
            times,
            rows,
        })
    }

    /// All column names, time first.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Signal names (every column after time).
    pub fn signals(&self) -> &[String] {
        &self.columns[1..]
    }

    /// Sample times.
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Raw rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Values of a signal, if it exists and every cell is numeric.
    pub fn numeric(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        self.rows
            .iter()
            .map(|row| parse_number(&row[idx]))
            .collect()
    }

    /// Render as table text with a quoted header.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let header: Vec<String> = self.columns.iter().map(|c| format!("\"{c}\"")).collect();
        let _ = writeln!(out, "{}", header.join(","));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(|c| quote_cell(c)).collect();
            let _ = writeln!(out, "{}", cells.join(","));
        }
        out
    }

    /// Write the table to `path`.
    pub fn write(&self, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_text())?;
        Ok(path.to_path_buf())
    }
}

/// Numeric value of a cell; booleans count as 0/1.
fn parse_number(cell: &str) -> Option<f64> {
    match cell {
        "true" => Some(1.0),
        "false" => Some(0.0),
        other => other.parse().ok(),
    }
}

fn quote_cell(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Split one line into fields, honouring double quotes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.trim_end_matches('\r').chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

fn invalid(path: &Path, detail: impl Into<String>) -> ReferenceError {
    ReferenceError::InvalidResult {
        path: path.to_path_buf(),
        detail: detail.into(),
    }
}
