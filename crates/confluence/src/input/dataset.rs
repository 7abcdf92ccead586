//! In-memory dataset representation.

use std::path::PathBuf;

/// A named, ordered collection of columns loaded from one table or file.
///
/// Values are kept as the raw strings delivered by the connector; typing and
/// statistics are derived downstream. A dataset is immutable for the duration
/// of a run and owned exclusively by the task processing it.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Dataset name (table name or path relative to the source root).
    pub name: String,
    /// Backing file, when the source is file-based.
    pub path: Option<PathBuf>,
    /// Content hash of the backing file, when available.
    pub fingerprint: Option<String>,
    /// Column headers, in declaration order.
    pub headers: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Create a new dataset.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            path: None,
            fingerprint: None,
            headers,
            rows,
        }
    }

    /// Attach the backing file path.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a content fingerprint.
    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = Some(fingerprint.into());
        self
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get all values for a column by index. Short rows yield empty strings.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(index).map(|s| s.as_str()).unwrap_or(""))
    }

    /// Get a specific cell value.
    pub fn get(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col).map(|s| s.as_str()))
    }

    /// Render one row as (header, value) pairs for previews.
    pub fn row_preview(&self, row: usize) -> indexmap::IndexMap<String, String> {
        let mut preview = indexmap::IndexMap::new();
        if let Some(values) = self.rows.get(row) {
            for (idx, header) in self.headers.iter().enumerate() {
                let value = values.get(idx).cloned().unwrap_or_default();
                preview.insert(header.clone(), value);
            }
        }
        preview
    }

    /// Check if a raw value represents a missing value.
    ///
    /// Null markers, empty strings, and NaN-equivalent sentinels are treated
    /// uniformly as missing.
    pub fn is_missing_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
            || trimmed.eq_ignore_ascii_case("nil")
            || trimmed == "."
            || trimmed == "-"
    }

    /// Count missing fields in one row, considering every column.
    pub fn missing_in_row(&self, row: usize) -> usize {
        let Some(values) = self.rows.get(row) else {
            return 0;
        };
        let mut count = values
            .iter()
            .filter(|v| Self::is_missing_value(v))
            .count();
        // short rows are missing their trailing fields
        count += self.headers.len().saturating_sub(values.len());
        count
    }
}
