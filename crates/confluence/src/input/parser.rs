//! Delimited-file parsing with delimiter detection.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{ConfluenceError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// A parsed delimited file, before it becomes a [`crate::input::Dataset`].
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<String>>,
    /// Detected format (csv, tsv, etc.).
    pub format: String,
    /// SHA-256 hash of the file contents.
    pub fingerprint: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

/// Parses tabular data files.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file into headers and rows.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ParsedFile> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| ConfluenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let metadata = file.metadata().map_err(|e| ConfluenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let size_bytes = metadata.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| ConfluenceError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let fingerprint = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let (headers, rows) = self.parse_bytes(&contents, delimiter)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        Ok(ParsedFile {
            headers,
            rows,
            format,
            fingerprint,
            size_bytes,
        })
    }

    /// Parse bytes directly.
    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.to_string()).collect()
        } else {
            match reader.records().next() {
                Some(Ok(record)) => (0..record.len())
                    .map(|i| format!("column_{}", i + 1))
                    .collect(),
                Some(Err(e)) => return Err(e.into()),
                None => return Err(ConfluenceError::EmptyData("no data rows found".to_string())),
            }
        };

        if headers.is_empty() {
            return Err(ConfluenceError::EmptyData("no columns found".to_string()));
        }

        let expected_cols = headers.len();

        // Re-create the reader; header extraction may have consumed records.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            if let Some(max) = self.config.max_rows {
                if row_idx >= max {
                    break;
                }
            }

            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            // Pad ragged rows, truncate overlong ones.
            while row.len() < expected_cols {
                row.push(String::new());
            }
            row.truncate(expected_cols);

            rows.push(row);
        }

        Ok((headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(ConfluenceError::EmptyData("no lines to analyze".to_string()));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0usize;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Consistent per-line counts are the strongest signal; tabs get a
        // slight bonus since they rarely occur inside actual values.
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000 + (if delim == b'\t' { 100 } else { 0 })
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences outside quoted sections.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let mut count = 0;
    let mut in_quotes = false;

    for byte in line.bytes() {
        if byte == b'"' {
            in_quotes = !in_quotes;
        } else if byte == delimiter && !in_quotes {
            count += 1;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_comma() {
        let data = b"a,b,c\n1,2,3\n4,5,6\n";
        assert_eq!(detect_delimiter(data).unwrap(), b',');
    }

    #[test]
    fn test_detect_tab() {
        let data = b"a\tb\tc\n1\t2\t3\n";
        assert_eq!(detect_delimiter(data).unwrap(), b'\t');
    }

    #[test]
    fn test_quoted_delimiters_ignored() {
        assert_eq!(count_delimiter_in_line("a,\"b,c\",d", b','), 2);
    }

    #[test]
    fn test_parse_bytes_pads_ragged_rows() {
        let parser = Parser::new();
        let (headers, rows) = parser.parse_bytes(b"a,b,c\n1,2\n", b',').unwrap();
        assert_eq!(headers.len(), 3);
        assert_eq!(rows[0], vec!["1", "2", ""]);
    }

    #[test]
    fn test_parse_bytes_max_rows() {
        let config = ParserConfig {
            max_rows: Some(2),
            ..Default::default()
        };
        let parser = Parser::with_config(config);
        let (_, rows) = parser.parse_bytes(b"a\n1\n2\n3\n4\n", b',').unwrap();
        assert_eq!(rows.len(), 2);
    }
}
