//! Local-filesystem data source.

use std::path::{Path, PathBuf};

use crate::error::{ConfluenceError, Result};

use super::dataset::Dataset;
use super::parser::{Parser, ParserConfig};
use super::source::{DataSource, SourceInfo};

/// Extensions treated as delimited tabular files.
const TABULAR_EXTENSIONS: &[&str] = &["csv", "tsv", "txt"];

/// Scans a local folder recursively and loads delimited files.
///
/// Each file becomes one dataset named by its path relative to the root.
/// Unreadable or empty files are skipped with a logged warning so one bad
/// file never sinks the whole load.
pub struct LocalFilesSource {
    root: PathBuf,
    max_rows: Option<usize>,
}

impl LocalFilesSource {
    /// Create a source rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_rows: None,
        }
    }

    /// Cap the number of rows loaded per file.
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = if max_rows == 0 { None } else { Some(max_rows) };
        self
    }

    /// Collect tabular files under the root, sorted for a stable run order.
    fn discover_files(&self) -> Result<Vec<PathBuf>> {
        if !self.root.exists() {
            return Err(ConfluenceError::SourceNotFound(format!(
                "root '{}' does not exist",
                self.root.display()
            )));
        }
        if !self.root.is_dir() {
            return Err(ConfluenceError::SourceUnavailable(format!(
                "root '{}' is not a directory",
                self.root.display()
            )));
        }

        let mut files = Vec::new();
        collect_files(&self.root, &mut files)?;
        files.retain(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| TABULAR_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        });
        files.sort();
        Ok(files)
    }

    fn dataset_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

impl DataSource for LocalFilesSource {
    fn load(&self) -> Result<Vec<Dataset>> {
        let parser = Parser::with_config(ParserConfig {
            max_rows: self.max_rows,
            ..Default::default()
        });

        let mut datasets = Vec::new();
        for path in self.discover_files()? {
            let name = self.dataset_name(&path);
            match parser.parse_file(&path) {
                Ok(parsed) => {
                    datasets.push(
                        Dataset::new(name, parsed.headers, parsed.rows)
                            .with_path(&path)
                            .with_fingerprint(parsed.fingerprint),
                    );
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
                }
            }
        }
        Ok(datasets)
    }

    fn info(&self) -> SourceInfo {
        SourceInfo::Local {
            root: self.root.display().to_string(),
        }
    }

    fn list_schemas(&self) -> Result<Vec<String>> {
        // A local root has a single flat namespace.
        if !self.root.is_dir() {
            return Err(ConfluenceError::SourceNotFound(format!(
                "root '{}' does not exist",
                self.root.display()
            )));
        }
        Ok(vec![self.root.display().to_string()])
    }

    fn list_tables(&self, _schema: &str) -> Result<Vec<String>> {
        Ok(self
            .discover_files()?
            .iter()
            .map(|p| self.dataset_name(p))
            .collect())
    }
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| ConfluenceError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| ConfluenceError::Io {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out)?;
        } else {
            out.push(path);
        }
    }
    Ok(())
}
