//! Input handling: dataset model, parsing, and the data-source boundary.

mod dataset;
mod local;
mod parser;
mod source;

pub use dataset::Dataset;
pub use local::LocalFilesSource;
pub use parser::{ParsedFile, Parser, ParserConfig};
pub use source::{DataSource, MemorySource, SourceInfo};
