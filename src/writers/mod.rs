pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::{CsvFileInfo, CsvWriter};
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};

use crate::error::Result;
use crate::models::Frame;
use crate::utils::filename::OutputFormat;
use std::path::Path;
use tracing::warn;

/// Persists a finished table.
pub trait RecordSink {
    fn write(&self, frame: &Frame, path: &Path) -> Result<()>;
}

/// Pick the writer for `path` by extension (`.parquet` or CSV otherwise).
pub fn sink_for(path: &Path, compression: &str) -> Result<Box<dyn RecordSink>> {
    Ok(match OutputFormat::from_path(path) {
        OutputFormat::Parquet => Box::new(ParquetWriter::new().with_compression(compression)?),
        OutputFormat::Csv => Box::new(CsvWriter::new()),
    })
}

/// Write `frame` to `path`, creating parent directories and warning before
/// an existing file is replaced.
pub fn persist(frame: &Frame, path: &Path, compression: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    if path.exists() {
        warn!(path = %path.display(), "overwriting existing file");
    }

    sink_for(path, compression)?.write(frame, path)
}
