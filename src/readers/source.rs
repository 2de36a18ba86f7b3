use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::SiteRecords;
use crate::readers::TableReader;
use crate::utils::filename::{site_file_name, site_index_from_file_name};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Supplies per-site training tables by logical site index.
pub trait RecordSource {
    fn load_site(&self, index: u32) -> Result<SiteRecords>;
}

impl RecordSource for BTreeMap<u32, SiteRecords> {
    fn load_site(&self, index: u32) -> Result<SiteRecords> {
        self.get(&index)
            .cloned()
            .ok_or_else(|| ProcessingError::MissingData(format!("no records for site_{}", index)))
    }
}

/// Per-site CSV files in one directory, named after a `{i}` pattern.
pub struct DirectorySource {
    dir: PathBuf,
    pattern: String,
    reader: TableReader,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            pattern: pattern.into(),
            reader: TableReader::new(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.site_dir, &config.site_file_pattern)
    }

    pub fn site_path(&self, index: u32) -> PathBuf {
        self.dir.join(site_file_name(&self.pattern, index))
    }

    /// Every file in the directory matching the pattern, ordered by index.
    pub fn discover(&self) -> Result<Vec<(u32, PathBuf)>> {
        let mut found = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match site_index_from_file_name(&self.pattern, name) {
                Some(index) => found.push((index, path.clone())),
                None => debug!(file = name, "skipping unexpected filename"),
            }
        }

        found.sort();
        info!(dir = %self.dir.display(), count = found.len(), "found site files");

        if found.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "no files matching '{}' in {}",
                self.pattern,
                self.dir.display()
            )));
        }
        Ok(found)
    }
}

impl RecordSource for DirectorySource {
    fn load_site(&self, index: u32) -> Result<SiteRecords> {
        let path = self.site_path(index);
        debug!(path = %path.display(), "reading site table");
        self.reader.read_site_records(&path)
    }
}
