use std::path::Path;

/// Placeholder for the site index inside a file name pattern.
pub const SITE_INDEX_PLACEHOLDER: &str = "{i}";

/// File name for one site, e.g. `site_{i}_train_data.csv` -> `site_3_train_data.csv`
pub fn site_file_name(pattern: &str, index: u32) -> String {
    pattern.replace(SITE_INDEX_PLACEHOLDER, &index.to_string())
}

/// Site index encoded in a file name, if it matches the pattern.
pub fn site_index_from_file_name(pattern: &str, file_name: &str) -> Option<u32> {
    let (prefix, suffix) = pattern.split_once(SITE_INDEX_PLACEHOLDER)?;
    let digits = file_name.strip_prefix(prefix)?.strip_suffix(suffix)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Output formats chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => OutputFormat::Parquet,
            _ => OutputFormat::Csv,
        }
    }
}
