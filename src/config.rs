use crate::error::{ProcessingError, Result};
use crate::processors::FeatureConfig;
use crate::utils::constants::*;
use crate::utils::filename::site_file_name;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationError};

/// Environment variables prefixed with this override file settings,
/// e.g. `AQ_EPSILON=0.01` or `AQ_SITE_DIR=/data/sites`.
pub const ENV_PREFIX: &str = "AQ";

/// Everything a pipeline run needs, with the defaults used in production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_site_range"))]
pub struct PipelineConfig {
    #[validate(range(min = 1))]
    pub first_site: u32,

    #[validate(range(min = 1))]
    pub last_site: u32,

    #[validate(length(min = 1), custom(function = "validate_positive"))]
    pub lag_hours: Vec<usize>,

    #[validate(length(min = 1), custom(function = "validate_positive"))]
    pub rolling_windows: Vec<usize>,

    #[validate(range(exclusive_min = 0.0))]
    pub epsilon: f64,

    pub lag_columns: Vec<String>,
    pub rolling_columns: Vec<String>,

    pub reference_path: PathBuf,
    pub site_dir: PathBuf,

    /// File name of one site's training table; `{i}` is the site index.
    #[validate(length(min = 1))]
    pub site_file_pattern: String,

    pub merged_output: PathBuf,
    pub engineered_output: PathBuf,

    /// Parquet compression, used when an output path ends in `.parquet`.
    pub compression: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let site_dir = PathBuf::from("data").join("sites");
        Self {
            first_site: DEFAULT_FIRST_SITE,
            last_site: DEFAULT_LAST_SITE,
            lag_hours: DEFAULT_LAG_HOURS.to_vec(),
            rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
            epsilon: DEFAULT_EPSILON,
            lag_columns: DEFAULT_LAG_COLUMNS.iter().map(|s| s.to_string()).collect(),
            rolling_columns: DEFAULT_ROLLING_COLUMNS.iter().map(|s| s.to_string()).collect(),
            reference_path: PathBuf::from("data").join(DEFAULT_REFERENCE_FILE),
            merged_output: site_dir.join(DEFAULT_MERGED_FILE),
            engineered_output: site_dir.join(DEFAULT_ENGINEERED_FILE),
            site_dir,
            site_file_pattern: SITE_FILE_PATTERN.to_string(),
            compression: COMPRESSION_SNAPPY.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Layer defaults, an optional TOML/JSON file, then `AQ_*` environment
    /// variables, and validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: ::config::Environment) -> Result<Self> {
        let mut builder =
            ::config::Config::builder().add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings: PipelineConfig = builder
            .add_source(env)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn site_indices(&self) -> RangeInclusive<u32> {
        self.first_site..=self.last_site
    }

    pub fn site_file_name(&self, index: u32) -> String {
        site_file_name(&self.site_file_pattern, index)
    }

    pub fn site_path(&self, index: u32) -> PathBuf {
        self.site_dir.join(self.site_file_name(index))
    }

    pub fn features(&self) -> FeatureConfig {
        FeatureConfig {
            lag_hours: self.lag_hours.clone(),
            rolling_windows: self.rolling_windows.clone(),
            epsilon: self.epsilon,
            lag_columns: self.lag_columns.clone(),
            rolling_columns: self.rolling_columns.clone(),
        }
    }

    pub fn ensure_valid(&self) -> Result<()> {
        self.validate().map_err(ProcessingError::from)
    }
}

/// `AQ_*` variables; list settings take comma-separated values, e.g.
/// `AQ_LAG_HOURS=1,2,24`.
fn environment() -> ::config::Environment {
    LIST_KEYS.iter().fold(
        ::config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}

const LIST_KEYS: [&str; 4] = ["lag_hours", "rolling_windows", "lag_columns", "rolling_columns"];

fn validate_positive(values: &[usize]) -> std::result::Result<(), ValidationError> {
    if values.iter().any(|&v| v == 0) {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

fn validate_site_range(config: &PipelineConfig) -> std::result::Result<(), ValidationError> {
    if config.last_site < config.first_site {
        return Err(ValidationError::new("last_site_before_first_site"));
    }
    Ok(())
}
