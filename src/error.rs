use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(#[from] ::config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Missing columns in {table}: {missing:?}. Found columns: {found:?}")]
    SchemaViolation {
        table: String,
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("Invalid timestamp in {table} at row {row}: {year}-{month}-{day} hour {hour}")]
    InvalidTimestamp {
        table: String,
        row: usize,
        year: f64,
        month: f64,
        day: f64,
        hour: f64,
    },

    #[error("Duplicate row for site {site} at {datetime}")]
    DuplicateKey { site: String, datetime: String },

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),
}

impl ProcessingError {
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, ProcessingError::SchemaViolation { .. })
    }
}
