pub mod constants;
pub mod filename;
pub mod progress;

pub use constants::*;
pub use filename::{site_file_name, site_index_from_file_name, OutputFormat};
pub use progress::ProgressReporter;
