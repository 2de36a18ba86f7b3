pub mod source;
pub mod table_reader;

pub use source::{DirectorySource, RecordSource};
pub use table_reader::TableReader;
