use crate::error::Result;
use crate::models::timestamp::format_datetime;
use crate::models::Frame;
use crate::utils::constants::{COL_DATETIME, COL_SITE};
use crate::writers::RecordSink;
use std::fs::File;
use std::io::Write;
use std::path::Path;

pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Write `site`, `datetime`, then every numeric column; missing values
    /// are left empty.
    pub fn write_to<W: Write>(&self, frame: &Frame, output: W) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(output);

        let mut header = vec![COL_SITE, COL_DATETIME];
        header.extend(frame.column_names());
        writer.write_record(&header)?;

        let mut row: Vec<String> = Vec::with_capacity(header.len());
        for i in 0..frame.len() {
            row.clear();
            row.push(frame.sites()[i].to_string());
            row.push(format_datetime(&frame.datetimes()[i]));
            for column in frame.columns() {
                row.push(column.values[i].map(|v| v.to_string()).unwrap_or_default());
            }
            writer.write_record(&row)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn get_file_info(&self, path: &Path) -> Result<CsvFileInfo> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)?;

        let columns = reader.headers()?.len();
        let mut total_rows = 0;
        for record in reader.records() {
            record?;
            total_rows += 1;
        }

        Ok(CsvFileInfo {
            total_rows,
            columns,
            file_size: std::fs::metadata(path)?.len(),
        })
    }
}

impl RecordSink for CsvWriter {
    fn write(&self, frame: &Frame, path: &Path) -> Result<()> {
        self.write_to(frame, File::create(path)?)
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct CsvFileInfo {
    pub total_rows: usize,
    pub columns: usize,
    pub file_size: u64,
}

impl CsvFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "CSV File Summary:\n\
            - Total rows: {}\n\
            - Columns: {}\n\
            - File size: {:.2} MB",
            self.total_rows,
            self.columns,
            self.file_size as f64 / 1_048_576.0
        )
    }
}
