use crate::error::{ProcessingError, Result};
use crate::models::timestamp::parse_datetime;
use crate::models::{Column, Frame, SiteLabel, SiteRecords};
use crate::utils::constants::{
    COL_BLH_FORECAST, COL_DATETIME, COL_ERA5_BLH, COL_SITE, DEFAULT_BUFFER_SIZE, TIMESTAMP_COLUMNS,
};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Cell spellings read as a missing value.
const MISSING_MARKERS: [&str; 6] = ["", "nan", "NaN", "NA", "N/A", "null"];

/// Raw CSV contents: header names and one `Vec<String>` per column.
struct RawTable {
    source: String,
    headers: Vec<String>,
    cells: Vec<Vec<String>>,
}

impl RawTable {
    fn take(&mut self, name: &str) -> Option<Vec<String>> {
        let pos = self.headers.iter().position(|h| h == name)?;
        self.headers.remove(pos);
        Some(self.cells.remove(pos))
    }

    fn require(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.headers.iter().any(|h| h == *name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        Err(ProcessingError::SchemaViolation {
            table: self.source.clone(),
            missing,
            found: self.headers.clone(),
        })
    }

    /// Parse every remaining column as numbers. A column in `strict` with a
    /// bad cell is an error; any other such column is left out and its name
    /// returned alongside the parsed columns.
    fn numeric_columns(self, strict: &[String]) -> Result<(Vec<Column>, Vec<String>)> {
        let source = self.source;
        let mut columns = Vec::with_capacity(self.headers.len());
        let mut skipped = Vec::new();

        for (name, cells) in self.headers.into_iter().zip(self.cells) {
            let parsed = cells
                .iter()
                .enumerate()
                .map(|(row, cell)| parse_number(cell, &source, &name, row))
                .collect::<Result<Vec<_>>>();

            match parsed {
                Ok(values) => columns.push(Column::new(name, values)),
                Err(e) if strict.contains(&name) => return Err(e),
                Err(_) => skipped.push(name),
            }
        }

        Ok((columns, skipped))
    }
}

fn parse_number(cell: &str, source: &str, column: &str, row: usize) -> Result<Option<f64>> {
    let cell = cell.trim();
    if MISSING_MARKERS.contains(&cell) {
        return Ok(None);
    }

    cell.parse::<f64>()
        .map(|v| (!v.is_nan()).then_some(v))
        .map_err(|_| {
            ProcessingError::InvalidFormat(format!(
                "{}: column '{}' row {}: '{}' is not a number",
                source, column, row, cell
            ))
        })
}

/// Reads the CSV tables consumed by the pipelines.
///
/// Columns the pipelines compute with must hold numbers throughout; other
/// columns are kept when numeric and skipped otherwise.
pub struct TableReader {
    delimiter: u8,
    numeric: Vec<String>,
}

impl TableReader {
    pub fn new() -> Self {
        Self::with_delimiter(b',')
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        let mut numeric: Vec<String> = TIMESTAMP_COLUMNS.iter().map(|c| c.to_string()).collect();
        numeric.push(COL_ERA5_BLH.to_string());
        numeric.push(COL_BLH_FORECAST.to_string());
        Self { delimiter, numeric }
    }

    /// Also require these columns, when present, to be fully numeric.
    pub fn with_numeric_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            let name = name.into();
            if !self.numeric.contains(&name) {
                self.numeric.push(name);
            }
        }
        self
    }

    /// Read the reference series: `site`, `datetime`, `era5_blh`, plus any
    /// further numeric columns.
    pub fn read_reference(&self, path: &Path) -> Result<Frame> {
        let raw = self.read_raw(File::open(path)?, &path.display().to_string())?;
        self.reference_from_raw(raw)
    }

    pub fn read_reference_from<R: Read>(&self, input: R, source: &str) -> Result<Frame> {
        let raw = self.read_raw(input, source)?;
        self.reference_from_raw(raw)
    }

    fn reference_from_raw(&self, mut raw: RawTable) -> Result<Frame> {
        raw.require(&[COL_SITE, COL_DATETIME, COL_ERA5_BLH])?;

        let site_cells = raw.take(COL_SITE).unwrap_or_default();
        let datetime_cells = raw.take(COL_DATETIME).unwrap_or_default();

        let sites = SiteLabel::from_column(&site_cells);
        let datetimes = datetime_cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                parse_datetime(cell).map_err(|e| {
                    ProcessingError::InvalidFormat(format!(
                        "{}: datetime '{}' at row {}: {}",
                        raw.source, cell, row, e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let source = raw.source.clone();
        let (columns, skipped) = raw.numeric_columns(&self.numeric)?;
        for name in skipped {
            warn!(table = %source, column = %name, "dropping non-numeric column");
        }
        Frame::new(sites, datetimes, columns)
    }

    /// Read one site's training table; the `site` column, when present, is
    /// kept as raw text.
    pub fn read_site_records(&self, path: &Path) -> Result<SiteRecords> {
        self.read_site_records_from(File::open(path)?, &path.display().to_string())
    }

    pub fn read_site_records_from<R: Read>(&self, input: R, source: &str) -> Result<SiteRecords> {
        let mut raw = self.read_raw(input, source)?;
        let site_cells = raw.take(COL_SITE);
        // Rebuilt from the calendar components.
        raw.take(COL_DATETIME);
        let source = raw.source.clone();
        let (columns, skipped) = raw.numeric_columns(&self.numeric)?;
        for name in skipped {
            debug!(table = %source, column = %name, "ignoring non-numeric column");
        }
        Ok(SiteRecords::new(source, site_cells, columns))
    }

    fn read_raw<R: Read>(&self, input: R, source: &str) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, input));

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];

        for record in reader.records() {
            let record = record?;
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        Ok(RawTable {
            source: source.to_string(),
            headers,
            cells,
        })
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}
