use crate::error::{ProcessingError, Result};
use crate::models::{timestamp, Column, Frame, SiteLabel};
use crate::utils::constants::{COL_DAY, COL_HOUR, COL_MONTH, COL_YEAR, TIMESTAMP_COLUMNS};

/// One site's training table as read from disk, before a timestamp exists.
#[derive(Debug, Clone)]
pub struct SiteRecords {
    /// Where the table came from, used in error messages.
    pub source: String,
    /// Raw `site` cells when the table carries its own site column.
    pub site_cells: Option<Vec<String>>,
    pub columns: Vec<Column>,
}

impl SiteRecords {
    pub fn new(source: impl Into<String>, site_cells: Option<Vec<String>>, columns: Vec<Column>) -> Self {
        Self {
            source: source.into(),
            site_cells,
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.first().map_or_else(
            || self.site_cells.as_ref().map_or(0, Vec::len),
            |c| c.values.len(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(self.columns.len() + 1);
        if self.site_cells.is_some() {
            names.push("site".to_string());
        }
        names.extend(self.columns.iter().map(|c| c.name.clone()));
        names
    }

    fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Fail with a schema violation naming the file and every absent column.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| self.column(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        Err(ProcessingError::SchemaViolation {
            table: self.source.clone(),
            missing,
            found: self.column_names(),
        })
    }

    /// Integer site labels from the table's own `site` column, or `fallback`
    /// for every row when the column is absent.
    pub fn integer_site_labels(&self, fallback: i64) -> Result<Vec<SiteLabel>> {
        let Some(cells) = &self.site_cells else {
            return Ok(vec![SiteLabel::Int(fallback); self.len()]);
        };

        cells
            .iter()
            .enumerate()
            .map(|(row, cell)| {
                let value = cell.trim().parse::<f64>().ok().filter(|v| v.fract() == 0.0);
                value.map(|v| SiteLabel::Int(v as i64)).ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!(
                        "{}: site value '{}' at row {} is not an integer",
                        self.source, cell, row
                    ))
                })
            })
            .collect()
    }

    /// Build the keyed table: one timestamp per row from the calendar
    /// components, with the supplied site labels.
    pub fn into_frame(self, sites: Vec<SiteLabel>) -> Result<Frame> {
        self.require_columns(&TIMESTAMP_COLUMNS)?;

        let datetimes = {
            let year = self.column(COL_YEAR).unwrap_or_default();
            let month = self.column(COL_MONTH).unwrap_or_default();
            let day = self.column(COL_DAY).unwrap_or_default();
            let hour = self.column(COL_HOUR).unwrap_or_default();

            (0..self.len())
                .map(|row| {
                    let parts = (year[row], month[row], day[row], hour[row]);
                    let dt = match parts {
                        (Some(y), Some(m), Some(d), Some(h)) => timestamp::from_components(y, m, d, h),
                        _ => None,
                    };
                    dt.ok_or_else(|| ProcessingError::InvalidTimestamp {
                        table: self.source.clone(),
                        row,
                        year: parts.0.unwrap_or(f64::NAN),
                        month: parts.1.unwrap_or(f64::NAN),
                        day: parts.2.unwrap_or(f64::NAN),
                        hour: parts.3.unwrap_or(f64::NAN),
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        Frame::new(sites, datetimes, self.columns)
    }

    /// Build the keyed table with one label for every row.
    pub fn into_frame_for(self, label: &SiteLabel) -> Result<Frame> {
        let sites = vec![label.clone(); self.len()];
        self.into_frame(sites)
    }
}
