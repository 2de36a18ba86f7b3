use crate::error::{ProcessingError, Result};
use crate::models::timestamp::format_datetime;
use crate::models::SiteLabel;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// A named numeric column. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Columnar table keyed by (site, datetime).
///
/// Every row has a site label and a timestamp; all other fields are
/// numeric columns of equal length. Row order is significant: most
/// operations downstream expect the table sorted by (site, datetime).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    sites: Vec<SiteLabel>,
    datetimes: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl Frame {
    pub fn new(
        sites: Vec<SiteLabel>,
        datetimes: Vec<NaiveDateTime>,
        columns: Vec<Column>,
    ) -> Result<Self> {
        if sites.len() != datetimes.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "{} site labels for {} timestamps",
                sites.len(),
                datetimes.len()
            )));
        }

        let mut frame = Self {
            sites,
            datetimes,
            columns: Vec::with_capacity(columns.len()),
        };
        for column in columns {
            frame.insert_column(column.name, column.values)?;
        }
        Ok(frame)
    }

    /// Zero-row table carrying the given column names.
    pub fn empty<S: AsRef<str>>(column_names: &[S]) -> Self {
        Self {
            sites: Vec::new(),
            datetimes: Vec::new(),
            columns: column_names
                .iter()
                .map(|name| Column::new(name.as_ref(), Vec::new()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[SiteLabel] {
        &self.sites
    }

    pub fn datetimes(&self) -> &[NaiveDateTime] {
        &self.datetimes
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Values of a column that the caller has already required.
    pub fn values(&self, name: &str) -> Result<&[Option<f64>]> {
        self.column(name)
            .ok_or_else(|| ProcessingError::MissingData(format!("column '{}'", name)))
    }

    /// Fail with a schema violation naming every absent column.
    pub fn require_columns(&self, table: &str, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|name| !self.has_column(name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ProcessingError::SchemaViolation {
                table: table.to_string(),
                missing,
                found: self.column_names().iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    /// Append a column, replacing any existing column of the same name.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) -> Result<()> {
        let name = name.into();
        if values.len() != self.len() {
            return Err(ProcessingError::InvalidFormat(format!(
                "column '{}' has {} values but the table has {} rows",
                name,
                values.len(),
                self.len()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
        Ok(())
    }

    /// Overwrite every row's site label.
    pub fn set_site(&mut self, label: &SiteLabel) {
        for site in &mut self.sites {
            *site = label.clone();
        }
    }

    pub fn distinct_sites(&self) -> BTreeSet<SiteLabel> {
        self.sites.iter().cloned().collect()
    }

    pub fn datetime_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let min = self.datetimes.iter().min()?;
        let max = self.datetimes.iter().max()?;
        Some((*min, *max))
    }

    /// New table holding the given rows in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        Frame {
            sites: indices.iter().map(|&i| self.sites[i].clone()).collect(),
            datetimes: indices.iter().map(|&i| self.datetimes[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.values[i]).collect()))
                .collect(),
        }
    }

    pub fn filter_site(&self, label: &SiteLabel) -> Frame {
        let indices: Vec<usize> = (0..self.len()).filter(|&i| &self.sites[i] == label).collect();
        self.take_rows(&indices)
    }

    /// Keep only the named columns, in the order given.
    pub fn select_columns(&self, names: &[&str]) -> Result<Frame> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            columns.push(Column::new(*name, self.values(name)?.to_vec()));
        }

        Ok(Frame {
            sites: self.sites.clone(),
            datetimes: self.datetimes.clone(),
            columns,
        })
    }

    /// Stack tables row-wise. Columns are matched by name; a column absent
    /// from some part is filled with missing values for that part's rows.
    pub fn concat(parts: Vec<Frame>) -> Result<Frame> {
        let mut names: Vec<String> = Vec::new();
        for part in &parts {
            for column in &part.columns {
                if !names.contains(&column.name) {
                    names.push(column.name.clone());
                }
            }
        }

        let total: usize = parts.iter().map(Frame::len).sum();
        let mut out = Frame {
            sites: Vec::with_capacity(total),
            datetimes: Vec::with_capacity(total),
            columns: names
                .into_iter()
                .map(|name| Column::new(name, Vec::with_capacity(total)))
                .collect(),
        };

        for part in parts {
            let rows = part.len();
            for column in &mut out.columns {
                match part.column(&column.name) {
                    Some(values) => column.values.extend_from_slice(values),
                    None => column.values.extend(std::iter::repeat(None).take(rows)),
                }
            }
            out.sites.extend(part.sites);
            out.datetimes.extend(part.datetimes);
        }

        Ok(out)
    }

    /// Stable sort of all rows by (site, datetime).
    pub fn sort_by_key(&mut self) {
        if self.is_sorted_by_key() {
            return;
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| {
            self.sites[a]
                .cmp(&self.sites[b])
                .then_with(|| self.datetimes[a].cmp(&self.datetimes[b]))
        });
        *self = self.take_rows(&order);
    }

    pub fn is_sorted_by_key(&self) -> bool {
        (1..self.len()).all(|i| {
            (&self.sites[i - 1], self.datetimes[i - 1]) <= (&self.sites[i], self.datetimes[i])
        })
    }

    /// Split into one table per site, each ordered chronologically.
    pub fn split_by_site(&self) -> Vec<(SiteLabel, Frame)> {
        let mut groups: BTreeMap<&SiteLabel, Vec<usize>> = BTreeMap::new();
        for (i, site) in self.sites.iter().enumerate() {
            groups.entry(site).or_default().push(i);
        }

        groups
            .into_iter()
            .map(|(site, mut indices)| {
                indices.sort_by_key(|&i| self.datetimes[i]);
                (site.clone(), self.take_rows(&indices))
            })
            .collect()
    }

    /// Reject tables holding two rows for the same (site, datetime).
    pub fn ensure_unique_keys(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.len());
        for (site, dt) in self.sites.iter().zip(&self.datetimes) {
            if !seen.insert((site, dt)) {
                return Err(ProcessingError::DuplicateKey {
                    site: site.to_string(),
                    datetime: format_datetime(dt),
                });
            }
        }
        Ok(())
    }

    /// Remove every row with a missing value in any column.
    /// Returns the number of rows removed.
    pub fn drop_incomplete(&mut self) -> usize {
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.columns.iter().all(|c| c.values[i].is_some()))
            .collect();

        let dropped = self.len() - keep.len();
        if dropped > 0 {
            *self = self.take_rows(&keep);
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timestamp::from_components;

    fn hour(h: u32) -> NaiveDateTime {
        from_components(2024.0, 1.0, 1.0, h as f64).unwrap()
    }

    fn sample() -> Frame {
        Frame::new(
            vec![SiteLabel::Int(2), SiteLabel::Int(1), SiteLabel::Int(1)],
            vec![hour(0), hour(5), hour(3)],
            vec![Column::new("x", vec![Some(1.0), None, Some(3.0)])],
        )
        .unwrap()
    }

    #[test]
    fn test_sort_by_key() {
        let mut frame = sample();
        assert!(!frame.is_sorted_by_key());

        frame.sort_by_key();
        assert!(frame.is_sorted_by_key());
        assert_eq!(frame.sites()[0], SiteLabel::Int(1));
        assert_eq!(frame.datetimes()[0], hour(3));
        assert_eq!(frame.values("x").unwrap(), &[Some(3.0), None, Some(1.0)]);
    }

    #[test]
    fn test_split_by_site_orders_chronologically() {
        let groups = sample().split_by_site();
        assert_eq!(groups.len(), 2);

        let (label, site_one) = &groups[0];
        assert_eq!(label, &SiteLabel::Int(1));
        assert_eq!(site_one.datetimes(), &[hour(3), hour(5)]);
    }

    #[test]
    fn test_require_columns_reports_missing() {
        let err = sample().require_columns("sample.csv", &["x", "y", "z"]).unwrap_err();
        match err {
            ProcessingError::SchemaViolation { table, missing, found } => {
                assert_eq!(table, "sample.csv");
                assert_eq!(missing, vec!["y".to_string(), "z".to_string()]);
                assert_eq!(found, vec!["x".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_insert_column_length_mismatch() {
        let mut frame = sample();
        assert!(frame.insert_column("y", vec![Some(1.0)]).is_err());
        assert!(frame.insert_column("y", vec![None; 3]).is_ok());
        assert_eq!(frame.column_names(), vec!["x", "y"]);
    }

    #[test]
    fn test_drop_incomplete() {
        let mut frame = sample();
        assert_eq!(frame.drop_incomplete(), 1);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let frame = Frame::new(
            vec![SiteLabel::Int(1), SiteLabel::Int(1)],
            vec![hour(1), hour(1)],
            vec![],
        )
        .unwrap();
        assert!(matches!(
            frame.ensure_unique_keys(),
            Err(ProcessingError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn test_concat_unions_columns() {
        let a = sample();
        let b = Frame::new(
            vec![SiteLabel::Int(3)],
            vec![hour(7)],
            vec![Column::new("y", vec![Some(9.0)])],
        )
        .unwrap();

        let out = Frame::concat(vec![a, b]).unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(out.column_names(), vec!["x", "y"]);
        assert_eq!(out.values("x").unwrap()[3], None);
        assert_eq!(out.values("y").unwrap(), &[None, None, None, Some(9.0)]);
        assert!(Frame::concat(vec![]).unwrap().is_empty());
    }
}
