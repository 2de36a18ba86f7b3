use crate::error::{ProcessingError, Result};
use crate::models::timestamp::format_datetime;
use crate::models::{Frame, SiteLabel};
use crate::processors::site_reconciler::{Resolution, SiteReconciler};
use crate::readers::RecordSource;
use crate::utils::constants::{COL_BLH_FORECAST, COL_ERA5_BLH, TIMESTAMP_COLUMNS};
use crate::utils::progress::ProgressReporter;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SiteMergeStats {
    pub site_index: u32,
    pub label: SiteLabel,
    pub reference_rows: usize,
    pub site_rows: usize,
    pub merged_rows: usize,
    pub datetime_range: Option<(NaiveDateTime, NaiveDateTime)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSite {
    pub site_index: u32,
    pub tried: Vec<SiteLabel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeReport {
    pub merged: Vec<SiteMergeStats>,
    pub skipped: Vec<SkippedSite>,
}

impl MergeReport {
    pub fn total_rows(&self) -> usize {
        self.merged.iter().map(|s| s.merged_rows).sum()
    }

    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Merge Report ===\n");
        summary.push_str(&format!("Sites merged: {}\n", self.merged.len()));
        summary.push_str(&format!("Sites skipped: {}\n", self.skipped.len()));
        summary.push_str(&format!("Total merged rows: {}\n", self.total_rows()));

        for stats in &self.merged {
            summary.push_str(&format!(
                "  site_{} -> {:?}: reference={} train={} merged={}",
                stats.site_index,
                stats.label.to_string(),
                stats.reference_rows,
                stats.site_rows,
                stats.merged_rows
            ));
            if let Some((start, end)) = stats.datetime_range {
                summary.push_str(&format!(
                    " [{} -> {}]",
                    format_datetime(&start),
                    format_datetime(&end)
                ));
            }
            summary.push('\n');
        }

        for skipped in &self.skipped {
            summary.push_str(&format!(
                "  site_{} skipped: no reference label among {:?}\n",
                skipped.site_index,
                skipped.tried.iter().map(|l| l.to_string()).collect::<Vec<_>>()
            ));
        }

        summary
    }
}

/// Aligns per-site forecast tables with a reference series on (site, datetime).
pub struct TableMerger {
    reconciler: SiteReconciler,
    site_indices: RangeInclusive<u32>,
}

impl TableMerger {
    pub fn new(site_indices: RangeInclusive<u32>) -> Self {
        Self {
            reconciler: SiteReconciler::new(),
            site_indices,
        }
    }

    pub fn with_reconciler(mut self, reconciler: SiteReconciler) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Inner-join each resolvable site's `blh_forecast` onto the reference
    /// rows carrying that site's label.
    pub fn merge<S>(
        &self,
        reference: &Frame,
        source: &S,
        progress: Option<&ProgressReporter>,
    ) -> Result<(Frame, MergeReport)>
    where
        S: RecordSource + ?Sized,
    {
        reference.require_columns("reference series", &[COL_ERA5_BLH])?;

        let labels = reference.distinct_sites();
        info!(
            rows = reference.len(),
            sites = ?labels.iter().map(|l| l.to_string()).collect::<Vec<_>>(),
            "loaded reference series"
        );

        let mut report = MergeReport::default();
        let mut parts = Vec::new();

        for index in self.site_indices.clone() {
            if let Some(p) = progress {
                p.set_message(&format!("Merging site_{}...", index));
            }

            let label = match self.reconciler.resolve(index, &labels) {
                Resolution::Resolved(label) => label,
                Resolution::Unresolved { tried } => {
                    warn!(site_index = index, "skipping site: no matching reference label");
                    report.skipped.push(SkippedSite {
                        site_index: index,
                        tried,
                    });
                    continue;
                }
            };

            let records = source.load_site(index)?;
            let mut required = TIMESTAMP_COLUMNS.to_vec();
            required.push(COL_BLH_FORECAST);
            records.require_columns(&required)?;

            let site_frame = records.into_frame_for(&label)?.select_columns(&[COL_BLH_FORECAST])?;
            site_frame.ensure_unique_keys()?;

            let reference_site = reference.filter_site(&label);
            reference_site.ensure_unique_keys()?;

            let merged = inner_join(&reference_site, &site_frame)?;

            let stats = SiteMergeStats {
                site_index: index,
                label: label.clone(),
                reference_rows: reference_site.len(),
                site_rows: site_frame.len(),
                merged_rows: merged.len(),
                datetime_range: merged.datetime_range(),
            };
            info!(
                site_index = index,
                label = %label,
                reference_rows = stats.reference_rows,
                site_rows = stats.site_rows,
                merged_rows = stats.merged_rows,
                "merged site"
            );
            if merged.is_empty() {
                warn!(site_index = index, label = %label, "no overlapping timestamps");
            }
            if let Some((start, end)) = stats.datetime_range {
                info!(
                    "Datetime range in merged: {} -> {}",
                    format_datetime(&start),
                    format_datetime(&end)
                );
            }

            report.merged.push(stats);
            parts.push(merged);

            if let Some(p) = progress {
                p.increment(1);
            }
        }

        let merged = if parts.is_empty() {
            let mut columns = reference.column_names();
            columns.push(COL_BLH_FORECAST);
            Frame::empty(&columns)
        } else {
            let mut all = Frame::concat(parts)?;
            all.sort_by_key();
            all
        };

        info!(rows = merged.len(), "final merged table");
        Ok((merged, report))
    }
}

/// Rows of `left` whose (site, datetime) also appears in `right`, in `left`
/// order, with `right`'s columns appended. Unmatched rows on either side are
/// dropped.
pub fn inner_join(left: &Frame, right: &Frame) -> Result<Frame> {
    let collisions: Vec<&str> = right
        .column_names()
        .into_iter()
        .filter(|name| left.has_column(name))
        .collect();
    if !collisions.is_empty() {
        return Err(ProcessingError::InvalidFormat(format!(
            "both join inputs carry columns {:?}",
            collisions
        )));
    }

    let right_index: HashMap<(&SiteLabel, &NaiveDateTime), usize> = right
        .sites()
        .iter()
        .zip(right.datetimes())
        .enumerate()
        .map(|(i, key)| (key, i))
        .collect();

    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = left
        .sites()
        .iter()
        .zip(left.datetimes())
        .enumerate()
        .filter_map(|(i, key)| right_index.get(&key).map(|&j| (i, j)))
        .unzip();

    let mut joined = left.take_rows(&left_rows);
    let matched = right.take_rows(&right_rows);
    for column in matched.columns() {
        joined.insert_column(column.name.clone(), column.values.clone())?;
    }
    Ok(joined)
}
