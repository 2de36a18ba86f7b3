use crate::config::PipelineConfig;
use crate::error::Result;
use crate::models::Frame;
use crate::processors::{FeatureEngine, FeatureReport, MergeReport, TableMerger};
use crate::readers::{DirectorySource, TableReader};
use crate::utils::progress::ProgressReporter;
use crate::writers::persist;
use tracing::info;

/// Align every site's `blh_forecast` with the reference series and persist
/// the merged table to `config.merged_output`.
pub fn run_merge(
    config: &PipelineConfig,
    progress: Option<&ProgressReporter>,
) -> Result<(Frame, MergeReport)> {
    config.ensure_valid()?;

    if let Some(p) = progress {
        p.set_message("Reading reference series...");
    }
    let reference = TableReader::new().read_reference(&config.reference_path)?;
    info!(
        path = %config.reference_path.display(),
        rows = reference.len(),
        "read reference file"
    );

    let source = DirectorySource::from_config(config);
    let merger = TableMerger::new(config.site_indices());
    let (merged, report) = merger.merge(&reference, &source, progress)?;

    if let Some(p) = progress {
        p.set_message("Writing merged table...");
    }
    persist(&merged, &config.merged_output, &config.compression)?;
    info!(path = %config.merged_output.display(), rows = merged.len(), "saved merged table");

    Ok((merged, report))
}

/// Read every per-site training table in `config.site_dir` into one table
/// sorted by (site, datetime).
pub fn load_combined(config: &PipelineConfig, progress: Option<&ProgressReporter>) -> Result<Frame> {
    let source = DirectorySource::from_config(config);
    let engine = FeatureEngine::new(config.features());
    let reader = TableReader::new().with_numeric_columns(engine.required_columns());

    let mut frames = Vec::new();
    for (index, path) in source.discover()? {
        if let Some(p) = progress {
            p.set_message(&format!("Reading {}...", path.display()));
        }

        let records = reader.read_site_records(&path)?;
        let sites = records.integer_site_labels(i64::from(index))?;
        frames.push(records.into_frame(sites)?);
    }

    let mut combined = Frame::concat(frames)?;
    combined.sort_by_key();
    info!(
        rows = combined.len(),
        columns = combined.columns().len(),
        "combined site tables"
    );
    Ok(combined)
}

/// Derive the engineered feature table and persist it to
/// `config.engineered_output`.
pub fn run_features(
    config: &PipelineConfig,
    progress: Option<&ProgressReporter>,
) -> Result<(Frame, FeatureReport)> {
    config.ensure_valid()?;

    let combined = load_combined(config, progress)?;

    if let Some(p) = progress {
        p.set_message("Engineering features...");
    }
    let engine = FeatureEngine::new(config.features());
    let (engineered, report) = engine.engineer(&combined, &config.site_dir.display().to_string())?;

    if let Some(p) = progress {
        p.set_message("Writing engineered table...");
    }
    persist(&engineered, &config.engineered_output, &config.compression)?;
    info!(
        path = %config.engineered_output.display(),
        rows = engineered.len(),
        "saved engineered dataset"
    );

    Ok((engineered, report))
}
