use crate::cli::args::{Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::pipeline::{run_features, run_merge};
use crate::utils::constants::COMPRESSION_NONE;
use crate::utils::filename::OutputFormat;
use crate::utils::progress::ProgressReporter;
use crate::writers::{CsvWriter, ParquetWriter};
use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, Level};

pub fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    match cli.command {
        Commands::MergeBlh {
            reference,
            site_dir,
            output_file,
            compression,
            first_site,
            last_site,
        } => {
            let mut config = PipelineConfig::load(cli.config.as_deref())?;
            override_with(&mut config.reference_path, reference);
            override_with(&mut config.site_dir, site_dir);
            override_with(&mut config.merged_output, output_file);
            override_with(&mut config.compression, compression);
            override_with(&mut config.first_site, first_site);
            override_with(&mut config.last_site, last_site);

            println!("Merging ERA5 BLH with per-site forecasts...");
            println!("Reference: {}", config.reference_path.display());
            println!("Site directory: {}", config.site_dir.display());
            println!("Output file: {}", config.merged_output.display());

            let total = config.site_indices().count() as u64;
            let progress = ProgressReporter::new(total, "Merging sites...", false);

            let (merged, report) = run_merge(&config, Some(&progress))?;

            progress.finish_with_message(&format!("Merged {} rows", merged.len()));

            println!("\n{}", report.summary());
            print_file_info(&config.merged_output, &config.compression)?;
            println!("Merge complete!");
        }

        Commands::Engineer {
            site_dir,
            output_file,
            compression,
        } => {
            let mut config = PipelineConfig::load(cli.config.as_deref())?;
            override_with(&mut config.site_dir, site_dir);
            override_with(&mut config.engineered_output, output_file);
            override_with(&mut config.compression, compression);

            println!("Engineering temporal features...");
            println!("Site directory: {}", config.site_dir.display());
            println!("Output file: {}", config.engineered_output.display());

            let progress = ProgressReporter::new_spinner("Reading site tables...", false);

            let (engineered, report) = run_features(&config, Some(&progress))?;

            progress.finish_with_message(&format!(
                "Engineered {} rows x {} columns",
                engineered.len(),
                engineered.columns().len() + 2
            ));

            println!("\n{}", report.summary());
            print_file_info(&config.engineered_output, &config.compression)?;
            println!("Feature engineering complete!");
        }

        Commands::ShowConfig => {
            let config = PipelineConfig::load(cli.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Commands::Info { file } => {
            println!("Inspecting file: {}", file.display());
            print_file_info(&file, COMPRESSION_NONE)?;
        }
    }

    Ok(())
}

fn override_with<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn print_file_info(path: &Path, compression: &str) -> Result<()> {
    let summary = match OutputFormat::from_path(path) {
        OutputFormat::Parquet => ParquetWriter::new()
            .with_compression(compression)?
            .get_file_info(path)?
            .summary(),
        OutputFormat::Csv => CsvWriter::new().get_file_info(path)?.summary(),
    };
    println!("\n{}", summary);
    Ok(())
}

/// Install the global fmt subscriber. With a log file, events go there
/// without ANSI colours instead of to stderr.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    let installed = match log_file {
        Some(path) => {
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => builder.with_writer(std::io::stderr).try_init(),
    };

    installed.map_err(|e| ProcessingError::Config(format!("cannot initialise logging: {}", e)))?;

    if let Some(path) = log_file {
        info!(path = %path.display(), "logging to file");
    }
    Ok(())
}
