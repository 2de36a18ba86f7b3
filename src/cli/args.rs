use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aq-processor")]
#[command(about = "Air-quality dataset preparation: ERA5 BLH alignment and temporal feature engineering")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Configuration file (TOML, YAML or JSON); AQ_* environment variables override it"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Align each site's BLH forecast with the ERA5 reference series
    MergeBlh {
        #[arg(short, long, help = "ERA5 reference CSV (site, datetime, era5_blh)")]
        reference: Option<PathBuf>,

        #[arg(short, long, help = "Directory holding the per-site training tables")]
        site_dir: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output file; .parquet or .csv [default: merged_output from configuration]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long)]
        compression: Option<String>,

        #[arg(long, help = "First logical site index")]
        first_site: Option<u32>,

        #[arg(long, help = "Last logical site index (inclusive)")]
        last_site: Option<u32>,
    },

    /// Derive leakage-safe temporal features from all per-site tables
    Engineer {
        #[arg(short, long, help = "Directory holding the per-site training tables")]
        site_dir: Option<PathBuf>,

        #[arg(
            short,
            long,
            help = "Output file; .parquet or .csv [default: engineered_output from configuration]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long)]
        compression: Option<String>,
    },

    /// Print the effective configuration as JSON
    ShowConfig,

    /// Display information about an output file
    Info {
        #[arg(short, long)]
        file: PathBuf,
    },
}
