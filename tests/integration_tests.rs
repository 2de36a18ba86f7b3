use aq_processor::cli::{Cli, Commands};
use aq_processor::models::SiteLabel;
use aq_processor::pipeline::{load_combined, run_features, run_merge};
use aq_processor::readers::TableReader;
use aq_processor::writers::{CsvWriter, ParquetWriter};
use aq_processor::{PipelineConfig, ProcessingError};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use clap::Parser;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SITE_HEADER: &str = "year,month,day,hour,u_forecast,v_forecast,w_forecast,blh_forecast,\
O3_forecast,NO2_forecast,NO2_satellite,HCHO_satellite,O3_target,NO2_target";

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn write_site_file(dir: &Path, index: u32, hours: usize) {
    let mut text = String::from(SITE_HEADER);
    text.push('\n');
    for h in 0..hours {
        let dt = start() + Duration::hours(h as i64);
        let x = h as f64 + f64::from(index) * 100.0;
        text.push_str(&format!(
            "{},{},{},{},1.5,-2.0,0.01,{},30.0,12.0,0.4,0.2,{},{}\n",
            dt.format("%Y"),
            dt.format("%-m"),
            dt.format("%-d"),
            dt.format("%-H"),
            500.0 + x,
            40.0 + x,
            10.0 + x
        ));
    }
    fs::write(dir.join(format!("site_{}_train_data.csv", index)), text).unwrap();
}

/// `site_1` covers hours 5..=40 and `2` covers hours 0..=9; site 3 has no label.
fn write_reference(path: &Path) {
    let mut text = String::from("site,datetime,era5_blh\n");
    for h in 5..=40 {
        let dt = start() + Duration::hours(h);
        text.push_str(&format!("site_1,{},{}\n", dt.format("%Y-%m-%d %H:%M:%S"), 300 + h));
    }
    for h in 0..=9 {
        let dt = start() + Duration::hours(h);
        text.push_str(&format!("2,{},{}\n", dt.format("%Y-%m-%dT%H:%M:%S"), 700 + h));
    }
    fs::write(path, text).unwrap();
}

fn fixture(merged_name: &str, engineered_name: &str) -> (TempDir, PipelineConfig) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let site_dir = temp_dir.path().join("sites");
    fs::create_dir_all(&site_dir).unwrap();

    for index in 1..=3 {
        write_site_file(&site_dir, index, 30);
    }
    let reference_path = temp_dir.path().join("era5_station_timeseries.csv");
    write_reference(&reference_path);

    let config = PipelineConfig {
        first_site: 1,
        last_site: 3,
        reference_path,
        merged_output: temp_dir.path().join("out").join(merged_name),
        engineered_output: temp_dir.path().join("out").join(engineered_name),
        site_dir,
        ..PipelineConfig::default()
    };
    (temp_dir, config)
}

#[test]
fn test_merge_blh_end_to_end() {
    let (_dir, config) = fixture("merged.csv", "engineered.csv");

    let (merged, report) = run_merge(&config, None).unwrap();

    assert_eq!(report.merged.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].site_index, 3);
    assert_eq!(report.merged[0].label, SiteLabel::text("site_1"));
    assert_eq!(report.merged[0].merged_rows, 25);
    assert_eq!(report.merged[1].label, SiteLabel::text("2"));
    assert_eq!(report.merged[1].merged_rows, 10);
    assert_eq!(merged.len(), 35);
    assert_eq!(merged.column_names(), vec!["era5_blh", "blh_forecast"]);

    // Reading the written table back gives the same rows.
    let reread = TableReader::new().read_reference(&config.merged_output).unwrap();
    assert_eq!(reread, merged);

    // Site 2's first merged row: reference hour 0 against site file hour 0.
    let first_site_2 = merged
        .sites()
        .iter()
        .position(|s| s == &SiteLabel::text("2"))
        .unwrap();
    assert_eq!(merged.datetimes()[first_site_2], start());
    assert_eq!(merged.values("era5_blh").unwrap()[first_site_2], Some(700.0));
    assert_eq!(merged.values("blh_forecast").unwrap()[first_site_2], Some(700.0));
}

#[test]
fn test_merge_blh_parquet_output() {
    let (_dir, config) = fixture("merged.parquet", "engineered.parquet");

    run_merge(&config, None).unwrap();

    let info = ParquetWriter::new().get_file_info(&config.merged_output).unwrap();
    assert_eq!(info.total_rows, 35);
    assert_eq!(info.columns, 4);
}

#[test]
fn test_merge_blh_without_reference_fails() {
    let (_dir, mut config) = fixture("merged.csv", "engineered.csv");
    config.reference_path = config.site_dir.join("missing.csv");

    let err = run_merge(&config, None).unwrap_err();
    assert!(matches!(err, ProcessingError::Io(_)));
    assert!(!config.merged_output.exists());
}

#[test]
fn test_engineer_end_to_end() {
    let (_dir, config) = fixture("merged.csv", "engineered.csv");

    let (engineered, report) = run_features(&config, None).unwrap();

    // 24 warm-up rows per site leave 6 of 30.
    assert_eq!(report.sites, 3);
    assert_eq!(report.rows_before, 90);
    assert_eq!(report.rows_after, 18);
    assert_eq!(engineered.len(), 18);
    assert!(engineered.is_sorted_by_key());

    for col in [
        "hour_sin",
        "dow",
        "is_weekend",
        "wind_speed",
        "blh_log",
        "O3_target_lag_24h",
        "NO2_forecast_rollstd_24h",
    ] {
        assert!(engineered.has_column(col), "missing column {}", col);
    }

    // First surviving row of each site is hour 24; its 24h lag is hour 0.
    let lag = engineered.values("O3_target_lag_24h").unwrap();
    assert_eq!(engineered.sites()[0], SiteLabel::Int(1));
    assert_eq!(lag[0], Some(140.0));
    assert_eq!(engineered.sites()[6], SiteLabel::Int(2));
    assert_eq!(lag[6], Some(240.0));

    // Mean of hours 21..=23 for site 1, never including hour 24 itself.
    let mean = engineered.values("O3_target_rollmean_3h").unwrap();
    assert_eq!(mean[0], Some(162.0));

    let info = CsvWriter::new().get_file_info(&config.engineered_output).unwrap();
    assert_eq!(info.total_rows, 18);
    assert_eq!(info.columns, engineered.columns().len() + 2);
}

#[test]
fn test_engineer_empty_site_dir_fails() {
    let (_dir, mut config) = fixture("merged.csv", "engineered.csv");
    config.site_dir = config.site_dir.join("empty");
    fs::create_dir_all(&config.site_dir).unwrap();

    let err = run_features(&config, None).unwrap_err();
    assert!(matches!(err, ProcessingError::MissingData(_)));
}

#[test]
fn test_combined_table_uses_file_index_as_site() {
    let (_dir, config) = fixture("merged.csv", "engineered.csv");

    let combined = load_combined(&config, None).unwrap();

    assert_eq!(combined.len(), 90);
    assert_eq!(
        combined.distinct_sites().into_iter().collect::<Vec<_>>(),
        vec![SiteLabel::Int(1), SiteLabel::Int(2), SiteLabel::Int(3)]
    );
}

#[test]
fn test_invalid_config_is_rejected_before_io() {
    let (_dir, mut config) = fixture("merged.csv", "engineered.csv");
    config.first_site = 5;
    config.last_site = 2;

    assert!(matches!(
        run_merge(&config, None),
        Err(ProcessingError::Validation(_))
    ));
}

#[test]
fn test_cli_parses_subcommands() {
    let cli = Cli::try_parse_from([
        "aq-processor",
        "--verbose",
        "merge-blh",
        "--reference",
        "era5.csv",
        "--last-site",
        "4",
    ])
    .unwrap();

    assert!(cli.verbose);
    match cli.command {
        Commands::MergeBlh {
            reference,
            last_site,
            output_file,
            ..
        } => {
            assert_eq!(reference, Some("era5.csv".into()));
            assert_eq!(last_site, Some(4));
            assert_eq!(output_file, None);
        }
        _ => panic!("expected merge-blh"),
    }

    let cli = Cli::try_parse_from(["aq-processor", "info", "--file", "out.parquet"]).unwrap();
    assert!(matches!(cli.command, Commands::Info { .. }));

    let cli = Cli::try_parse_from(["aq-processor", "show-config", "--config", "aq.toml"]).unwrap();
    assert!(matches!(cli.command, Commands::ShowConfig));
    assert_eq!(cli.config, Some("aq.toml".into()));
}

#[test]
fn test_config_serializes_to_json() {
    let config = PipelineConfig::default();
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["first_site"], 1);
    assert_eq!(json["last_site"], 7);
    assert_eq!(json["site_file_pattern"], "site_{i}_train_data.csv");

    let back: PipelineConfig = serde_json::from_value(json).unwrap();
    assert_eq!(back, config);
}
