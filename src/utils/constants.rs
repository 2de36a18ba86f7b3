/// Key columns
pub const COL_SITE: &str = "site";
pub const COL_DATETIME: &str = "datetime";

/// Calendar component columns of the per-site training tables
pub const COL_YEAR: &str = "year";
pub const COL_MONTH: &str = "month";
pub const COL_DAY: &str = "day";
pub const COL_HOUR: &str = "hour";
pub const TIMESTAMP_COLUMNS: [&str; 4] = [COL_YEAR, COL_MONTH, COL_DAY, COL_HOUR];

/// Reference (ERA5) series
pub const COL_ERA5_BLH: &str = "era5_blh";

/// Forecast, satellite and target variables
pub const COL_U_FORECAST: &str = "u_forecast";
pub const COL_V_FORECAST: &str = "v_forecast";
pub const COL_W_FORECAST: &str = "w_forecast";
pub const COL_BLH_FORECAST: &str = "blh_forecast";
pub const COL_O3_FORECAST: &str = "O3_forecast";
pub const COL_NO2_FORECAST: &str = "NO2_forecast";
pub const COL_O3_TARGET: &str = "O3_target";
pub const COL_NO2_TARGET: &str = "NO2_target";
pub const COL_NO2_SATELLITE: &str = "NO2_satellite";
pub const COL_HCHO_SATELLITE: &str = "HCHO_satellite";

/// Site label candidates
pub const SITE_PREFIX_LOWER: &str = "site_";
pub const SITE_PREFIX_UPPER: &str = "SITE_";

/// Pipeline defaults
pub const DEFAULT_FIRST_SITE: u32 = 1;
pub const DEFAULT_LAST_SITE: u32 = 7;
pub const DEFAULT_LAG_HOURS: [usize; 6] = [1, 2, 3, 6, 12, 24];
pub const DEFAULT_ROLLING_WINDOWS: [usize; 4] = [3, 6, 12, 24];
pub const DEFAULT_EPSILON: f64 = 1e-3;
pub const DEFAULT_LAG_COLUMNS: [&str; 2] = [COL_O3_TARGET, COL_NO2_TARGET];
pub const DEFAULT_ROLLING_COLUMNS: [&str; 4] =
    [COL_O3_TARGET, COL_NO2_TARGET, COL_O3_FORECAST, COL_NO2_FORECAST];

/// File names
pub const SITE_FILE_PATTERN: &str = "site_{i}_train_data.csv";
pub const DEFAULT_REFERENCE_FILE: &str = "era5_station_timeseries.csv";
pub const DEFAULT_MERGED_FILE: &str = "era5_station_timeseries_with_blh-forecast.csv";
pub const DEFAULT_ENGINEERED_FILE: &str = "train_dataset_engineered-blh.csv";

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
