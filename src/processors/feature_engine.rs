use crate::error::Result;
use crate::models::Frame;
use crate::processors::grouped::apply_per_site;
use crate::processors::window::{lag, trailing_mean, trailing_std};
use crate::utils::constants::*;
use chrono::{Datelike, Timelike};
use std::f64::consts::PI;
use tracing::info;

/// Physical and chemistry inputs every engineered table needs.
pub const PHYSICAL_COLUMNS: [&str; 8] = [
    COL_U_FORECAST,
    COL_V_FORECAST,
    COL_W_FORECAST,
    COL_BLH_FORECAST,
    COL_O3_FORECAST,
    COL_NO2_FORECAST,
    COL_NO2_SATELLITE,
    COL_HCHO_SATELLITE,
];

/// Tunables of the feature derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    /// Row offsets for lagged copies of `lag_columns`.
    pub lag_hours: Vec<usize>,
    /// Window lengths, in rows, for trailing statistics of `rolling_columns`.
    pub rolling_windows: Vec<usize>,
    /// Added to every ratio denominator.
    pub epsilon: f64,
    pub lag_columns: Vec<String>,
    pub rolling_columns: Vec<String>,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lag_hours: DEFAULT_LAG_HOURS.to_vec(),
            rolling_windows: DEFAULT_ROLLING_WINDOWS.to_vec(),
            epsilon: DEFAULT_EPSILON,
            lag_columns: DEFAULT_LAG_COLUMNS.iter().map(|s| s.to_string()).collect(),
            rolling_columns: DEFAULT_ROLLING_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FeatureConfig {
    /// Rows at the start of each site that cannot have every lag and window.
    pub fn warm_up_rows(&self) -> usize {
        let max_lag = self.lag_hours.iter().copied().max().unwrap_or(0);
        // trailing std needs two earlier rows
        let max_window = if self.rolling_windows.is_empty() { 0 } else { 2 };
        max_lag.max(max_window)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureReport {
    pub sites: usize,
    /// Leading rows per site that cannot have every lag and rolling value.
    pub warm_up_rows: usize,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl FeatureReport {
    pub fn dropped(&self) -> usize {
        self.rows_before - self.rows_after
    }

    pub fn summary(&self) -> String {
        format!(
            "Rows before NA drop: {} | after: {} | dropped: {} ({} sites, {} warm-up rows each)",
            self.rows_before,
            self.rows_after,
            self.dropped(),
            self.sites,
            self.warm_up_rows
        )
    }
}

/// Derives the model-ready feature set from a combined multi-site table.
pub struct FeatureEngine {
    config: FeatureConfig,
}

impl FeatureEngine {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Every column the input table must carry.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut required: Vec<&str> = PHYSICAL_COLUMNS.to_vec();
        for col in self.config.lag_columns.iter().chain(&self.config.rolling_columns) {
            if !required.contains(&col.as_str()) {
                required.push(col);
            }
        }
        required
    }

    /// Run every stage and drop rows left incomplete.
    pub fn engineer(&self, combined: &Frame, table: &str) -> Result<(Frame, FeatureReport)> {
        combined.require_columns(table, &self.required_columns())?;
        combined.ensure_unique_keys()?;

        let mut df = combined.clone();
        df.sort_by_key();

        info!("Adding time features...");
        self.add_time_features(&mut df)?;

        info!("Adding wind/BLH features...");
        self.add_wind_features(&mut df)?;

        info!("Adding ratio / chemistry features...");
        self.add_ratio_features(&mut df)?;

        info!("Adding lagged target features (by site)...");
        let df = self.add_lagged_features(&df)?;

        info!("Adding rolling statistics (by site)...");
        let mut df = self.add_rolling_features(&df)?;

        let rows_before = df.len();
        df.drop_incomplete();
        let report = FeatureReport {
            sites: combined.distinct_sites().len(),
            warm_up_rows: self.config.warm_up_rows(),
            rows_before,
            rows_after: df.len(),
        };
        info!(
            rows_before = report.rows_before,
            rows_after = report.rows_after,
            dropped = report.dropped(),
            "dropped incomplete rows"
        );

        Ok((df, report))
    }

    /// Sine/cosine encodings of hour, day-of-week and month, plus the
    /// day-of-week index (Monday = 0) and a weekend flag.
    pub fn add_time_features(&self, df: &mut Frame) -> Result<()> {
        let hours: Vec<f64> = df.datetimes().iter().map(|dt| f64::from(dt.hour())).collect();
        let dows: Vec<f64> = df
            .datetimes()
            .iter()
            .map(|dt| f64::from(dt.weekday().num_days_from_monday()))
            .collect();
        let months: Vec<f64> = df.datetimes().iter().map(|dt| f64::from(dt.month())).collect();

        let (hour_sin, hour_cos) = encode_cyclical(&hours, 24.0);
        let (dow_sin, dow_cos) = encode_cyclical(&dows, 7.0);
        let (month_sin, month_cos) = encode_cyclical(&months, 12.0);
        let is_weekend = dows.iter().map(|&d| Some(if d >= 5.0 { 1.0 } else { 0.0 })).collect();

        df.insert_column("hour_sin", hour_sin)?;
        df.insert_column("hour_cos", hour_cos)?;
        df.insert_column("dow", dows.into_iter().map(Some).collect())?;
        df.insert_column("dow_sin", dow_sin)?;
        df.insert_column("dow_cos", dow_cos)?;
        df.insert_column("month_sin", month_sin)?;
        df.insert_column("month_cos", month_cos)?;
        df.insert_column("is_weekend", is_weekend)?;
        Ok(())
    }

    pub fn add_wind_features(&self, df: &mut Frame) -> Result<()> {
        let eps = self.config.epsilon;
        let u = df.values(COL_U_FORECAST)?;
        let v = df.values(COL_V_FORECAST)?;
        let w = df.values(COL_W_FORECAST)?;
        let blh = df.values(COL_BLH_FORECAST)?;

        let wind_speed = zip_with(u, v, |u, v| u.hypot(v));
        let wind_dir = zip_with(v, u, f64::atan2);
        let blh_log = map_values(blh, f64::ln_1p);
        let w_over_blh = zip_with(w, blh, |w, b| w / (b + eps));

        df.insert_column("wind_speed", wind_speed)?;
        df.insert_column("wind_dir_rad", wind_dir)?;
        df.insert_column("blh_log", blh_log)?;
        df.insert_column("w_over_blh", w_over_blh)?;
        Ok(())
    }

    pub fn add_ratio_features(&self, df: &mut Frame) -> Result<()> {
        let eps = self.config.epsilon;
        let o3 = df.values(COL_O3_FORECAST)?;
        let no2 = df.values(COL_NO2_FORECAST)?;
        let no2_sat = df.values(COL_NO2_SATELLITE)?;
        let hcho_sat = df.values(COL_HCHO_SATELLITE)?;
        let blh = df.values(COL_BLH_FORECAST)?;

        let derived = [
            ("O3_NO2_forecast_ratio", zip_with(o3, no2, |a, b| a / (b + eps))),
            ("NO2_HCHO_sat_ratio", zip_with(no2_sat, hcho_sat, |a, b| a / (b + eps))),
            ("NOx_satellite_proxy", zip_with(no2_sat, hcho_sat, |a, b| a + b)),
            ("O3_forecast_blh", zip_with(o3, blh, |a, b| a * b)),
            ("NO2_forecast_blh", zip_with(no2, blh, |a, b| a * b)),
        ];

        for (name, values) in derived {
            df.insert_column(name, values)?;
        }
        Ok(())
    }

    /// `<col>_lag_<n>h`: the value `n` rows earlier within the same site.
    pub fn add_lagged_features(&self, df: &Frame) -> Result<Frame> {
        apply_per_site(df, |mut sub| {
            for col in &self.config.lag_columns {
                let series = sub.values(col)?.to_vec();
                for &n in &self.config.lag_hours {
                    sub.insert_column(format!("{}_lag_{}h", col, n), lag(&series, n))?;
                }
            }
            Ok(sub)
        })
    }

    /// `<col>_rollmean_<w>h` / `<col>_rollstd_<w>h`: statistics of the `w`
    /// rows strictly before each row within the same site.
    pub fn add_rolling_features(&self, df: &Frame) -> Result<Frame> {
        apply_per_site(df, |mut sub| {
            for col in &self.config.rolling_columns {
                let series = sub.values(col)?.to_vec();
                for &w in &self.config.rolling_windows {
                    sub.insert_column(format!("{}_rollmean_{}h", col, w), trailing_mean(&series, w))?;
                    sub.insert_column(format!("{}_rollstd_{}h", col, w), trailing_std(&series, w))?;
                }
            }
            Ok(sub)
        })
    }
}

impl Default for FeatureEngine {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

/// Position of `value` on the unit circle for a cycle of length `period`.
pub fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

fn encode_cyclical(values: &[f64], period: f64) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    values
        .iter()
        .map(|&v| {
            let (s, c) = cyclical(v, period);
            (Some(s), Some(c))
        })
        .unzip()
}

// NaN counts as missing, as it would in the downstream tooling.
fn present(value: f64) -> Option<f64> {
    (!value.is_nan()).then_some(value)
}

fn map_values(values: &[Option<f64>], f: impl Fn(f64) -> f64) -> Vec<Option<f64>> {
    values.iter().map(|v| v.and_then(|x| present(f(x)))).collect()
}

fn zip_with(a: &[Option<f64>], b: &[Option<f64>], f: impl Fn(f64, f64) -> f64) -> Vec<Option<f64>> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => present(f(*x, *y)),
            _ => None,
        })
        .collect()
}
