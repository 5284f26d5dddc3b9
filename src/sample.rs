use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single logged reading, in the raw units declared by the user.
///
/// Timestamps are required to be strictly increasing upstream; readings
/// falling into the same resample bucket are averaged by the windower.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: NaiveDateTime,
    pub pressure: f64,
    pub temperature: f64,
}

/// One bucket of the resampled working series.
///
/// `included` and `period_index` are set exactly once by the windower and
/// never revised. Excluded samples stay in the series so plots can show
/// the full record, but they never enter a trend fit. Rows whose density
/// cannot be computed are removed from the series entirely, which is a
/// different thing from being excluded.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ProcessedSample {
    pub bucket_time: NaiveDateTime,
    /// Hours since the effective start time; negative before the window opens.
    pub elapsed_hours: f64,
    /// Pressure, raw units until normalization, bar absolute afterwards.
    pub pressure: f64,
    /// Temperature, raw units until normalization, °C afterwards.
    pub temperature: f64,
    /// Pressure over absolute temperature, bar/K.
    #[serde(rename = "pt")]
    pub pressure_over_temperature: f64,
    /// Density in kg/m³, when the equation of state could produce one.
    pub density: Option<f64>,
    /// Contained gas mass in kg, once the system volume is known.
    pub mass: Option<f64>,
    /// Fitted P/T trend evaluated at this bucket, for plotting continuity.
    pub trend_pt: Option<f64>,
    /// Fitted mass trend evaluated at this bucket.
    pub trend_mass: Option<f64>,
    /// Whether this bucket lies inside the analysis window.
    pub included: bool,
    /// 1-based analysis period this bucket falls in; 0 for excluded buckets.
    pub period_index: i64,
}
