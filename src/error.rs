use crate::eos::PropertyLookupError;
use crate::units::UnitKind;

/// Errors that abort an analysis run.
///
/// Per-sample density failures are not represented here: the pipeline
/// recovers from those locally by dropping the affected row. The only way
/// a [`PropertyLookupError`] surfaces is through [`Error::VolumeCalibration`],
/// when the lookup at the calibration reference point itself fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unit string outside the supported conversion tables
    #[error("{kind} unit '{unit}' not in list of available conversions")]
    UnsupportedUnit { kind: UnitKind, unit: String },

    /// Periodic mode needs more than one full period of data
    #[error(
        "the data spans {span_hours:.1} hours, less than the {limit_hours} hour periodic limit; \
         disable the limit to analyse shorter tests"
    )]
    InsufficientWindow { span_hours: f64, limit_hours: f64 },

    /// A trend fit needs at least two included samples
    #[error("a trend fit needs at least 2 included samples, found {found}")]
    InsufficientData { found: usize },

    /// No sample survived the density filter
    #[error("density is not computable for the selected data and chosen gas medium")]
    EmptyAnalysis,

    /// Density lookup failed at the volume calibration reference point
    #[error("volume calculation from the input mass did not succeed: {0}")]
    VolumeCalibration(#[source] PropertyLookupError),

    /// Parameter record rejected before the pipeline starts
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Parameter file could not be parsed
    #[error("parameter file could not be parsed: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O failure while reading a log file
    #[error("log file could not be read: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV in a log file
    #[error("log file is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A date cell did not match the declared date format
    #[error("{format} date format of file could not be parsed from '{value}'")]
    DateFormat { format: String, value: String },

    /// A pressure or temperature cell was not numeric
    #[error("the selected pressure and/or temperature column does not exclusively contain numerical data")]
    NonNumericColumn,

    /// A 1-based column index pointed past the end of a record
    #[error("column number must not exceed total available columns in data file")]
    ColumnOutOfRange,

    /// Timestamps in the log run backwards
    #[error("end time in the data file must be later than the start time")]
    NonMonotonicLog,

    /// Timestamp could not be rounded to the resampling grid
    #[error("timestamp out of range for minute rounding: {0}")]
    Time(#[from] chrono::RoundingError),
}
