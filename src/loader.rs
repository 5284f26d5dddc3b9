use std::io::Read;

use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::sample::RawSample;
use crate::{Error, Result};

/// Offset from the Excel serial-day epoch (1899-12-30) to the Unix epoch,
/// in seconds.
const EXCEL_EPOCH_OFFSET_SECONDS: f64 = 2_209_161_600.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Timestamp formats found in the supported logger exports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    /// `dd/mm/yyyy HH:MM:SS`
    #[serde(rename = "simex")]
    Simex,
    /// `yyyy/mm/dd HH:MM:SS.fff`
    #[serde(rename = "scada")]
    Scada,
    /// Seconds since the Unix epoch
    #[serde(rename = "unix")]
    Unix,
    /// Excel serial days
    #[serde(rename = "xls")]
    Xls,
    /// A user-supplied strftime pattern
    #[serde(rename = "custom")]
    Custom(String),
}

impl DateFormat {
    /// Parse one timestamp cell.
    ///
    /// # Errors
    /// Returns [`Error::DateFormat`] when the cell does not match.
    pub fn parse(&self, raw: &str) -> Result<NaiveDateTime> {
        let raw = raw.trim();
        let parsed = match self {
            Self::Simex => NaiveDateTime::parse_from_str(raw, "%d/%m/%Y %H:%M:%S").ok(),
            Self::Scada => NaiveDateTime::parse_from_str(raw, "%Y/%m/%d %H:%M:%S%.f").ok(),
            Self::Unix => raw.parse::<f64>().ok().and_then(from_epoch_seconds),
            Self::Xls => raw
                .parse::<f64>()
                .ok()
                .map(|serial_days| serial_days * SECONDS_PER_DAY - EXCEL_EPOCH_OFFSET_SECONDS)
                .and_then(from_epoch_seconds),
            Self::Custom(format) => NaiveDateTime::parse_from_str(raw, format).ok(),
        };

        parsed.ok_or_else(|| Error::DateFormat {
            format: self.name().to_owned(),
            value: raw.to_owned(),
        })
    }

    fn name(&self) -> &str {
        match self {
            Self::Simex => "SIMEX",
            Self::Scada => "SCADA",
            Self::Unix => "UNIX",
            Self::Xls => "XLS",
            Self::Custom(_) => "CUSTOM",
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_epoch_seconds(seconds: f64) -> Option<NaiveDateTime> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
}

/// Where the three relevant columns live in a log file.
///
/// Row and column numbers are 1-based, matching how logger vendors
/// document their export layouts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogLayout {
    /// First row containing data (rows above it are headers).
    pub start_row: usize,
    pub col_date: usize,
    pub col_pressure: usize,
    pub col_temperature: usize,
    pub date_format: DateFormat,
}

impl LogLayout {
    fn field<'r>(&self, record: &'r StringRecord, column: usize) -> Result<&'r str> {
        column
            .checked_sub(1)
            .and_then(|index| record.get(index))
            .ok_or(Error::ColumnOutOfRange)
    }
}

/// Read an ordered raw sample series from a CSV log.
///
/// Rows before `start_row` are skipped; the three declared columns are
/// parsed with the declared date format. The file must run forward in
/// time: a first timestamp at or after the last one is rejected.
///
/// # Errors
/// Returns the CSV, date-format, and column errors of [`Error`], plus
/// [`Error::NonMonotonicLog`] for a file that runs backwards.
pub fn read_log<R: Read>(reader: R, layout: &LogLayout) -> Result<Vec<RawSample>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (row_number, record) in csv_reader.records().enumerate() {
        let record = record?;
        if row_number + 1 < layout.start_row {
            continue;
        }

        let timestamp = layout
            .date_format
            .parse(layout.field(&record, layout.col_date)?)?;
        let pressure: f64 = layout
            .field(&record, layout.col_pressure)?
            .trim()
            .parse()
            .map_err(|_| Error::NonNumericColumn)?;
        let temperature: f64 = layout
            .field(&record, layout.col_temperature)?
            .trim()
            .parse()
            .map_err(|_| Error::NonNumericColumn)?;

        samples.push(RawSample {
            timestamp,
            pressure,
            temperature,
        });
    }

    if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
        if samples.len() > 1 && first.timestamp >= last.timestamp {
            return Err(Error::NonMonotonicLog);
        }
    }

    debug!("loaded {} readings from log", samples.len());
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::{read_log, DateFormat, LogLayout};
    use crate::Error;

    fn layout(date_format: DateFormat) -> LogLayout {
        LogLayout {
            start_row: 2,
            col_date: 1,
            col_pressure: 2,
            col_temperature: 3,
            date_format,
        }
    }

    fn expected(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 5, 2)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn simex_log_is_read() {
        let data = "date,pressure,temperature\n\
                    02/05/2023 12:00:00,0.1313,28.94\n\
                    02/05/2023 12:00:01,0.0469,28.92\n";
        let samples = read_log(data.as_bytes(), &layout(DateFormat::Simex)).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, expected(12, 0, 0));
        approx::assert_relative_eq!(samples[0].pressure, 0.1313);
        approx::assert_relative_eq!(samples[1].temperature, 28.92);
    }

    #[test]
    fn scada_log_with_fractional_seconds_is_read() {
        let data = "date,pressure,temperature\n\
                    2023/05/02 12:00:00.500,1.5,20.0\n\
                    2023/05/02 12:00:01.500,1.4,20.0\n";
        let samples = read_log(data.as_bytes(), &layout(DateFormat::Scada)).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(
            samples[0].timestamp.format("%H:%M:%S").to_string(),
            "12:00:00"
        );
    }

    #[test]
    fn unix_timestamps_are_read() {
        // 2023-05-02 12:00:00 UTC
        let data = "date,pressure,temperature\n1683028800,1.5,20.0\n1683028860,1.4,20.0\n";
        let samples = read_log(data.as_bytes(), &layout(DateFormat::Unix)).unwrap();
        assert_eq!(samples[0].timestamp, expected(12, 0, 0));
    }

    #[test]
    fn excel_serial_days_are_read() {
        // (serial * 86400) - 2209161600 == unix seconds; invert for 12:00:00.
        let serial = (1_683_028_800.0_f64 + 2_209_161_600.0) / 86_400.0;
        let data = format!("date,pressure,temperature\n{serial},1.5,20.0\n{},1.4,20.0\n", serial + 1.0 / 1440.0);
        let samples = read_log(data.as_bytes(), &layout(DateFormat::Xls)).unwrap();
        assert_eq!(samples[0].timestamp, expected(12, 0, 0));
    }

    #[test]
    fn custom_format_is_honoured() {
        let data = "date,pressure,temperature\n2023-05-02T12:00:00,1.5,20.0\n2023-05-02T12:01:00,1.4,20.0\n";
        let format = DateFormat::Custom("%Y-%m-%dT%H:%M:%S".to_owned());
        let samples = read_log(data.as_bytes(), &layout(format)).unwrap();
        assert_eq!(samples[1].timestamp, expected(12, 1, 0));
    }

    #[test]
    fn mismatched_dates_are_rejected() {
        let data = "date,pressure,temperature\nnot-a-date,1.5,20.0\n";
        let result = read_log(data.as_bytes(), &layout(DateFormat::Simex));
        assert!(matches!(result, Err(Error::DateFormat { .. })));
    }

    #[test]
    fn non_numeric_cells_are_rejected() {
        let data = "date,pressure,temperature\n02/05/2023 12:00:00,high,28.94\n";
        let result = read_log(data.as_bytes(), &layout(DateFormat::Simex));
        assert!(matches!(result, Err(Error::NonNumericColumn)));
    }

    #[test]
    fn out_of_range_columns_are_rejected() {
        let mut bad = layout(DateFormat::Simex);
        bad.col_temperature = 9;
        let data = "date,pressure,temperature\n02/05/2023 12:00:00,0.1,28.94\n";
        let result = read_log(data.as_bytes(), &bad);
        assert!(matches!(result, Err(Error::ColumnOutOfRange)));
    }

    #[test]
    fn backwards_logs_are_rejected() {
        let data = "date,pressure,temperature\n\
                    02/05/2023 12:00:01,0.1,28.94\n\
                    02/05/2023 12:00:00,0.2,28.94\n";
        let result = read_log(data.as_bytes(), &layout(DateFormat::Simex));
        assert!(matches!(result, Err(Error::NonMonotonicLog)));
    }
}
