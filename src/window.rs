use chrono::{DurationRound, TimeDelta};
use itertools::Itertools;
use log::debug;

use crate::params::Parameters;
use crate::sample::{ProcessedSample, RawSample};
use crate::{Error, Result};

/// Windowing unit that keeps analysis periods comparable across tests of
/// different total duration.
pub const PERIODIC_LIMIT_HOURS: f64 = 24.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Bucket the raw series onto a 1-minute grid and mark the analysis window.
///
/// Backfills the `start_time`/`end_time` defaults from the data range and
/// returns the updated parameters alongside the series, so downstream
/// consumers can echo the effective window. Every bucket carries an
/// elapsed time relative to the effective start, negative for buckets
/// recorded before the window opens.
///
/// # Errors
/// Returns [`Error::InsufficientData`] for an empty input and
/// [`Error::InsufficientWindow`] when periodic mode is active and the
/// series does not span more than one full period.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn resample_and_window(
    samples: &[RawSample],
    mut parameters: Parameters,
) -> Result<(Vec<ProcessedSample>, Parameters)> {
    let minute = TimeDelta::minutes(1);

    let first = samples.first().ok_or(Error::InsufficientData { found: 0 })?;
    let last = samples.last().ok_or(Error::InsufficientData { found: 0 })?;

    let start_time = match parameters.start_time {
        Some(requested) if requested >= first.timestamp => requested,
        _ => first.timestamp.duration_round(minute)?,
    };
    let end_time = match parameters.end_time {
        Some(requested) if requested <= last.timestamp => requested,
        _ => last.timestamp.duration_round(minute)?,
    };
    parameters.start_time = Some(start_time);
    parameters.end_time = Some(end_time);

    let mut keyed = Vec::with_capacity(samples.len());
    for sample in samples {
        keyed.push((sample.timestamp.duration_trunc(minute)?, sample));
    }

    let mut processed = Vec::new();
    let buckets = keyed.into_iter().group_by(|(bucket, _)| *bucket);
    for (bucket_time, bucket) in &buckets {
        let mut count = 0_usize;
        let mut pressure = 0.0;
        let mut temperature = 0.0;
        for (_, sample) in bucket {
            count += 1;
            pressure += sample.pressure;
            temperature += sample.temperature;
        }
        let count = count as f64;
        let elapsed_hours =
            (bucket_time - start_time).num_seconds() as f64 / SECONDS_PER_HOUR;

        processed.push(ProcessedSample {
            bucket_time,
            elapsed_hours,
            pressure: pressure / count,
            temperature: temperature / count,
            pressure_over_temperature: 0.0,
            density: None,
            mass: None,
            trend_pt: None,
            trend_mass: None,
            included: false,
            period_index: 0,
        });
    }

    let span_hours = processed.last().map_or(0.0, |s| s.elapsed_hours);

    // In periodic mode only whole periods are analysed; the trailing
    // partial period is dropped so runs of differing upload lengths stay
    // comparable.
    let periodic_cutoff = if parameters.periodic_limit_off {
        None
    } else if span_hours > PERIODIC_LIMIT_HOURS {
        Some((span_hours / PERIODIC_LIMIT_HOURS).floor() * PERIODIC_LIMIT_HOURS)
    } else {
        return Err(Error::InsufficientWindow {
            span_hours,
            limit_hours: PERIODIC_LIMIT_HOURS,
        });
    };

    for sample in &mut processed {
        sample.included = match periodic_cutoff {
            Some(cutoff) => sample.elapsed_hours >= 0.0 && sample.elapsed_hours <= cutoff,
            None => sample.elapsed_hours >= 0.0 && sample.bucket_time <= end_time,
        };
        if sample.included {
            sample.period_index = ((sample.elapsed_hours - PERIODIC_LIMIT_HOURS)
                / PERIODIC_LIMIT_HOURS)
                .floor() as i64
                + 2;
        }
    }

    debug!(
        "resampled {} readings into {} buckets spanning {:.1} h",
        samples.len(),
        processed.len(),
        span_hours
    );

    Ok((processed, parameters))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    use super::{resample_and_window, PERIODIC_LIMIT_HOURS};
    use crate::params::{Gas, Parameters};
    use crate::sample::RawSample;
    use crate::units::{PressureUnit, TemperatureUnit, VolumeUnit};
    use crate::Error;

    fn origin() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 5, 2)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn parameters() -> Parameters {
        Parameters {
            unit_pressure: PressureUnit::Bara,
            unit_temperature: TemperatureUnit::Celsius,
            unit_volume: VolumeUnit::Liter,
            medium: Gas("CO2".to_owned()),
            volume: 150.0,
            start_time: None,
            end_time: None,
            periodic_limit_off: false,
        }
    }

    fn minute_series(minutes: i64) -> Vec<RawSample> {
        (0..=minutes)
            .map(|m| RawSample {
                timestamp: origin() + TimeDelta::minutes(m),
                pressure: 10.0 - 1e-5 * m as f64,
                temperature: 20.0,
            })
            .collect()
    }

    #[test]
    fn elapsed_time_is_non_decreasing() {
        let (processed, _) = resample_and_window(&minute_series(48 * 60), parameters()).unwrap();
        for pair in processed.windows(2) {
            assert!(pair[0].elapsed_hours <= pair[1].elapsed_hours);
        }
    }

    #[test]
    fn resampling_an_already_bucketed_series_is_idempotent() {
        let (first_pass, _) = resample_and_window(&minute_series(48 * 60), parameters()).unwrap();

        let rebucketed: Vec<RawSample> = first_pass
            .iter()
            .map(|s| RawSample {
                timestamp: s.bucket_time,
                pressure: s.pressure,
                temperature: s.temperature,
            })
            .collect();
        let (second_pass, _) = resample_and_window(&rebucketed, parameters()).unwrap();

        assert_eq!(first_pass.len(), second_pass.len());
        for (a, b) in first_pass.iter().zip(&second_pass) {
            assert_eq!(a.bucket_time, b.bucket_time);
            approx::assert_relative_eq!(a.pressure, b.pressure);
            approx::assert_relative_eq!(a.temperature, b.temperature);
        }
    }

    #[test]
    fn same_minute_readings_are_averaged_into_one_bucket() {
        let samples: Vec<RawSample> = (0..5)
            .map(|s| RawSample {
                timestamp: origin() + TimeDelta::seconds(s),
                pressure: f64::from(s as i32),
                temperature: 20.0,
            })
            .collect();

        let mut explicit = parameters();
        explicit.periodic_limit_off = true;
        let (processed, _) = resample_and_window(&samples, explicit).unwrap();

        assert_eq!(processed.len(), 1);
        approx::assert_relative_eq!(processed[0].pressure, 2.0);
    }

    #[test]
    fn span_not_exceeding_the_periodic_limit_fails() {
        let exactly_24h = minute_series(24 * 60);
        let result = resample_and_window(&exactly_24h, parameters());
        assert!(matches!(result, Err(Error::InsufficientWindow { .. })));
    }

    #[test]
    fn trailing_partial_period_is_dropped() {
        // 49.5 hours of data; only the first two whole periods are analysed.
        let (processed, _) =
            resample_and_window(&minute_series(49 * 60 + 30), parameters()).unwrap();

        let last_included = processed
            .iter()
            .rev()
            .find(|s| s.included)
            .expect("window is non-empty");
        approx::assert_relative_eq!(last_included.elapsed_hours, 2.0 * PERIODIC_LIMIT_HOURS);
        assert!(processed.iter().any(|s| !s.included));
    }

    #[test]
    fn whole_period_boundary_is_kept() {
        let (processed, _) = resample_and_window(&minute_series(48 * 60), parameters()).unwrap();
        assert!(processed.iter().all(|s| s.included));
    }

    #[test]
    fn excluded_samples_carry_period_index_zero() {
        let mut late_start = parameters();
        late_start.periodic_limit_off = true;
        late_start.start_time = Some(origin() + TimeDelta::hours(1));
        late_start.end_time = Some(origin() + TimeDelta::hours(3));

        let (processed, _) = resample_and_window(&minute_series(4 * 60), late_start).unwrap();

        for sample in &processed {
            if !sample.included {
                assert_eq!(sample.period_index, 0);
            }
        }
        // Samples before the requested start exist with negative elapsed time.
        assert!(processed.iter().any(|s| s.elapsed_hours < 0.0));
        assert!(processed.iter().any(|s| !s.included));
    }

    #[test]
    fn period_index_matches_the_reporting_formula() {
        let (processed, _) = resample_and_window(&minute_series(49 * 60), parameters()).unwrap();
        for sample in processed.iter().filter(|s| s.included) {
            let expected = ((sample.elapsed_hours - PERIODIC_LIMIT_HOURS) / PERIODIC_LIMIT_HOURS)
                .floor() as i64
                + 2;
            assert_eq!(sample.period_index, expected);
        }
        // First period is index 1, second is index 2.
        assert_eq!(processed[0].period_index, 1);
        assert_eq!(
            processed.iter().filter(|s| s.included).last().unwrap().period_index,
            3
        );
    }

    #[test]
    fn effective_window_is_echoed_back() {
        let (_, effective) = resample_and_window(&minute_series(48 * 60), parameters()).unwrap();
        assert_eq!(effective.start_time, Some(origin()));
        assert_eq!(effective.end_time, Some(origin() + TimeDelta::hours(48)));
    }
}
