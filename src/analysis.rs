use log::{debug, info};
use serde::Serialize;

use crate::eos::EquationOfState;
use crate::params::Parameters;
use crate::rates::{self, round_to};
use crate::sample::{ProcessedSample, RawSample};
use crate::trend::TrendFit;
use crate::units::KELVIN_OFFSET;
use crate::window::{resample_and_window, PERIODIC_LIMIT_HOURS};
use crate::{Error, Result};

/// The numeric outputs of one analysis run.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct AnalysisResult {
    /// Calibrated system volume in liters (1 decimal place), or `None`
    /// when the volume was supplied directly.
    pub measured_volume: Option<f64>,
    pub pt_trend: TrendFit<f64>,
    pub mass_trend: TrendFit<f64>,
    /// Ideal-gas-law comparison rate, g/yr.
    pub ideal_gas_rate: i64,
    /// Mass loss rate, g/yr.
    pub mass_rate: i64,
    /// Bubble-equivalent diameter, mm, sign marks inflow vs outflow.
    pub bubble_rate: f64,
    /// Hours of data recorded before the analysis window opened.
    pub stabilization_time: f64,
    /// Elapsed hours at the last included sample.
    pub total_test_time: f64,
    /// Whole 24-hour periods covered by the included span.
    pub periods: i64,
}

/// Everything a run produces: the working series for plotting, the
/// parameters with their backfilled window, and the numeric results.
#[derive(Clone, Debug, Serialize)]
pub struct Analysis {
    pub samples: Vec<ProcessedSample>,
    pub parameters: Parameters,
    pub result: AnalysisResult,
}

/// Run the full leak-rate pipeline over a raw sample series.
///
/// Stages: resample and window, normalize units, compute P/T, query the
/// equation of state for every row (rows without a computable density are
/// dropped from the working set), fit the P/T trend, calibrate the system
/// volume when a fill mass was supplied, derive the mass series and its
/// trend, and convert the slopes into the three leak-rate figures.
///
/// The run either completes or fails; no partial result is ever returned.
///
/// # Errors
/// See [`Error`] for the full catalogue; individual density lookup
/// failures are recovered by dropping the affected row and are not
/// errors of this function.
pub fn analyze(
    raw: &[RawSample],
    parameters: Parameters,
    provider: &impl EquationOfState,
) -> Result<Analysis> {
    parameters.validate()?;
    let (mut samples, parameters) = resample_and_window(raw, parameters)?;

    // Normalize the full series once, before any fit sees it.
    for sample in &mut samples {
        sample.pressure = parameters.unit_pressure.to_canonical(sample.pressure);
        sample.temperature = parameters.unit_temperature.to_canonical(sample.temperature);
        sample.pressure_over_temperature = sample.pressure / (sample.temperature + KELVIN_OFFSET);
    }

    let medium = parameters.medium.canonical();
    for sample in &mut samples {
        sample.density = provider
            .density(
                sample.temperature + KELVIN_OFFSET,
                sample.pressure * 1e5,
                medium,
            )
            .ok();
    }

    // Rows the provider cannot describe are removed from the working set
    // entirely, not merely excluded from fits.
    let before = samples.len();
    samples.retain(|s| {
        s.density.is_some() && s.pressure.is_finite() && s.temperature.is_finite()
    });
    if samples.len() < before {
        debug!(
            "dropped {} of {} buckets without a computable density",
            before - samples.len(),
            before
        );
    }
    if samples.is_empty() {
        return Err(Error::EmptyAnalysis);
    }

    let pt_trend = fit_included(&samples, |s| Some(s.pressure_over_temperature))?;
    for sample in &mut samples {
        sample.trend_pt = Some(pt_trend.predict(sample.elapsed_hours));
    }

    let (volume_m3, measured_volume) = if parameters.is_mass() {
        let mass_kg = parameters.unit_volume.to_canonical(parameters.volume);
        let volume = calibrate_volume(&samples, &pt_trend, mass_kg, medium, provider)?;
        info!("calibrated system volume: {:.1} l", volume * 1000.0);
        (volume, Some(round_to(volume * 1000.0, 1)))
    } else {
        (parameters.unit_volume.to_canonical(parameters.volume), None)
    };

    for sample in &mut samples {
        sample.mass = sample.density.map(|density| density * volume_m3);
    }
    let mass_trend = fit_included(&samples, |s| s.mass)?;
    for sample in &mut samples {
        sample.trend_mass = Some(mass_trend.predict(sample.elapsed_hours));
    }

    let mean_density = included_mean_density(&samples)?;
    let last_included_elapsed = samples
        .iter()
        .rev()
        .find(|s| s.included)
        .map(|s| s.elapsed_hours)
        .ok_or(Error::InsufficientData { found: 0 })?;

    #[allow(clippy::cast_possible_truncation)]
    let periods = (last_included_elapsed / PERIODIC_LIMIT_HOURS).floor() as i64;

    let result = AnalysisResult {
        measured_volume,
        pt_trend,
        mass_trend,
        ideal_gas_rate: rates::ideal_gas_rate(pt_trend.slope, volume_m3),
        mass_rate: rates::mass_rate(mass_trend.slope),
        bubble_rate: rates::bubble_rate(mass_trend.slope, mean_density),
        stabilization_time: round_to(-samples[0].elapsed_hours, 1),
        total_test_time: round_to(last_included_elapsed, 1),
        periods,
    };

    info!(
        "analysis complete: ideal gas rate {} g/yr, mass rate {} g/yr, bubble rate {} mm",
        result.ideal_gas_rate, result.mass_rate, result.bubble_rate
    );

    Ok(Analysis {
        samples,
        parameters,
        result,
    })
}

/// Fit a quantity over elapsed time, restricted to included samples.
fn fit_included<F>(samples: &[ProcessedSample], value: F) -> Result<TrendFit<f64>>
where
    F: Fn(&ProcessedSample) -> Option<f64>,
{
    let (x, y): (Vec<f64>, Vec<f64>) = samples
        .iter()
        .filter(|s| s.included)
        .filter_map(|s| value(s).map(|v| (s.elapsed_hours, v)))
        .unzip();
    TrendFit::fit(&x, &y)
}

/// Derive the system volume from the fill mass.
///
/// The reference state is the included sample with the highest P/T ratio
/// (first one on ties, physically the start-of-window state). Density is
/// queried at the fitted trend value for that instant rather than the raw
/// measured pressure, which keeps single-sample noise out of the result.
fn calibrate_volume(
    samples: &[ProcessedSample],
    pt_trend: &TrendFit<f64>,
    mass_kg: f64,
    medium: &str,
    provider: &impl EquationOfState,
) -> Result<f64> {
    let mut reference: Option<&ProcessedSample> = None;
    for sample in samples.iter().filter(|s| s.included) {
        let better = reference.map_or(true, |best| {
            sample.pressure_over_temperature > best.pressure_over_temperature
        });
        if better {
            reference = Some(sample);
        }
    }
    let reference = reference.ok_or(Error::InsufficientData { found: 0 })?;

    let temperature_k = reference.temperature + KELVIN_OFFSET;
    let pressure_pa = pt_trend.predict(reference.elapsed_hours) * temperature_k * 1e5;
    let density = provider
        .density(temperature_k, pressure_pa, medium)
        .map_err(Error::VolumeCalibration)?;

    Ok(mass_kg / density)
}

/// Mean density over the included samples, for the bubble-rate inversion.
fn included_mean_density(samples: &[ProcessedSample]) -> Result<f64> {
    let densities: Vec<f64> = samples
        .iter()
        .filter(|s| s.included)
        .filter_map(|s| s.density)
        .collect();
    if densities.is_empty() {
        return Err(Error::EmptyAnalysis);
    }
    #[allow(clippy::cast_precision_loss)]
    Ok(densities.iter().sum::<f64>() / densities.len() as f64)
}
