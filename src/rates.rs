//! Annualized leak-rate figures derived from the fitted slopes.
//!
//! The three rates are independent estimates of the same leak, meant for
//! cross-validation rather than averaging. Sign convention throughout: a
//! decaying trend (negative slope) is a leak out of the vessel and yields
//! a positive rate.

use std::f64::consts::PI;

/// Hours in a Julian year.
const HOURS_PER_YEAR: f64 = 24.0 * 365.25;

/// Molar mass used by the ideal-gas comparison rate, g/mol.
///
/// The comparison rate always assumes a CO2-like ideal gas, independent
/// of the test medium; the medium-specific physics lives in the mass
/// rate, which goes through the real density series.
const REFERENCE_MOLAR_MASS: f64 = 44.009;

/// Universal gas constant, J/(mol·K).
const GAS_CONSTANT: f64 = 8.3145;

/// Yearly leak rate from the P/T slope via the ideal gas law, in g/yr,
/// rounded to the nearest integer.
///
/// `slope_pt` is in bar/K per hour, `volume_m3` in cubic meters.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn ideal_gas_rate(slope_pt: f64, volume_m3: f64) -> i64 {
    (-slope_pt * 1e5 * volume_m3 * REFERENCE_MOLAR_MASS * HOURS_PER_YEAR / GAS_CONSTANT).round()
        as i64
}

/// Yearly mass loss from the mass slope, in g/yr, rounded to the nearest
/// integer. `slope_mass` is in kg per hour.
#[allow(clippy::cast_possible_truncation)]
#[must_use]
pub fn mass_rate(slope_mass: f64) -> i64 {
    (-slope_mass * HOURS_PER_YEAR * 1000.0).round() as i64
}

/// The leak re-expressed as the diameter in mm of a single escaping
/// bubble per second, rounded to one decimal place.
///
/// Inverts the spherical volume carrying the per-second mass loss at the
/// mean density of the included samples. The sign of the mass slope is
/// preserved so an inflow shows up as a negative diameter.
#[must_use]
pub fn bubble_rate(slope_mass: f64, mean_density: f64) -> f64 {
    let diameter_mm = round_to(
        (slope_mass.abs() * 6.0 / 3600.0 / PI / mean_density).powf(1.0 / 3.0) * 1000.0,
        1,
    );
    -slope_mass.signum() * diameter_mm
}

/// Round to a fixed number of decimal places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}
