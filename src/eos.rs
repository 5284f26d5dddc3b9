/// Failure of a single density lookup.
///
/// The pipeline recovers from these locally by dropping the affected
/// sample; they only become fatal when the volume calibration reference
/// point itself cannot be evaluated.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PropertyLookupError {
    #[error("medium '{0}' is not supported by the equation of state provider")]
    UnknownMedium(String),

    #[error("state point out of range: T = {temperature_k} K, P = {pressure_pa} Pa")]
    OutOfRange { temperature_k: f64, pressure_pa: f64 },

    #[error("malformed mixture specification '{0}'")]
    MalformedMixture(String),
}

/// Density relation for a named gas medium.
///
/// The seam for plugging in a full real-gas property library; the
/// pipeline only ever asks for density at a state point. Lookups are
/// deterministic pure functions, so no retry semantics exist.
pub trait EquationOfState {
    /// Density in kg/m³ at the given state point.
    ///
    /// # Errors
    /// Returns [`PropertyLookupError`] for an unsupported medium or a
    /// state point the relation cannot describe.
    fn density(
        &self,
        temperature_k: f64,
        pressure_pa: f64,
        medium: &str,
    ) -> std::result::Result<f64, PropertyLookupError>;
}

/// Universal gas constant, J/(mol·K).
const GAS_CONSTANT: f64 = 8.3145;

/// Ideal-gas equation of state over a fixed molar-mass table.
///
/// At the near-ambient state points of a pressure decay test the
/// ideal-gas density is within a fraction of a percent of the real-gas
/// value for the supported media. Mixture strings of the form
/// `"nitrogen[0.95]&hydrogen[0.05]"` are combined by mole fraction.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdealGas;

fn molar_mass_kg(name: &str) -> Option<f64> {
    let grams_per_mol = match name.trim().to_ascii_lowercase().as_str() {
        "co2" | "carbondioxide" | "carbon dioxide" => 44.009,
        "n2" | "nitrogen" => 28.0134,
        "h2" | "hydrogen" => 2.016,
        "he" | "helium" => 4.0026,
        "air" => 28.9647,
        "o2" | "oxygen" => 31.9988,
        "ar" | "argon" => 39.948,
        "ch4" | "methane" => 16.043,
        _ => return None,
    };
    Some(grams_per_mol * 1e-3)
}

fn mixture_molar_mass_kg(medium: &str) -> std::result::Result<f64, PropertyLookupError> {
    let mut total = 0.0;
    for component in medium.split('&') {
        let (name, tail) = component
            .split_once('[')
            .ok_or_else(|| PropertyLookupError::MalformedMixture(medium.to_owned()))?;
        let fraction: f64 = tail
            .strip_suffix(']')
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| PropertyLookupError::MalformedMixture(medium.to_owned()))?;
        let molar_mass = molar_mass_kg(name)
            .ok_or_else(|| PropertyLookupError::UnknownMedium(name.trim().to_owned()))?;
        total += fraction * molar_mass;
    }
    Ok(total)
}

impl EquationOfState for IdealGas {
    fn density(
        &self,
        temperature_k: f64,
        pressure_pa: f64,
        medium: &str,
    ) -> std::result::Result<f64, PropertyLookupError> {
        if !temperature_k.is_finite()
            || !pressure_pa.is_finite()
            || temperature_k <= 0.0
            || pressure_pa <= 0.0
        {
            return Err(PropertyLookupError::OutOfRange {
                temperature_k,
                pressure_pa,
            });
        }

        let molar_mass = if medium.contains('[') {
            mixture_molar_mass_kg(medium)?
        } else {
            molar_mass_kg(medium)
                .ok_or_else(|| PropertyLookupError::UnknownMedium(medium.to_owned()))?
        };

        Ok(pressure_pa * molar_mass / (GAS_CONSTANT * temperature_k))
    }
}
