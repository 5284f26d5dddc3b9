use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::units::{PressureUnit, TemperatureUnit, VolumeUnit};
use crate::{Error, Result};

/// A gas medium as named by the user.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gas(pub String);

impl Gas {
    const FORMING_GAS: &'static str = "forming gas";
    const FORMING_GAS_MIXTURE: &'static str = "nitrogen[0.95]&hydrogen[0.05]";

    /// The name handed to the equation-of-state provider.
    ///
    /// The user-facing "forming gas" label maps to its underlying mixture
    /// composition string; every other name passes through unchanged.
    #[must_use]
    pub fn canonical(&self) -> &str {
        if self.0 == Self::FORMING_GAS {
            Self::FORMING_GAS_MIXTURE
        } else {
            &self.0
        }
    }
}

/// Typed test parameters, immutable once handed to the pipeline except
/// for backfilling the `start_time`/`end_time` defaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Parameters {
    pub unit_pressure: PressureUnit,
    pub unit_temperature: TemperatureUnit,
    pub unit_volume: VolumeUnit,
    pub medium: Gas,
    /// System volume, or fill mass when `unit_volume` is a mass unit,
    /// expressed in `unit_volume` units.
    pub volume: f64,
    /// Start of the analysis window; defaults to the first sample time.
    #[serde(default)]
    pub start_time: Option<NaiveDateTime>,
    /// End of the analysis window; defaults to the last sample time.
    #[serde(default)]
    pub end_time: Option<NaiveDateTime>,
    /// Opt out of the 24-hour periodic windowing rule.
    #[serde(default)]
    pub periodic_limit_off: bool,
}

impl Parameters {
    /// Parse a parameter record from TOML.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for malformed TOML (including unknown unit
    /// strings) and the [`Parameters::validate`] errors for bad values.
    pub fn from_toml(raw: &str) -> Result<Self> {
        let parameters: Self = toml::from_str(raw)?;
        parameters.validate()?;
        Ok(parameters)
    }

    /// Whether the user supplied a fill mass instead of a known volume.
    #[must_use]
    pub const fn is_mass(&self) -> bool {
        self.unit_volume.is_mass()
    }

    /// Check the parameter values the type system cannot.
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameters`] for a non-positive volume/mass
    /// or an analysis window that ends before it starts.
    pub fn validate(&self) -> Result<()> {
        if !(self.volume > 0.0) {
            return Err(Error::InvalidParameters(
                "volume or mass must be a positive number".to_owned(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start >= end {
                return Err(Error::InvalidParameters(
                    "end time must be later than the start time".to_owned(),
                ));
            }
        }
        Ok(())
    }
}
