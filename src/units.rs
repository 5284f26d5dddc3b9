use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Offset between the Celsius and Kelvin scales.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Which conversion table a unit string was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitKind {
    Pressure,
    Temperature,
    VolumeOrMass,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pressure => write!(f, "pressure"),
            Self::Temperature => write!(f, "temperature"),
            Self::VolumeOrMass => write!(f, "volume/mass"),
        }
    }
}

/// Pressure units accepted on input. Canonical form is bar absolute.
///
/// ```
/// use leakrate::units::PressureUnit;
///
/// let barg = PressureUnit::Barg;
/// assert!((barg.to_canonical(0.5) - 1.5).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureUnit {
    #[serde(rename = "bara")]
    Bara,
    #[serde(rename = "barg")]
    Barg,
    #[serde(rename = "Pa")]
    Pascal,
    #[serde(rename = "kPa")]
    KiloPascal,
    #[serde(rename = "psi")]
    Psi,
}

impl PressureUnit {
    pub const ALL: [Self; 5] = [
        Self::Bara,
        Self::Barg,
        Self::Pascal,
        Self::KiloPascal,
        Self::Psi,
    ];

    const PSI_PER_BAR: f64 = 14.5038;

    /// Convert a pressure in this unit to bar absolute.
    ///
    /// The gauge-to-absolute offset is a fixed 1 bar.
    #[must_use]
    pub fn to_canonical(self, pressure: f64) -> f64 {
        match self {
            Self::Bara => pressure,
            Self::Barg => pressure + 1.0,
            Self::Pascal => pressure / 1e5,
            Self::KiloPascal => pressure / 100.0,
            Self::Psi => pressure / Self::PSI_PER_BAR,
        }
    }

    /// Convert a pressure in bar absolute back into this unit.
    #[must_use]
    pub fn from_canonical(self, bar_absolute: f64) -> f64 {
        match self {
            Self::Bara => bar_absolute,
            Self::Barg => bar_absolute - 1.0,
            Self::Pascal => bar_absolute * 1e5,
            Self::KiloPascal => bar_absolute * 100.0,
            Self::Psi => bar_absolute * Self::PSI_PER_BAR,
        }
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bara => write!(f, "bara"),
            Self::Barg => write!(f, "barg"),
            Self::Pascal => write!(f, "Pa"),
            Self::KiloPascal => write!(f, "kPa"),
            Self::Psi => write!(f, "psi"),
        }
    }
}

impl FromStr for PressureUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bara" => Ok(Self::Bara),
            "barg" => Ok(Self::Barg),
            "Pa" => Ok(Self::Pascal),
            "kPa" => Ok(Self::KiloPascal),
            "psi" => Ok(Self::Psi),
            _ => Err(Error::UnsupportedUnit {
                kind: UnitKind::Pressure,
                unit: s.to_owned(),
            }),
        }
    }
}

/// Temperature units accepted on input. Canonical form is degrees Celsius.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "K")]
    Kelvin,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    pub const ALL: [Self; 3] = [Self::Celsius, Self::Kelvin, Self::Fahrenheit];

    /// Convert a temperature in this unit to degrees Celsius.
    #[must_use]
    pub fn to_canonical(self, temperature: f64) -> f64 {
        match self {
            Self::Celsius => temperature,
            Self::Kelvin => temperature - KELVIN_OFFSET,
            Self::Fahrenheit => (temperature - 32.0) * 5.0 / 9.0,
        }
    }

    /// Convert a temperature in degrees Celsius back into this unit.
    #[must_use]
    pub fn from_canonical(self, celsius: f64) -> f64 {
        match self {
            Self::Celsius => celsius,
            Self::Kelvin => celsius + KELVIN_OFFSET,
            Self::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Celsius => write!(f, "C"),
            Self::Kelvin => write!(f, "K"),
            Self::Fahrenheit => write!(f, "F"),
        }
    }
}

impl FromStr for TemperatureUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "C" => Ok(Self::Celsius),
            "K" => Ok(Self::Kelvin),
            "F" => Ok(Self::Fahrenheit),
            _ => Err(Error::UnsupportedUnit {
                kind: UnitKind::Temperature,
                unit: s.to_owned(),
            }),
        }
    }
}

/// Units for the system volume or, when a mass unit is given, for the fill
/// mass used to calibrate the volume. Canonical forms are cubic meters and
/// kilograms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeUnit {
    #[serde(rename = "m3")]
    CubicMeter,
    #[serde(rename = "liter")]
    Liter,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "gr")]
    Gram,
}

impl VolumeUnit {
    pub const ALL: [Self; 4] = [Self::CubicMeter, Self::Liter, Self::Kilogram, Self::Gram];

    /// Whether this unit declares a fill mass rather than a known volume.
    #[must_use]
    pub const fn is_mass(self) -> bool {
        matches!(self, Self::Kilogram | Self::Gram)
    }

    /// Convert to the canonical unit (m³ for volumes, kg for masses).
    #[must_use]
    pub fn to_canonical(self, value: f64) -> f64 {
        match self {
            Self::CubicMeter | Self::Kilogram => value,
            Self::Liter | Self::Gram => value / 1000.0,
        }
    }

    /// Convert from the canonical unit back into this unit.
    #[must_use]
    pub fn from_canonical(self, value: f64) -> f64 {
        match self {
            Self::CubicMeter | Self::Kilogram => value,
            Self::Liter | Self::Gram => value * 1000.0,
        }
    }
}

impl fmt::Display for VolumeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CubicMeter => write!(f, "m3"),
            Self::Liter => write!(f, "liter"),
            Self::Kilogram => write!(f, "kg"),
            Self::Gram => write!(f, "gr"),
        }
    }
}

impl FromStr for VolumeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "m3" => Ok(Self::CubicMeter),
            "liter" => Ok(Self::Liter),
            "kg" => Ok(Self::Kilogram),
            "gr" => Ok(Self::Gram),
            _ => Err(Error::UnsupportedUnit {
                kind: UnitKind::VolumeOrMass,
                unit: s.to_owned(),
            }),
        }
    }
}
