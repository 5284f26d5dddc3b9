use ndarray::{Array1, LinalgScalar, ScalarOperand};
use num_traits::{Float, FromPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Coefficients of a straight line fitted over elapsed time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendFit<E> {
    pub slope: E,
    pub intercept: E,
}

impl<E: Float + FromPrimitive + LinalgScalar + ScalarOperand> TrendFit<E> {
    /// Ordinary least squares fit of `y` against `x`.
    ///
    /// Pure arithmetic over the given points; fitting the same data twice
    /// yields identical coefficients.
    ///
    /// # Errors
    /// Returns [`Error::InsufficientData`] when fewer than two points are
    /// available, or when every abscissa is identical and the slope is
    /// undetermined.
    pub fn fit(x: &[E], y: &[E]) -> Result<Self> {
        let found = x.len().min(y.len());
        if found < 2 {
            return Err(Error::InsufficientData { found });
        }

        let x = Array1::from_iter(x.iter().copied());
        let y = Array1::from_iter(y.iter().copied());
        let x_mean = x.mean().ok_or(Error::InsufficientData { found: 0 })?;
        let y_mean = y.mean().ok_or(Error::InsufficientData { found: 0 })?;

        let x_centered = &x - x_mean;
        let y_centered = &y - y_mean;
        let spread = x_centered.dot(&x_centered);
        if spread.is_zero() {
            return Err(Error::InsufficientData { found: 1 });
        }

        let slope = x_centered.dot(&y_centered) / spread;
        let intercept = y_mean - slope * x_mean;

        Ok(Self { slope, intercept })
    }

    /// Evaluate the fitted line at `x`.
    #[must_use]
    pub fn predict(&self, x: E) -> E {
        self.slope * x + self.intercept
    }
}
