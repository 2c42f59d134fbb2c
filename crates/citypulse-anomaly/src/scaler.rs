//! Per-axis feature standardization for model input.

use crate::forest::FEATURES;
use citypulse_core::{PulseError, Result};
use serde::{Deserialize, Serialize};

/// Standard scaler over the 4-axis feature rows.
///
/// Centers and scales each column to zero mean and unit variance, matching
/// what the forest was fitted on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: [f64; FEATURES],
    std_dev: [f64; FEATURES],
    fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: [0.0; FEATURES],
            std_dev: [1.0; FEATURES],
            fitted: false,
        }
    }

    /// Fit column means and standard deviations.
    pub fn fit(&mut self, rows: &[[f64; FEATURES]]) -> Result<()> {
        if rows.len() < 2 {
            return Err(PulseError::InsufficientData {
                required: 2,
                actual: rows.len(),
            });
        }

        let n = rows.len() as f64;
        for axis in 0..FEATURES {
            let mean = rows.iter().map(|r| r[axis]).sum::<f64>() / n;
            let variance = rows.iter().map(|r| (r[axis] - mean).powi(2)).sum::<f64>() / n;
            self.mean[axis] = mean;
            // Degenerate columns pass through unscaled
            self.std_dev[axis] = if variance > 0.0 { variance.sqrt() } else { 1.0 };
        }
        self.fitted = true;
        Ok(())
    }

    /// Scale one observation. Errors on an unfitted scaler or non-finite
    /// output; the engine downgrades either case to rule-only scoring.
    pub fn transform(&self, row: [f64; FEATURES]) -> Result<[f64; FEATURES]> {
        if !self.fitted {
            return Err(PulseError::InvalidParameter {
                name: "scaler".to_string(),
                reason: "must be fitted before transform".to_string(),
            });
        }

        let mut scaled = [0.0; FEATURES];
        for axis in 0..FEATURES {
            scaled[axis] = (row[axis] - self.mean[axis]) / self.std_dev[axis];
            if !scaled[axis].is_finite() {
                return Err(PulseError::InvalidParameter {
                    name: "features".to_string(),
                    reason: format!("axis {axis} scaled to a non-finite value"),
                });
            }
        }
        Ok(scaled)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted_scaler() -> StandardScaler {
        let rows = vec![
            [50.0, 20.0, 80.0, 5.0],
            [60.0, 30.0, 90.0, 10.0],
            [70.0, 40.0, 100.0, 15.0],
        ];
        let mut scaler = StandardScaler::new();
        scaler.fit(&rows).unwrap();
        scaler
    }

    #[test]
    fn test_transform_centers_the_mean() {
        let scaler = fitted_scaler();
        let scaled = scaler.transform([60.0, 30.0, 90.0, 10.0]).unwrap();
        for value in scaled {
            assert!(value.abs() < 1e-9);
        }
    }

    #[test]
    fn test_unfitted_transform_errors() {
        let scaler = StandardScaler::new();
        assert!(scaler.transform([1.0, 2.0, 3.0, 4.0]).is_err());
    }

    #[test]
    fn test_non_finite_input_errors() {
        let scaler = fitted_scaler();
        assert!(scaler.transform([f64::NAN, 30.0, 90.0, 10.0]).is_err());
    }

    #[test]
    fn test_constant_column_passes_through() {
        let rows = vec![[1.0, 5.0, 1.0, 1.0], [2.0, 5.0, 2.0, 2.0], [3.0, 5.0, 3.0, 3.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&rows).unwrap();
        let scaled = scaler.transform([4.0, 5.0, 4.0, 4.0]).unwrap();
        // Constant temp column: centered but not divided
        assert_eq!(scaled[1], 0.0);
    }
}
