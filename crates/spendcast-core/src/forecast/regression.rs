//! Feature scaling and single-feature least squares
//!
//! Income is standardised before fitting so the coefficients stay well
//! conditioned for incomes in the millions. The fit is closed form:
//!
//! ```text
//! x' = (x - mean) / std
//! slope = sum((x' - mean(x')) * (y - mean(y))) / sum((x' - mean(x'))^2)
//! intercept = mean(y) - slope * mean(x')
//! ```

use serde::{Deserialize, Serialize};

use super::aggregate::TrainingSample;
use crate::error::{Error, Result};

/// Standardises a single feature to zero mean and unit variance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: f64,
    /// Population standard deviation, replaced by 1 when the feature is constant
    pub std: f64,
}

impl FeatureScaler {
    /// Fit mean and (guarded) standard deviation; `None` for empty input
    pub fn fit(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        let std = variance.sqrt();

        let std = if std <= f64::EPSILON * mean.abs().max(1.0) || !std.is_finite() {
            1.0
        } else {
            std
        };

        Some(Self { mean, std })
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }
}

/// Ordinary least squares line for one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    /// Fit `y = slope * x + intercept`; `None` when inputs are empty or mismatched
    ///
    /// A constant feature gives slope 0 and the mean of `ys` as intercept.
    pub fn fit(xs: &[f64], ys: &[f64]) -> Option<Self> {
        if xs.len() != ys.len() {
            return None;
        }
        let x_mean = mean(xs)?;
        let y_mean = mean(ys)?;

        let (sxy, sxx) = xs
            .iter()
            .zip(ys)
            .fold((0.0, 0.0), |(sxy, sxx), (x, y)| {
                let dx = x - x_mean;
                (sxy + dx * (y - y_mean), sxx + dx * dx)
            });

        let slope = if sxx <= f64::EPSILON { 0.0 } else { sxy / sxx };

        Some(Self {
            slope,
            intercept: y_mean - slope * x_mean,
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Persisted form of a user's trained predictor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub slope: f64,
    pub intercept: f64,
    pub mean: f64,
    pub std: f64,
}

impl ModelArtifact {
    /// Fit scaler and regression on monthly samples
    pub fn fit(samples: &[TrainingSample]) -> Result<Self> {
        let incomes: Vec<f64> = samples.iter().map(|s| s.income).collect();
        let expenses: Vec<f64> = samples.iter().map(|s| s.expense).collect();

        let scaler = FeatureScaler::fit(&incomes)
            .ok_or_else(|| Error::InsufficientData("No training samples".into()))?;
        let scaled: Vec<f64> = incomes.iter().map(|&x| scaler.transform(x)).collect();
        let line = LinearFit::fit(&scaled, &expenses)
            .ok_or_else(|| Error::InsufficientData("No training samples".into()))?;

        let artifact = Self {
            slope: line.slope,
            intercept: line.intercept,
            mean: scaler.mean,
            std: scaler.std,
        };

        if !artifact.is_finite() {
            return Err(Error::InvalidData(
                "Training produced non-finite model parameters".into(),
            ));
        }

        Ok(artifact)
    }

    pub fn scaler(&self) -> FeatureScaler {
        FeatureScaler {
            mean: self.mean,
            std: self.std,
        }
    }

    pub fn line(&self) -> LinearFit {
        LinearFit {
            slope: self.slope,
            intercept: self.intercept,
        }
    }

    /// Predicted total expense for an income (unclamped)
    pub fn predict(&self, income: f64) -> f64 {
        self.line().predict(self.scaler().transform(income))
    }

    pub fn is_finite(&self) -> bool {
        self.slope.is_finite()
            && self.intercept.is_finite()
            && self.mean.is_finite()
            && self.std.is_finite()
            && self.std != 0.0
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::aggregate::MonthKey;

    fn samples(pairs: &[(f64, f64)]) -> Vec<TrainingSample> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, &(income, expense))| TrainingSample {
                month: MonthKey {
                    year: 2024,
                    month: i as u32 + 1,
                },
                income,
                expense,
            })
            .collect()
    }

    #[test]
    fn test_scaler_standardises() {
        let scaler = FeatureScaler::fit(&[2.0, 4.0, 6.0]).unwrap();
        assert_eq!(scaler.mean, 4.0);
        assert!((scaler.std - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert_eq!(scaler.transform(4.0), 0.0);
    }

    #[test]
    fn test_scaler_zero_variance_uses_unit_scale() {
        let scaler = FeatureScaler::fit(&[2_000_000.0; 3]).unwrap();
        assert_eq!(scaler.std, 1.0);
        assert_eq!(scaler.transform(2_000_000.0), 0.0);
        assert!(FeatureScaler::fit(&[]).is_none());
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let fit = LinearFit::fit(&[1.0, 2.0, 3.0], &[3.0, 5.0, 7.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!(LinearFit::fit(&[1.0], &[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_artifact_interpolates_between_samples() {
        let artifact = ModelArtifact::fit(&samples(&[
            (2_000_000.0, 1_200_000.0),
            (2_500_000.0, 1_400_000.0),
            (3_000_000.0, 1_600_000.0),
        ]))
        .unwrap();

        let predicted = artifact.predict(2_750_000.0);
        assert!(predicted > 1_400_000.0 && predicted < 1_600_000.0);
        assert!((predicted - 1_500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_artifact_constant_income_predicts_mean_expense() {
        let artifact = ModelArtifact::fit(&samples(&[
            (2_000_000.0, 900_000.0),
            (2_000_000.0, 1_200_000.0),
            (2_000_000.0, 1_500_000.0),
        ]))
        .unwrap();

        assert_eq!(artifact.std, 1.0);
        assert_eq!(artifact.slope, 0.0);
        assert!((artifact.predict(2_000_000.0) - 1_200_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_artifact_prediction_unclamped() {
        let artifact = ModelArtifact::fit(&samples(&[
            (1_000_000.0, 100_000.0),
            (2_000_000.0, 900_000.0),
            (3_000_000.0, 1_700_000.0),
        ]))
        .unwrap();

        // Fitted line crosses zero at 875,000
        assert!(artifact.predict(0.0) < 0.0);
    }

    #[test]
    fn test_artifact_fit_is_deterministic() {
        let data = samples(&[(10.0, 3.0), (12.0, 4.5), (15.0, 4.0), (20.0, 9.0)]);
        assert_eq!(
            ModelArtifact::fit(&data).unwrap(),
            ModelArtifact::fit(&data).unwrap()
        );
    }

    #[test]
    fn test_artifact_fit_empty() {
        assert!(matches!(
            ModelArtifact::fit(&[]),
            Err(Error::InsufficientData(_))
        ));
    }
}
