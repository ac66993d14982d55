//! Accuracy and bias metrics for held-out predictions

use crate::error::{PhenoError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Six-scalar report for one target's test split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Slope of the least-squares fit of predicted on observed; 1 means
    /// no systematic bias.
    pub slope: f64,
    /// Intercept of the same fit; 0 means no systematic bias.
    pub intercept: f64,
    /// Mean bias error: mean(predicted - observed).
    pub mbe: f64,
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "RMSE={:.4}  MAE={:.4}  R²={:.4}  Slope={:.4}  Intercept={:.4}  MBE={:.4}",
            self.rmse, self.mae, self.r2, self.slope, self.intercept, self.mbe
        )
    }
}

/// Compare predictions against held-out observations.
pub fn evaluate(observed: &Array1<f64>, predicted: &Array1<f64>) -> Result<MetricsReport> {
    if observed.len() != predicted.len() {
        return Err(PhenoError::ShapeError {
            expected: format!("{} predictions", observed.len()),
            actual: format!("{} predictions", predicted.len()),
        });
    }
    if observed.is_empty() {
        return Err(PhenoError::DataError(
            "cannot score an empty prediction set".to_string(),
        ));
    }
    if observed.iter().chain(predicted.iter()).any(|v| v.is_nan()) {
        return Err(PhenoError::DataError(
            "prediction set contains missing values".to_string(),
        ));
    }

    let n = observed.len() as f64;
    let residuals = predicted - observed;

    let mse = residuals.mapv(|v| v * v).sum() / n;
    let rmse = mse.sqrt();
    let mae = residuals.mapv(f64::abs).sum() / n;
    let mbe = residuals.sum() / n;

    let obs_mean = observed.sum() / n;
    let ss_tot = observed.mapv(|v| (v - obs_mean).powi(2)).sum();
    let ss_res = residuals.mapv(|v| v * v).sum();
    let r2 = if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    };

    let pred_mean = predicted.sum() / n;
    let cov = observed
        .iter()
        .zip(predicted.iter())
        .map(|(o, p)| (o - obs_mean) * (p - pred_mean))
        .sum::<f64>();
    let (slope, intercept) = if ss_tot == 0.0 {
        (0.0, pred_mean)
    } else {
        let slope = cov / ss_tot;
        (slope, pred_mean - slope * obs_mean)
    };

    Ok(MetricsReport {
        rmse,
        mae,
        r2,
        slope,
        intercept,
        mbe,
    })
}
