//! Standard (z-score) feature scaling

use crate::error::{PhenoError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Standard scaler: (x - mean) / std per column. Constant columns keep a
/// scale of 1 so transformed values stay finite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(PhenoError::DataError(
                "cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let n = x.nrows() as f64;
        self.means = x
            .columns()
            .into_iter()
            .map(|col| col.sum() / n)
            .collect();
        self.scales = x
            .columns()
            .into_iter()
            .zip(self.means.iter())
            .map(|(col, mean)| {
                let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                if std == 0.0 {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PhenoError::ModelNotFitted);
        }
        if x.ncols() != self.means.len() {
            return Err(PhenoError::ShapeError {
                expected: format!("{} columns", self.means.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (j, (mean, scale)) in self.means.iter().zip(self.scales.iter()).enumerate() {
            for v in out.column_mut(j) {
                *v = (*v - mean) / scale;
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}
