//! Median imputation for missing predictor cells

use crate::error::{PhenoError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Column-wise median imputer. Fit on training rows only; transform
/// replaces NaN cells with the fitted medians.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: Vec<f64>,
    is_fitted: bool,
}

impl MedianImputer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(PhenoError::DataError(
                "cannot fit imputer on an empty matrix".to_string(),
            ));
        }

        self.medians = x
            .columns()
            .into_iter()
            .map(|col| {
                let mut values: Vec<f64> = col.iter().copied().filter(|v| !v.is_nan()).collect();
                if values.is_empty() {
                    return 0.0;
                }
                values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    (values[mid - 1] + values[mid]) / 2.0
                } else {
                    values[mid]
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
        if x.ncols() != self.medians.len() {
            return Err(PhenoError::ShapeError {
                expected: format!("{} columns", self.medians.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut out = x.clone();
        for (j, median) in self.medians.iter().enumerate() {
            for v in out.column_mut(j) {
                if v.is_nan() {
                    *v = *median;
                }
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_median_fill() {
        let x = array![[1.0, 10.0], [f64::NAN, 20.0], [3.0, f64::NAN]];
        let mut imputer = MedianImputer::new();
        let out = imputer.fit_transform(&x).unwrap();

        assert_eq!(out[[1, 0]], 2.0); // median of [1, 3]
        assert_eq!(out[[2, 1]], 15.0); // median of [10, 20]
        assert_eq!(out[[0, 0]], 1.0);
    }

    #[test]
    fn test_transform_uses_train_medians() {
        let train = array![[1.0], [3.0], [5.0]];
        let test = array![[f64::NAN]];
        let mut imputer = MedianImputer::new();
        imputer.fit(&train).unwrap();
        let out = imputer.transform(&test).unwrap();
        assert_eq!(out[[0, 0]], 3.0);
    }

    #[test]
    fn test_unfitted_is_an_error() {
        let imputer = MedianImputer::new();
        let err = imputer.transform(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, PhenoError::ModelNotFitted));
    }
}
