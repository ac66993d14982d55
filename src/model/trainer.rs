//! Final model fitting
//!
//! A trained model owns its preprocessing (median imputer + standard
//! scaler, fit on the same rows as the regressor) and the boosted
//! regressor. Immutable after fitting.

use crate::error::Result;
use crate::model::boosting::{BoostedRegressor, BoostingConfig};
use crate::model::imputer::MedianImputer;
use crate::model::scaler::StandardScaler;
use ndarray::{Array1, Array2, Axis};

/// Fitted preprocessing plus regressor.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    imputer: MedianImputer,
    scaler: StandardScaler,
    regressor: BoostedRegressor,
}

impl TrainedModel {
    /// Impute and scale a raw feature matrix with the fitted parameters.
    pub fn transform(&self, x_raw: &Array2<f64>) -> Result<Array2<f64>> {
        self.scaler.transform(&self.imputer.transform(x_raw)?)
    }

    /// Predict from raw (unscaled) features.
    pub fn predict(&self, x_raw: &Array2<f64>) -> Result<Array1<f64>> {
        self.regressor.predict(&self.transform(x_raw)?)
    }

    /// Predict from already-transformed features. The attribution engine
    /// explains the regressor in this scaled representation.
    pub fn predict_scaled(&self, x_scaled: &Array2<f64>) -> Result<Array1<f64>> {
        self.regressor.predict(x_scaled)
    }

    pub fn regressor(&self) -> &BoostedRegressor {
        &self.regressor
    }
}

/// Fits preprocessing and the regressor on a full training split.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: BoostingConfig,
}

impl ModelTrainer {
    pub fn new(config: BoostingConfig) -> Self {
        Self { config }
    }

    /// Fit on the whole training split; no internal validation, no early
    /// stopping. A failure here is fatal for the target.
    pub fn fit(&self, x_train: &Array2<f64>, y_train: &Array1<f64>) -> Result<TrainedModel> {
        let mut imputer = MedianImputer::new();
        let imputed = imputer.fit_transform(x_train)?;

        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&imputed)?;

        let mut regressor = BoostedRegressor::new(self.config.clone());
        regressor.fit(&scaled, y_train)?;

        Ok(TrainedModel {
            imputer,
            scaler,
            regressor,
        })
    }
}

/// Select rows of a matrix by position.
pub fn take_rows(x: &Array2<f64>, rows: &[usize]) -> Array2<f64> {
    x.select(Axis(0), rows)
}

/// Select entries of a vector by position.
pub fn take_values(y: &Array1<f64>, rows: &[usize]) -> Array1<f64> {
    rows.iter().map(|&i| y[i]).collect()
}

/// Fit on a fold's training rows and return RMSE on its validation rows.
/// Preprocessing is refit inside the fold so no validation statistics leak
/// into training.
pub fn fold_rmse(
    config: &BoostingConfig,
    x: &Array2<f64>,
    y: &Array1<f64>,
    train_rows: &[usize],
    validation_rows: &[usize],
) -> Result<f64> {
    let trainer = ModelTrainer::new(config.clone());
    let model = trainer.fit(&take_rows(x, train_rows), &take_values(y, train_rows))?;

    let predicted = model.predict(&take_rows(x, validation_rows))?;
    let observed = take_values(y, validation_rows);

    let mse = (&predicted - &observed).mapv(|v| v * v).sum() / observed.len() as f64;
    Ok(mse.sqrt())
}
