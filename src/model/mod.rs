//! Preprocessing and gradient-boosted regression

pub mod boosting;
pub mod imputer;
pub mod scaler;
pub mod trainer;
mod tree;

pub use boosting::{BoostedRegressor, BoostingConfig};
pub use imputer::MedianImputer;
pub use scaler::StandardScaler;
pub use trainer::{fold_rmse, take_rows, take_values, ModelTrainer, TrainedModel};
