//! Gradient-boosted regression ensemble

use crate::error::{PhenoError, Result};
use crate::model::tree::{grow_tree, GrowthParams, TreeNode};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Boosting hyperparameters. The seven searched dimensions plus the fixed
/// L2 leaf penalty and the seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Row subsampling fraction per tree
    pub subsample: f64,
    /// Column subsampling fraction per tree
    pub colsample_bytree: f64,
    /// Minimum hessian weight per child
    pub min_child_weight: f64,
    /// Minimum gain to accept a split
    pub gamma: f64,
    /// L2 regularization on leaf weights
    pub reg_lambda: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            min_child_weight: 1.0,
            gamma: 0.0,
            reg_lambda: 1.0,
            seed: 42,
        }
    }
}

impl BoostingConfig {
    /// Reject values the regressor cannot fit with.
    pub fn validate(&self) -> Result<()> {
        let check = |ok: bool, name: &str, value: String, reason: &str| {
            if ok {
                Ok(())
            } else {
                Err(PhenoError::InvalidParameter {
                    name: name.to_string(),
                    value,
                    reason: reason.to_string(),
                })
            }
        };

        check(
            self.n_estimators >= 1,
            "n_estimators",
            self.n_estimators.to_string(),
            "at least one boosting round is required",
        )?;
        check(
            self.max_depth >= 1,
            "max_depth",
            self.max_depth.to_string(),
            "trees must be allowed at least one split level",
        )?;
        check(
            self.learning_rate > 0.0,
            "learning_rate",
            self.learning_rate.to_string(),
            "must be positive",
        )?;
        check(
            self.subsample > 0.0 && self.subsample <= 1.0,
            "subsample",
            self.subsample.to_string(),
            "must be in (0, 1]",
        )?;
        check(
            self.colsample_bytree > 0.0 && self.colsample_bytree <= 1.0,
            "colsample_bytree",
            self.colsample_bytree.to_string(),
            "must be in (0, 1]",
        )?;
        check(
            self.min_child_weight >= 0.0,
            "min_child_weight",
            self.min_child_weight.to_string(),
            "must be non-negative",
        )?;
        check(
            self.gamma >= 0.0,
            "gamma",
            self.gamma.to_string(),
            "must be non-negative",
        )?;
        check(
            self.reg_lambda >= 0.0,
            "reg_lambda",
            self.reg_lambda.to_string(),
            "must be non-negative",
        )
    }
}

/// Gradient-boosted regressor under squared-error loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedRegressor {
    config: BoostingConfig,
    trees: Vec<TreeNode>,
    base_score: f64,
    n_features: usize,
}

impl BoostedRegressor {
    pub fn new(config: BoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            base_score: 0.0,
            n_features: 0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples == 0 || n_features == 0 {
            return Err(PhenoError::TrainingError(
                "cannot fit on an empty matrix".to_string(),
            ));
        }
        if y.len() != n_samples {
            return Err(PhenoError::ShapeError {
                expected: format!("{n_samples} labels"),
                actual: format!("{} labels", y.len()),
            });
        }

        self.n_features = n_features;
        self.base_score = y.mean().unwrap_or(0.0);
        let mut preds = Array1::from_elem(n_samples, self.base_score);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        let growth = GrowthParams {
            max_depth: self.config.max_depth,
            min_child_weight: self.config.min_child_weight,
            reg_lambda: self.config.reg_lambda,
            gamma: self.config.gamma,
        };

        self.trees.clear();
        for _ in 0..self.config.n_estimators {
            // Squared error: grad = pred - y, hess = 1.
            let grad: Array1<f64> = &preds - y;
            let hess = Array1::from_elem(n_samples, 1.0);

            let rows = subsample(&mut rng, n_samples, self.config.subsample);
            let cols = subsample(&mut rng, n_features, self.config.colsample_bytree);

            let tree = grow_tree(x, &grad, &hess, &rows, &cols, 0, &growth);

            for i in 0..n_samples {
                preds[i] += self.config.learning_rate * predict_row(&tree, x.row(i));
            }

            self.trees.push(tree);
        }

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PhenoError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(PhenoError::ShapeError {
                expected: format!("{} columns", self.n_features),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut preds = Array1::from_elem(x.nrows(), self.base_score);
        for i in 0..x.nrows() {
            let row = x.row(i);
            for tree in &self.trees {
                preds[i] += self.config.learning_rate * predict_row(tree, row);
            }
        }
        Ok(preds)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }
}

fn predict_row(tree: &TreeNode, row: ndarray::ArrayView1<f64>) -> f64 {
    match row.as_slice() {
        Some(s) => tree.predict(s),
        None => {
            let owned: Vec<f64> = row.iter().copied().collect();
            tree.predict(&owned)
        }
    }
}

fn subsample(rng: &mut Xoshiro256PlusPlus, n: usize, ratio: f64) -> Vec<usize> {
    if ratio >= 1.0 {
        return (0..n).collect();
    }
    let k = (((n as f64) * ratio).ceil() as usize).max(1);
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}
