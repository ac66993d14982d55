//! Additive feature attribution

pub mod permutation;

pub use permutation::PermutationExplainer;

use ndarray::{Array1, Array2};

/// Per-row signed feature contributions for an explained set.
///
/// For every row, `baseline + values.row(i).sum()` reproduces the model's
/// raw prediction up to floating-point tolerance.
#[derive(Debug, Clone)]
pub struct AttributionMatrix {
    /// Original row indices of the explained observations.
    pub row_ids: Vec<usize>,
    /// Original (machine-readable) predictor identifiers.
    pub feature_names: Vec<String>,
    /// Expected prediction over the explained background.
    pub baseline: f64,
    /// One row per explained observation, one column per predictor.
    pub values: Array2<f64>,
    /// Raw model predictions for the explained rows.
    pub predictions: Array1<f64>,
}

impl AttributionMatrix {
    /// Mean absolute attribution per feature, the global importance score.
    pub fn mean_abs_attribution(&self) -> Vec<f64> {
        let n = self.values.nrows().max(1) as f64;
        self.values
            .columns()
            .into_iter()
            .map(|col| col.iter().map(|v| v.abs()).sum::<f64>() / n)
            .collect()
    }

    /// Feature indices ranked by global importance, descending.
    pub fn importance_ranking(&self) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> =
            self.mean_abs_attribution().into_iter().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        ranked
    }

    /// Largest additivity violation across rows; diagnostic only.
    pub fn max_additivity_gap(&self) -> f64 {
        self.values
            .rows()
            .into_iter()
            .zip(self.predictions.iter())
            .map(|(row, pred)| (self.baseline + row.sum() - pred).abs())
            .fold(0.0, f64::max)
    }
}
