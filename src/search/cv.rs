//! K-fold splitting for cross-validated trial scoring

use crate::error::{PhenoError, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// One fold's train/validation row positions.
#[derive(Debug, Clone)]
pub struct CvFold {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
    pub fold_idx: usize,
}

/// Shuffled k-fold splitter with an explicit seed.
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    seed: u64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    pub fn split(&self, n_samples: usize) -> Result<Vec<CvFold>> {
        if self.n_splits < 2 {
            return Err(PhenoError::SearchError(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if n_samples < self.n_splits {
            return Err(PhenoError::SearchError(format!(
                "n_samples ({n_samples}) must be >= n_splits ({})",
                self.n_splits
            )));
        }

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        indices.shuffle(&mut rng);

        let base = n_samples / self.n_splits;
        let remainder = n_samples % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut current = 0;
        for fold_idx in 0..self.n_splits {
            let size = if fold_idx < remainder { base + 1 } else { base };
            let validation: Vec<usize> = indices[current..current + size].to_vec();
            let train: Vec<usize> = indices[..current]
                .iter()
                .chain(indices[current + size..].iter())
                .copied()
                .collect();

            folds.push(CvFold {
                train,
                validation,
                fold_idx,
            });
            current += size;
        }

        Ok(folds)
    }
}
