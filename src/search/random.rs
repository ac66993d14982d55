//! Randomized hyperparameter search with cross-validated scoring
//!
//! Configurations are sampled up front from a seeded RNG, then the
//! (trial, fold) work items are evaluated by a rayon worker pool. A trial
//! whose fold evaluation fails is recorded as a failed trial and excluded
//! from the best-score comparison; it never aborts the search.

use crate::error::{PhenoError, Result};
use crate::search::cv::{CvFold, KFold};
use crate::search::space::{SearchSpace, TrialParams};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Search budget and fold count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of sampled configurations
    pub n_trials: usize,
    /// Folds for cross-validated scoring
    pub cv_folds: usize,
    /// Random seed for sampling and fold assignment
    pub seed: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            n_trials: 200,
            cv_folds: 4,
            seed: 42,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_trials(mut self, n: usize) -> Self {
        self.n_trials = n;
        self
    }

    pub fn with_cv_folds(mut self, k: usize) -> Self {
        self.cv_folds = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Outcome of a single trial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrialScore {
    /// Negated mean fold RMSE; higher is better.
    Scored(f64),
    /// The trial could not be evaluated; carries the first fold error.
    Failed(String),
}

/// One sampled configuration and its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub trial_id: usize,
    pub params: TrialParams,
    pub score: TrialScore,
}

/// All trials plus the index of the best-scoring one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub trials: Vec<TrialRecord>,
    pub best_idx: usize,
}

impl SearchOutcome {
    pub fn best_trial(&self) -> &TrialRecord {
        &self.trials[self.best_idx]
    }

    pub fn best_params(&self) -> &TrialParams {
        &self.best_trial().params
    }

    /// Negated RMSE of the best trial.
    pub fn best_score(&self) -> f64 {
        match self.best_trial().score {
            TrialScore::Scored(v) => v,
            TrialScore::Failed(_) => f64::NEG_INFINITY,
        }
    }

    pub fn n_failed(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| matches!(t.score, TrialScore::Failed(_)))
            .count()
    }
}

/// Randomized search over a declarative space.
#[derive(Debug, Clone)]
pub struct RandomizedSearch {
    config: SearchConfig,
    space: SearchSpace,
}

impl RandomizedSearch {
    pub fn new(config: SearchConfig, space: SearchSpace) -> Self {
        Self { config, space }
    }

    /// Run the search. `fold_objective` fits one configuration on a
    /// fold's training rows and returns its validation RMSE; it must
    /// refit preprocessing inside the fold.
    pub fn run<F>(&self, n_samples: usize, fold_objective: F) -> Result<SearchOutcome>
    where
        F: Fn(&TrialParams, &CvFold) -> Result<f64> + Sync,
    {
        if self.config.n_trials == 0 {
            return Err(PhenoError::SearchError(
                "n_trials must be at least 1".to_string(),
            ));
        }
        if self.space.is_empty() {
            return Err(PhenoError::SearchError("search space is empty".to_string()));
        }

        let folds = KFold::new(self.config.cv_folds, self.config.seed).split(n_samples)?;

        // Sample sequentially so the configuration sequence depends only
        // on the seed, then evaluate in parallel.
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
        let configs: Vec<TrialParams> = (0..self.config.n_trials)
            .map(|_| self.space.sample(&mut rng))
            .collect();

        let work: Vec<(usize, usize)> = (0..configs.len())
            .flat_map(|t| (0..folds.len()).map(move |f| (t, f)))
            .collect();

        let fold_scores: Vec<(usize, usize, std::result::Result<f64, String>)> = work
            .into_par_iter()
            .map(|(t, f)| {
                let outcome = fold_objective(&configs[t], &folds[f]).map_err(|e| e.to_string());
                (t, f, outcome)
            })
            .collect();

        let mut rmse_sums = vec![0.0f64; configs.len()];
        let mut failures: Vec<Option<(usize, String)>> = vec![None; configs.len()];
        for (t, f, outcome) in fold_scores {
            match outcome {
                Ok(rmse) => rmse_sums[t] += rmse,
                Err(msg) => {
                    let slot = &mut failures[t];
                    if slot.as_ref().map_or(true, |(prev_f, _)| f < *prev_f) {
                        *slot = Some((f, msg));
                    }
                }
            }
        }

        let n_folds = folds.len() as f64;
        let trials: Vec<TrialRecord> = configs
            .into_iter()
            .enumerate()
            .map(|(trial_id, params)| {
                let score = match failures[trial_id].take() {
                    Some((_, msg)) => TrialScore::Failed(msg),
                    None => TrialScore::Scored(-(rmse_sums[trial_id] / n_folds)),
                };
                TrialRecord {
                    trial_id,
                    params,
                    score,
                }
            })
            .collect();

        // Best = highest neg-RMSE; ties resolve to the earliest trial.
        let mut best_idx: Option<usize> = None;
        for trial in &trials {
            if let TrialScore::Scored(value) = trial.score {
                let better = match best_idx {
                    None => true,
                    Some(i) => match trials[i].score {
                        TrialScore::Scored(best) => value > best,
                        TrialScore::Failed(_) => true,
                    },
                };
                if better {
                    best_idx = Some(trial.trial_id);
                }
            }
            debug!(trial = trial.trial_id, score = ?trial.score, "trial evaluated");
        }

        match best_idx {
            Some(best_idx) => Ok(SearchOutcome { trials, best_idx }),
            None => Err(PhenoError::SearchError(format!(
                "all {} trials failed to fit",
                self.config.n_trials
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::space::ParamValue;

    fn space() -> SearchSpace {
        SearchSpace::new()
            .float("learning_rate", 0.0, 1.0)
            .int("max_depth", 1, 10)
    }

    fn config() -> SearchConfig {
        SearchConfig::new().with_n_trials(30).with_cv_folds(3).with_seed(42)
    }

    #[test]
    fn test_best_trial_minimizes_rmse() {
        let search = RandomizedSearch::new(config(), space());
        // RMSE is distance from learning_rate to 0.3; best sampled value
        // should land closest to it.
        let outcome = search
            .run(30, |params, _fold| {
                let lr = params["learning_rate"].as_float().unwrap();
                Ok((lr - 0.3).abs())
            })
            .unwrap();

        let best_lr = outcome.best_params()["learning_rate"].as_float().unwrap();
        for trial in &outcome.trials {
            if let TrialScore::Scored(score) = trial.score {
                assert!(score <= outcome.best_score() + 1e-12);
            }
            let lr = trial.params["learning_rate"].as_float().unwrap();
            assert!((best_lr - 0.3).abs() <= (lr - 0.3).abs() + 1e-12);
        }
    }

    #[test]
    fn test_failed_trials_are_excluded_not_fatal() {
        let search = RandomizedSearch::new(config(), space());
        let outcome = search
            .run(30, |params, _fold| {
                let depth = params["max_depth"].as_int().unwrap();
                if depth % 2 == 0 {
                    return Err(PhenoError::TrainingError("resource exhausted".to_string()));
                }
                Ok(depth as f64)
            })
            .unwrap();

        assert!(outcome.n_failed() > 0);
        let best_depth = outcome.best_params()["max_depth"].as_int().unwrap();
        assert_eq!(best_depth % 2, 1, "best must come from scored trials");
        assert!(matches!(
            outcome.best_trial().score,
            TrialScore::Scored(_)
        ));
    }

    #[test]
    fn test_all_failures_is_an_error() {
        let search = RandomizedSearch::new(config(), space());
        let err = search
            .run(30, |_params, _fold| {
                Err::<f64, _>(PhenoError::TrainingError("always fails".to_string()))
            })
            .unwrap_err();
        assert!(matches!(err, PhenoError::SearchError(_)));
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let objective = |params: &TrialParams, _fold: &CvFold| {
            let lr = params["learning_rate"].as_float().unwrap();
            Ok((lr - 0.5).abs())
        };
        let a = RandomizedSearch::new(config(), space()).run(30, objective).unwrap();
        let b = RandomizedSearch::new(config(), space()).run(30, objective).unwrap();

        assert_eq!(a.best_idx, b.best_idx);
        assert_eq!(a.best_params(), b.best_params());
        for (ta, tb) in a.trials.iter().zip(b.trials.iter()) {
            assert_eq!(ta.params, tb.params);
        }
    }

    #[test]
    fn test_score_is_negated_mean_rmse() {
        let search = RandomizedSearch::new(
            SearchConfig::new().with_n_trials(1).with_cv_folds(3).with_seed(1),
            space(),
        );
        let outcome = search.run(12, |_params, fold| Ok(fold.fold_idx as f64)).unwrap();
        // folds 0, 1, 2 → mean 1.0 → score -1.0
        assert!((outcome.best_score() - (-1.0)).abs() < 1e-12);
        assert!(matches!(
            outcome.best_params().get("learning_rate"),
            Some(ParamValue::Float(_))
        ));
    }
}
