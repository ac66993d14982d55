//! Per-target modeling-and-explanation pipeline
//!
//! The four phenology targets run sequentially; each iteration owns its
//! split, search, model, metrics and attribution, and a failure in one
//! target never prevents the remaining targets from running.

use crate::data::{prepare_target, ExclusionPolicy, StratifiedSplitter};
use crate::error::{PhenoError, Result};
use crate::explain::PermutationExplainer;
use crate::metrics::{self, MetricsReport};
use crate::model::{fold_rmse, take_rows, take_values, BoostingConfig, ModelTrainer};
use crate::report::{
    write_attribution_table, write_importance_figure, write_run_summary, RunSummary,
};
use crate::search::{
    boosting_search_space, ParamValue, RandomizedSearch, SearchConfig, SearchSpace, TrialParams,
};
use polars::prelude::DataFrame;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// One of the four phenology-shift targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    pub code: &'static str,
    pub label: &'static str,
}

impl TargetSpec {
    /// The four slope metrics, in reporting order.
    pub fn all() -> [TargetSpec; 4] {
        [
            TargetSpec { code: "SOS", label: "EVI_SOS_slope" },
            TargetSpec { code: "POS", label: "EVI_POSstart_slope" },
            TargetSpec { code: "POE", label: "EVI_POSend_slope" },
            TargetSpec { code: "EOS", label: "EVI_EOS_slope" },
        ]
    }
}

/// Run-wide constants, fixed at the call site.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub seed: u64,
    pub n_trials: usize,
    pub cv_folds: usize,
    pub test_fraction: f64,
    pub n_permutations: usize,
    pub max_chart_features: usize,
    pub units: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            n_trials: 200,
            cv_folds: 4,
            test_fraction: 0.2,
            n_permutations: 16,
            max_chart_features: 15,
            units: "day yr⁻¹".to_string(),
        }
    }
}

/// Pipeline stage, named in per-target failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Split,
    Search,
    Train,
    Evaluate,
    Explain,
    Export,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Prepare => "data preparation",
            Stage::Split => "train/test split",
            Stage::Search => "hyperparameter search",
            Stage::Train => "final fit",
            Stage::Evaluate => "evaluation",
            Stage::Explain => "attribution",
            Stage::Export => "artifact export",
        };
        f.write_str(name)
    }
}

/// A per-target failure, carrying the stage that produced it.
#[derive(Debug)]
pub struct TargetFailure {
    pub stage: Stage,
    pub error: PhenoError,
}

impl std::fmt::Display for TargetFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed during {}: {}", self.stage, self.error)
    }
}

/// Everything a successful target iteration produced.
#[derive(Debug)]
pub struct TargetArtifacts {
    pub metrics: MetricsReport,
    pub best_params: TrialParams,
    /// Negated CV RMSE of the selected configuration.
    pub cv_score: f64,
    pub figure_path: PathBuf,
    pub table_path: PathBuf,
    pub summary_path: PathBuf,
}

/// Result of one target's iteration.
#[derive(Debug)]
pub struct TargetOutcome {
    pub spec: TargetSpec,
    pub result: std::result::Result<TargetArtifacts, TargetFailure>,
}

/// Sequential driver over the four targets.
pub struct Orchestrator {
    config: RunConfig,
    space: SearchSpace,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            space: boosting_search_space(),
        }
    }

    /// Replace the search space; narrower spaces keep test runs cheap.
    pub fn with_search_space(mut self, space: SearchSpace) -> Self {
        self.space = space;
        self
    }

    /// Run all four targets against a cleaned table. Only output-directory
    /// creation is globally fatal; target failures are isolated and
    /// reported in the returned outcomes.
    pub fn run(&self, df: &DataFrame, out_dir: &Path) -> Result<Vec<TargetOutcome>> {
        fs::create_dir_all(out_dir).map_err(|e| {
            PhenoError::ExportError(format!("cannot create {}: {e}", out_dir.display()))
        })?;

        let targets = TargetSpec::all();
        let policy = ExclusionPolicy::new(targets.iter().map(|t| t.label));

        let mut outcomes = Vec::with_capacity(targets.len());
        for spec in targets {
            let result = self.run_target(df, &policy, spec, out_dir);
            match &result {
                Ok(artifacts) => {
                    info!("{} | {}", spec.code, artifacts.metrics);
                    info!(
                        "  best params → {}",
                        format_params(&artifacts.best_params)
                    );
                }
                Err(failure) => {
                    error!("{} {}", spec.code, failure);
                }
            }
            outcomes.push(TargetOutcome { spec, result });
        }

        Ok(outcomes)
    }

    fn run_target(
        &self,
        df: &DataFrame,
        policy: &ExclusionPolicy,
        spec: TargetSpec,
        out_dir: &Path,
    ) -> std::result::Result<TargetArtifacts, TargetFailure> {
        let fail = |stage: Stage| move |error: PhenoError| TargetFailure { stage, error };
        let cfg = &self.config;

        let table = prepare_target(df, spec.label, policy).map_err(fail(Stage::Prepare))?;

        let split = StratifiedSplitter::new(cfg.test_fraction, cfg.seed)
            .split(&table.groups)
            .map_err(fail(Stage::Split))?;
        let x_train = take_rows(&table.features, &split.train);
        let y_train = take_values(&table.labels, &split.train);
        let x_test = take_rows(&table.features, &split.test);
        let y_test = take_values(&table.labels, &split.test);

        info!(
            code = spec.code,
            n_train = split.train.len(),
            n_test = split.test.len(),
            n_features = table.feature_names.len(),
            "split ready"
        );

        let search_config = SearchConfig::new()
            .with_n_trials(cfg.n_trials)
            .with_cv_folds(cfg.cv_folds)
            .with_seed(cfg.seed);
        let search = RandomizedSearch::new(search_config, self.space.clone());
        let outcome = search
            .run(x_train.nrows(), |params, fold| {
                let config = boosting_config_from(params, cfg.seed)?;
                fold_rmse(&config, &x_train, &y_train, &fold.train, &fold.validation)
            })
            .map_err(fail(Stage::Search))?;
        if outcome.n_failed() > 0 {
            warn!(
                code = spec.code,
                n_failed = outcome.n_failed(),
                "search trials failed and were excluded"
            );
        }

        let best_config =
            boosting_config_from(outcome.best_params(), cfg.seed).map_err(fail(Stage::Search))?;
        let model = ModelTrainer::new(best_config)
            .fit(&x_train, &y_train)
            .map_err(fail(Stage::Train))?;

        let predicted = model.predict(&x_test).map_err(fail(Stage::Evaluate))?;
        let report = metrics::evaluate(&y_test, &predicted).map_err(fail(Stage::Evaluate))?;

        let x_test_scaled = model.transform(&x_test).map_err(fail(Stage::Explain))?;
        let test_row_ids: Vec<usize> = split.test.iter().map(|&p| table.row_ids[p]).collect();
        let attribution = PermutationExplainer::new(cfg.seed)
            .with_n_permutations(cfg.n_permutations)
            .explain(
                |m| model.predict_scaled(m),
                &x_test_scaled,
                &table.feature_names,
                &test_row_ids,
            )
            .map_err(fail(Stage::Explain))?;

        let figure_path = out_dir.join(format!("shap_importance_{}.svg", spec.code));
        write_importance_figure(
            &figure_path,
            spec.code,
            &attribution,
            &report,
            &cfg.units,
            cfg.max_chart_features,
        )
        .map_err(fail(Stage::Export))?;

        let table_path = out_dir.join(format!("shap_values_{}.parquet", spec.code));
        write_attribution_table(&table_path, &attribution).map_err(fail(Stage::Export))?;

        let summary_path = out_dir.join(format!("run_summary_{}.json", spec.code));
        let summary = RunSummary {
            target: spec.code.to_string(),
            label_column: spec.label.to_string(),
            n_train: split.train.len(),
            n_test: split.test.len(),
            best_params: outcome.best_params().clone(),
            cv_score: outcome.best_score(),
            metrics: report,
        };
        write_run_summary(&summary_path, &summary).map_err(fail(Stage::Export))?;

        Ok(TargetArtifacts {
            metrics: report,
            best_params: outcome.best_params().clone(),
            cv_score: outcome.best_score(),
            figure_path,
            table_path,
            summary_path,
        })
    }
}

/// Materialize one sampled configuration as a boosting config. The L2
/// leaf penalty stays at its fixed default; it is not a searched
/// dimension.
fn boosting_config_from(params: &TrialParams, seed: u64) -> Result<BoostingConfig> {
    let int = |name: &str| {
        params
            .get(name)
            .and_then(ParamValue::as_int)
            .ok_or_else(|| PhenoError::SearchError(format!("missing parameter '{name}'")))
    };
    let float = |name: &str| {
        params
            .get(name)
            .and_then(ParamValue::as_float)
            .ok_or_else(|| PhenoError::SearchError(format!("missing parameter '{name}'")))
    };

    Ok(BoostingConfig {
        n_estimators: int("n_estimators")? as usize,
        max_depth: int("max_depth")? as usize,
        learning_rate: float("learning_rate")?,
        subsample: float("subsample")?,
        colsample_bytree: float("colsample_bytree")?,
        min_child_weight: int("min_child_weight")? as f64,
        gamma: float("gamma")?,
        reg_lambda: BoostingConfig::default().reg_lambda,
        seed,
    })
}

fn format_params(params: &TrialParams) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
