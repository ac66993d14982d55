//! Artifact export: importance figure, attribution table, run summary

pub mod figure;
pub mod table;

pub use figure::write_importance_figure;
pub use table::write_attribution_table;

use crate::error::Result;
use crate::metrics::MetricsReport;
use crate::search::TrialParams;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Human-readable variant of a column identifier for exported artifacts.
/// Internal computation always uses the original identifier.
pub fn display_name(raw: &str) -> String {
    raw.replace('_', " ")
}

/// Per-target run record persisted next to the plots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub target: String,
    pub label_column: String,
    pub n_train: usize,
    pub n_test: usize,
    pub best_params: TrialParams,
    /// Negated CV RMSE of the selected configuration.
    pub cv_score: f64,
    pub metrics: MetricsReport,
}

/// Write the run summary as pretty-printed JSON, overwriting any previous
/// summary for the same target.
pub fn write_run_summary(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    if let Err(e) = fs::write(path, json) {
        let _ = fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::ParamValue;

    #[test]
    fn test_display_name_replaces_underscores() {
        assert_eq!(display_name("soil_moisture_trend"), "soil moisture trend");
        assert_eq!(display_name("elevation"), "elevation");
    }

    #[test]
    fn test_run_summary_round_trips() {
        let mut params = TrialParams::new();
        params.insert("n_estimators".to_string(), ParamValue::Int(512));
        params.insert("learning_rate".to_string(), ParamValue::Float(0.02));

        let summary = RunSummary {
            target: "SOS".to_string(),
            label_column: "EVI_SOS_slope".to_string(),
            n_train: 160,
            n_test: 40,
            best_params: params,
            cv_score: -0.41,
            metrics: crate::metrics::MetricsReport {
                rmse: 0.4,
                mae: 0.3,
                r2: 0.8,
                slope: 0.95,
                intercept: 0.01,
                mbe: -0.02,
            },
        };

        let json = serde_json::to_string(&summary).unwrap();
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.target, "SOS");
        assert_eq!(back.best_params, summary.best_params);
        assert_eq!(back.metrics, summary.metrics);
    }

    #[test]
    fn test_write_run_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_summary_SOS.json");

        let summary = RunSummary {
            target: "SOS".to_string(),
            label_column: "EVI_SOS_slope".to_string(),
            n_train: 10,
            n_test: 3,
            best_params: TrialParams::new(),
            cv_score: -1.0,
            metrics: crate::metrics::MetricsReport {
                rmse: 1.0,
                mae: 1.0,
                r2: 0.0,
                slope: 0.0,
                intercept: 0.0,
                mbe: 0.0,
            },
        };

        write_run_summary(&path, &summary).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("EVI_SOS_slope"));
    }
}
