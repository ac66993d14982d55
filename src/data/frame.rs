//! Per-target design matrix assembly
//!
//! Rows with a missing label are dropped; original row indices are
//! preserved so attribution output can be realigned with the source table.

use crate::data::exclusion::ExclusionPolicy;
use crate::error::{PhenoError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;

/// Feature matrix, labels and stratification groups for one target.
#[derive(Debug, Clone)]
pub struct TargetTable {
    /// Original row indices of the source table, one per kept row.
    pub row_ids: Vec<usize>,
    /// Predictors; missing cells are NaN until imputation.
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
    /// Eco-region name per kept row.
    pub groups: Vec<String>,
    pub feature_names: Vec<String>,
}

/// Assemble the design matrix for one label column.
pub fn prepare_target(
    df: &DataFrame,
    label_column: &str,
    policy: &ExclusionPolicy,
) -> Result<TargetTable> {
    let labels_full = column_as_f64(df, label_column)?;

    // Keep rows with a non-missing label; row ids are source-table positions.
    let mut row_ids = Vec::new();
    let mut kept_labels = Vec::new();
    for (i, value) in labels_full.iter().enumerate() {
        if let Some(v) = value {
            if !v.is_nan() {
                row_ids.push(i);
                kept_labels.push(*v);
            }
        }
    }

    if row_ids.is_empty() {
        return Err(PhenoError::DataError(format!(
            "label column '{label_column}' has no non-missing rows"
        )));
    }

    let labels = Array1::from_vec(kept_labels);
    let groups = group_names(df, policy.group_key(), &row_ids)?;

    let feature_names = policy.feature_columns(df);
    if feature_names.is_empty() {
        return Err(PhenoError::DataError(
            "no predictor columns remain after exclusion".to_string(),
        ));
    }

    let mut features = Array2::zeros((row_ids.len(), feature_names.len()));
    for (j, name) in feature_names.iter().enumerate() {
        let values = column_as_f64(df, name)?;
        for (r, &row) in row_ids.iter().enumerate() {
            features[[r, j]] = values[row].unwrap_or(f64::NAN);
        }
    }

    Ok(TargetTable {
        row_ids,
        features,
        labels,
        groups,
        feature_names,
    })
}

fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| PhenoError::ColumnNotFound(name.to_string()))?;
    let series = column
        .as_materialized_series()
        .cast(&DataType::Float64)
        .map_err(|_| {
            PhenoError::DataError(format!("column '{name}' is not numeric"))
        })?;
    Ok(series.f64()?.into_iter().collect())
}

fn group_names(df: &DataFrame, key: &str, row_ids: &[usize]) -> Result<Vec<String>> {
    let column = df
        .column(key)
        .map_err(|_| PhenoError::ColumnNotFound(key.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let ca = series.str()?;

    row_ids
        .iter()
        .map(|&i| {
            ca.get(i).map(str::to_string).ok_or_else(|| {
                PhenoError::DataError(format!("missing '{key}' value in row {i}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataFrame {
        df!(
            "ecoName" => &["tundra", "taiga", "tundra", "taiga"],
            "lon" => &[10.0, 11.0, 12.0, 13.0],
            "lat" => &[60.0, 61.0, 62.0, 63.0],
            "elevation" => &[Some(100.0), Some(200.0), None, Some(400.0)],
            "precip_trend" => &[0.1, 0.2, 0.3, 0.4],
            "EVI_SOS_slope" => &[Some(0.5), None, Some(0.7), Some(0.8)],
            "EVI_POSstart_slope" => &[Some(0.1), Some(0.2), Some(0.3), Some(0.4)],
            "EVI_POSend_slope" => &[Some(0.1), Some(0.2), Some(0.3), Some(0.4)],
            "EVI_EOS_slope" => &[Some(0.1), Some(0.2), Some(0.3), Some(0.4)]
        )
        .unwrap()
    }

    fn policy() -> ExclusionPolicy {
        ExclusionPolicy::new([
            "EVI_SOS_slope",
            "EVI_POSstart_slope",
            "EVI_POSend_slope",
            "EVI_EOS_slope",
        ])
    }

    #[test]
    fn test_missing_label_rows_dropped_ids_preserved() {
        let t = prepare_target(&table(), "EVI_SOS_slope", &policy()).unwrap();
        assert_eq!(t.row_ids, vec![0, 2, 3]);
        assert_eq!(t.labels.len(), 3);
        assert_eq!(t.groups, vec!["tundra", "tundra", "taiga"]);
    }

    #[test]
    fn test_feature_matrix_shape_and_missing_cells() {
        let t = prepare_target(&table(), "EVI_SOS_slope", &policy()).unwrap();
        assert_eq!(t.feature_names, vec!["elevation", "precip_trend"]);
        assert_eq!(t.features.dim(), (3, 2));
        // Row id 2 has a missing elevation.
        assert!(t.features[[1, 0]].is_nan());
        assert_eq!(t.features[[1, 1]], 0.3);
    }

    #[test]
    fn test_no_label_column_leaks_into_features() {
        let t = prepare_target(&table(), "EVI_SOS_slope", &policy()).unwrap();
        for name in &t.feature_names {
            assert!(!name.starts_with("EVI_"), "label-like column {name} leaked");
        }
    }

    #[test]
    fn test_missing_label_column_is_an_error() {
        let err = prepare_target(&table(), "nope", &policy()).unwrap_err();
        assert!(matches!(err, PhenoError::ColumnNotFound(_)));
    }

    #[test]
    fn test_all_missing_label_is_an_error() {
        let df = df!(
            "ecoName" => &["a", "b"],
            "x" => &[1.0, 2.0],
            "EVI_SOS_slope" => &[None::<f64>, None::<f64>]
        )
        .unwrap();
        let err = prepare_target(&df, "EVI_SOS_slope", &ExclusionPolicy::new(["EVI_SOS_slope"]))
            .unwrap_err();
        assert!(matches!(err, PhenoError::DataError(_)));
    }
}
