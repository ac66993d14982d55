//! Predictor exclusion policy
//!
//! One named predicate over column identifiers decides which columns may
//! never enter a feature matrix: identifiers, coordinates, every label
//! column, and the seasonality-length / NDVI-derived naming patterns.
//! Computed once from the full table and reused for all four targets, so
//! no target's label can leak into another target's feature matrix.

use polars::prelude::DataFrame;

/// Columns excluded from every feature matrix.
#[derive(Debug, Clone)]
pub struct ExclusionPolicy {
    group_key: String,
    coordinates: Vec<String>,
    label_columns: Vec<String>,
    excluded_prefixes: Vec<String>,
    excluded_suffixes: Vec<String>,
}

impl ExclusionPolicy {
    /// Standard policy for the phenology-slope table: excludes the
    /// eco-region grouping key, coordinates, the given label columns, and
    /// all NDVI-derived or season-length columns.
    pub fn new(label_columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            group_key: "ecoName".to_string(),
            coordinates: vec!["lon".to_string(), "lat".to_string()],
            label_columns: label_columns.into_iter().map(Into::into).collect(),
            excluded_prefixes: vec!["NDVI_".to_string()],
            excluded_suffixes: vec!["POSlen_slope".to_string()],
        }
    }

    /// The grouping key used for stratification.
    pub fn group_key(&self) -> &str {
        &self.group_key
    }

    /// Whether a column must never be used as a predictor.
    pub fn is_excluded(&self, column: &str) -> bool {
        column == self.group_key
            || self.coordinates.iter().any(|c| c == column)
            || self.label_columns.iter().any(|c| c == column)
            || self.excluded_prefixes.iter().any(|p| column.starts_with(p.as_str()))
            || self.excluded_suffixes.iter().any(|s| column.ends_with(s.as_str()))
    }

    /// Predictor columns of a table, in table order.
    pub fn feature_columns(&self, df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .iter()
            .map(|n| n.to_string())
            .filter(|n| !self.is_excluded(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn policy() -> ExclusionPolicy {
        ExclusionPolicy::new([
            "EVI_SOS_slope",
            "EVI_POSstart_slope",
            "EVI_POSend_slope",
            "EVI_EOS_slope",
        ])
    }

    #[test]
    fn test_identifiers_and_coordinates_excluded() {
        let p = policy();
        assert!(p.is_excluded("ecoName"));
        assert!(p.is_excluded("lon"));
        assert!(p.is_excluded("lat"));
    }

    #[test]
    fn test_every_label_column_excluded() {
        // Cross-target leakage invariant: all four labels are rejected,
        // not just the active one.
        let p = policy();
        for label in [
            "EVI_SOS_slope",
            "EVI_POSstart_slope",
            "EVI_POSend_slope",
            "EVI_EOS_slope",
        ] {
            assert!(p.is_excluded(label), "{label} must be excluded");
        }
    }

    #[test]
    fn test_naming_patterns_excluded() {
        let p = policy();
        assert!(p.is_excluded("NDVI_SOS_slope"));
        assert!(p.is_excluded("NDVI_mean"));
        assert!(p.is_excluded("EVI_POSlen_slope"));
        assert!(!p.is_excluded("elevation"));
        assert!(!p.is_excluded("precip_trend"));
    }

    #[test]
    fn test_feature_columns_preserve_table_order() {
        let df = df!(
            "ecoName" => &["a", "b"],
            "elevation" => &[1.0, 2.0],
            "NDVI_mean" => &[0.1, 0.2],
            "precip_trend" => &[0.3, 0.4],
            "EVI_SOS_slope" => &[0.0, 1.0]
        )
        .unwrap();

        let features = policy().feature_columns(&df);
        assert_eq!(features, vec!["elevation", "precip_trend"]);
    }
}
