//! Per-row attribution table export

use crate::error::{PhenoError, Result};
use crate::explain::AttributionMatrix;
use crate::report::display_name;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// Write one Parquet row per explained observation: a `rowID` column with
/// the original table index plus one display-named column per predictor.
/// Overwrites any previous table at the same path; a failed write removes
/// the partial file.
pub fn write_attribution_table(path: &Path, attr: &AttributionMatrix) -> Result<()> {
    let result = write_inner(path, attr);
    if result.is_err() {
        let _ = fs::remove_file(path);
    }
    result
}

fn write_inner(path: &Path, attr: &AttributionMatrix) -> Result<()> {
    let mut columns: Vec<Column> = Vec::with_capacity(attr.feature_names.len() + 1);

    let row_ids: Vec<i64> = attr.row_ids.iter().map(|&i| i as i64).collect();
    columns.push(Series::new("rowID".into(), &row_ids).into());

    for (j, name) in attr.feature_names.iter().enumerate() {
        let values: Vec<f64> = attr.values.column(j).to_vec();
        columns.push(Series::new(display_name(name).into(), &values).into());
    }

    let mut df = DataFrame::new(columns)?;

    let file = File::create(path).map_err(|e| {
        PhenoError::ExportError(format!("{}: {}", path.display(), e))
    })?;
    ParquetWriter::new(file)
        .finish(&mut df)
        .map_err(|e| PhenoError::ExportError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn attribution() -> AttributionMatrix {
        AttributionMatrix {
            row_ids: vec![4, 9],
            feature_names: vec!["soil_moisture".to_string(), "elevation".to_string()],
            baseline: 0.5,
            values: array![[0.1, -0.2], [0.3, 0.4]],
            predictions: array![0.4, 1.2],
        }
    }

    #[test]
    fn test_table_written_with_display_names_and_row_ids() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shap_values_SOS.parquet");

        write_attribution_table(&path, &attribution()).unwrap();

        let file = File::open(&path).unwrap();
        let df = ParquetReader::new(file).finish().unwrap();
        assert_eq!(df.height(), 2);
        assert!(df.column("soil moisture").is_ok());
        assert!(df.column("elevation").is_ok());

        let ids: Vec<i64> = df.column("rowID").unwrap().i64().unwrap().into_no_null_iter().collect();
        assert_eq!(ids, vec![4, 9]);
    }

    #[test]
    fn test_rerun_overwrites_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shap_values_SOS.parquet");

        write_attribution_table(&path, &attribution()).unwrap();
        write_attribution_table(&path, &attribution()).unwrap();

        let file = File::open(&path).unwrap();
        let df = ParquetReader::new(file).finish().unwrap();
        assert_eq!(df.height(), 2);
    }
}
