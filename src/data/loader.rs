//! Table loading and cleaning

use crate::error::{PhenoError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Sentinel value used by the upstream raster sampling for missing cells.
pub const MISSING_SENTINEL: f64 = -9999.0;

/// Index-like columns that sometimes survive upstream exports.
const STRAY_INDEX_COLUMNS: &[&str] = &["", "index", "Unnamed: 0"];

/// Loader for the observation-site table (CSV or Parquet).
pub struct TableLoader;

impl TableLoader {
    /// Load a table, dispatching on the file extension, and clean it:
    /// sentinel values become nulls and stray index columns are dropped.
    pub fn load(path: &Path) -> Result<DataFrame> {
        let df = match path.extension().and_then(|e| e.to_str()) {
            Some("parquet") => Self::read_parquet(path)?,
            _ => Self::read_csv(path)?,
        };
        Self::clean(df)
    }

    fn read_csv(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| PhenoError::DataError(format!("{}: {}", path.display(), e)))?;

        let reader = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .into_reader_with_file_handle(file);

        reader
            .finish()
            .map_err(|e| PhenoError::DataError(e.to_string()))
    }

    fn read_parquet(path: &Path) -> Result<DataFrame> {
        let file = File::open(path)
            .map_err(|e| PhenoError::DataError(format!("{}: {}", path.display(), e)))?;

        ParquetReader::new(file)
            .finish()
            .map_err(|e| PhenoError::DataError(e.to_string()))
    }

    /// Normalize sentinel values to null and drop stray index columns.
    pub fn clean(df: DataFrame) -> Result<DataFrame> {
        let mut result = df;

        for stray in STRAY_INDEX_COLUMNS {
            if result.get_column_names().iter().any(|n| n.as_str() == *stray) {
                result = result.drop(stray)?;
            }
        }

        let names: Vec<String> = result
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();

        for name in names {
            let column = result.column(name.as_str())?;
            let series = column.as_materialized_series();

            let replacement = match series.dtype() {
                DataType::Float64 => {
                    let ca: Float64Chunked = series
                        .f64()?
                        .into_iter()
                        .map(|v| v.filter(|x| *x != MISSING_SENTINEL))
                        .collect();
                    Some(ca.with_name(name.as_str().into()).into_series())
                }
                DataType::Int64 => {
                    let ca: Int64Chunked = series
                        .i64()?
                        .into_iter()
                        .map(|v| v.filter(|x| *x != MISSING_SENTINEL as i64))
                        .collect();
                    Some(ca.with_name(name.as_str().into()).into_series())
                }
                _ => None,
            };

            if let Some(series) = replacement {
                result = result
                    .with_column(series)
                    .map_err(|e| PhenoError::DataError(e.to_string()))?
                    .clone();
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_becomes_null() {
        let df = df!(
            "a" => &[1.0, -9999.0, 3.0],
            "b" => &[-9999.0, -9999.0, 0.5]
        )
        .unwrap();

        let cleaned = TableLoader::clean(df).unwrap();
        assert_eq!(cleaned.column("a").unwrap().null_count(), 1);
        assert_eq!(cleaned.column("b").unwrap().null_count(), 2);
    }

    #[test]
    fn test_integer_sentinel_becomes_null() {
        let df = df!(
            "count" => &[10i64, -9999, 3]
        )
        .unwrap();

        let cleaned = TableLoader::clean(df).unwrap();
        assert_eq!(cleaned.column("count").unwrap().null_count(), 1);
    }

    #[test]
    fn test_stray_index_columns_dropped() {
        let df = df!(
            "index" => &[0i64, 1, 2],
            "x" => &[1.0, 2.0, 3.0]
        )
        .unwrap();

        let cleaned = TableLoader::clean(df).unwrap();
        assert!(cleaned.column("index").is_err());
        assert!(cleaned.column("x").is_ok());
    }
}
