//! Data transformation stage
//!
//! Selects discriminative features with a one-way ANOVA F-test, fits the
//! preprocessor on the training split, encodes the target, and persists the
//! resulting dense arrays (features plus target as the last column).

mod anova;
mod power;
mod preprocessor;
mod scaler;

pub use anova::{f_oneway, AnovaTest};
pub use power::{yeo_johnson, PowerTransformer};
pub use preprocessor::Preprocessor;
pub use scaler::StandardScaler;

use crate::artifacts::{IngestionArtifact, TransformationArtifact};
use crate::config::{DataSchema, TransformationConfig};
use crate::error::{PipelineError, Result};
use crate::ingestion::read_csv;
use crate::utils::save_array;
use ndarray::Array2;
use polars::prelude::*;
use tracing::{debug, info};

/// Columns with at most this many distinct values are treated as discrete
/// and never enter the ANOVA selection.
const CONTINUOUS_UNIQUE_THRESHOLD: usize = 25;

/// Encoded target classes for one split, in row order.
pub fn encode_target(df: &DataFrame, schema: &DataSchema) -> Result<Vec<f64>> {
    let column = df.column(&schema.target_column).map_err(|_| {
        PipelineError::SchemaError(format!(
            "target column '{}' not found",
            schema.target_column
        ))
    })?;
    let series = column.as_materialized_series();

    match series.dtype() {
        DataType::String => {
            let ca = series
                .str()
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
            let mut encoded = Vec::with_capacity(ca.len());
            for opt in ca.into_iter() {
                let label = opt.ok_or_else(|| {
                    PipelineError::SchemaError("null value in target column".to_string())
                })?;
                let class = schema.target_mapping.get(label).ok_or_else(|| {
                    PipelineError::SchemaError(format!(
                        "target label '{}' not in mapping",
                        label
                    ))
                })?;
                encoded.push(*class as f64);
            }
            Ok(encoded)
        }
        // Already-encoded targets pass through untouched.
        _ => {
            let casted = series.cast(&DataType::Float64)?;
            let ca = casted
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?;
            ca.into_iter()
                .map(|opt| {
                    opt.ok_or_else(|| {
                        PipelineError::SchemaError("null value in target column".to_string())
                    })
                })
                .collect()
        }
    }
}

/// ANOVA feature selection on the training split.
///
/// Each continuous numerical column is tested for mean separation across the
/// target classes; columns with `p < significance_level` are kept, in schema
/// order.
pub fn select_features(
    train: &DataFrame,
    schema: &DataSchema,
    significance_level: f64,
) -> Result<Vec<String>> {
    let target = encode_target(train, schema)?;
    let mut classes: Vec<i64> = target.iter().map(|v| *v as i64).collect();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() < 2 {
        return Err(PipelineError::DataError(
            "training split contains a single target class".to_string(),
        ));
    }

    let mut selected = Vec::new();
    for name in &schema.numerical_columns {
        if schema.drop_columns.contains(name) {
            continue;
        }
        let column = train
            .column(name)
            .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?;
        if column.as_materialized_series().n_unique()? <= CONTINUOUS_UNIQUE_THRESHOLD {
            debug!(column = name.as_str(), "Skipping discrete column");
            continue;
        }

        let casted = column.cast(&DataType::Float64)?;
        let values: Vec<f64> = casted
            .as_materialized_series()
            .f64()
            .map_err(|e| PipelineError::DataError(e.to_string()))?
            .into_iter()
            .map(|opt| opt.unwrap_or(f64::NAN))
            .collect();

        let groups: Vec<Vec<f64>> = classes
            .iter()
            .map(|class| {
                values
                    .iter()
                    .zip(target.iter())
                    .filter(|(v, t)| **t as i64 == *class && !v.is_nan())
                    .map(|(v, _)| *v)
                    .collect()
            })
            .collect();

        let result = f_oneway(&groups)?;
        if result.p_value < significance_level {
            debug!(
                column = name.as_str(),
                p_value = result.p_value,
                "Feature selected"
            );
            selected.push(name.clone());
        }
    }

    if selected.is_empty() {
        return Err(PipelineError::DataError(
            "no feature passed the ANOVA selection".to_string(),
        ));
    }
    Ok(selected)
}

/// Stack transformed features with the encoded target as the last column.
pub fn assemble_array(features: &DataFrame, target: &[f64]) -> Result<Array2<f64>> {
    let n_rows = features.height();
    if target.len() != n_rows {
        return Err(PipelineError::ShapeError {
            expected: format!("{} target values", n_rows),
            actual: format!("{}", target.len()),
        });
    }

    let n_cols = features.width() + 1;
    let mut array = Array2::<f64>::zeros((n_rows, n_cols));
    for (j, column) in features.get_columns().iter().enumerate() {
        let ca = column
            .as_materialized_series()
            .f64()
            .map_err(|e| PipelineError::DataError(e.to_string()))?
            .clone();
        for (i, opt) in ca.into_iter().enumerate() {
            array[[i, j]] = opt.ok_or_else(|| {
                PipelineError::DataError(format!(
                    "null value in transformed column '{}'",
                    column.name()
                ))
            })?;
        }
    }
    for (i, &t) in target.iter().enumerate() {
        array[[i, n_cols - 1]] = t;
    }
    Ok(array)
}

/// Runs the transformation stage.
pub struct DataTransformation {
    config: TransformationConfig,
    schema: DataSchema,
}

impl DataTransformation {
    pub fn new(config: TransformationConfig, schema: DataSchema) -> Self {
        Self { config, schema }
    }

    pub fn run(&self, ingestion: &IngestionArtifact) -> Result<TransformationArtifact> {
        info!("Starting data transformation");

        let train = read_csv(&ingestion.train_path)?;
        let test = read_csv(&ingestion.test_path)?;

        let selected = select_features(&train, &self.schema, self.config.significance_level)?;
        info!(
            selected = selected.len(),
            candidates = self.schema.numerical_columns.len(),
            "ANOVA feature selection done"
        );

        let mut preprocessor = Preprocessor::new(selected);
        let train_features = preprocessor.fit_transform(&train)?;
        let test_features = preprocessor.transform(&test)?;

        let train_target = encode_target(&train, &self.schema)?;
        let test_target = encode_target(&test, &self.schema)?;

        let train_array = assemble_array(&train_features, &train_target)?;
        let test_array = assemble_array(&test_features, &test_target)?;

        let transformed_train_path = self
            .config
            .root_dir
            .join(&self.config.transformed_train_file);
        let transformed_test_path = self.config.root_dir.join(&self.config.transformed_test_file);
        let preprocessor_path = self.config.root_dir.join(&self.config.preprocessor_file);

        save_array(&transformed_train_path, &train_array)?;
        save_array(&transformed_test_path, &test_array)?;
        preprocessor.save(&preprocessor_path)?;

        info!(
            train_shape = ?train_array.dim(),
            test_shape = ?test_array.dim(),
            "Transformation complete"
        );
        Ok(TransformationArtifact {
            transformed_train_path,
            transformed_test_path,
            preprocessor_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> DataSchema {
        serde_yaml::from_str(
            r#"
columns:
  id: int64
  diagnosis: object
  informative: float64
  noise: float64
numerical_columns:
  - informative
  - noise
target_column: diagnosis
target_mapping:
  M: 1
  B: 0
drop_columns:
  - id
  - diagnosis
"#,
        )
        .unwrap()
    }

    /// 100 rows, alternating classes. `informative` separates the classes,
    /// `noise` has the same distribution in both.
    fn sample_df() -> DataFrame {
        let n = 100;
        let ids: Vec<i64> = (0..n).collect();
        let diag: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "M" } else { "B" }).collect();
        let informative: Vec<f64> = (0..n)
            .map(|i| {
                let base = if i % 2 == 0 { 30.0 } else { 10.0 };
                base + (i as f64 * 0.137) % 1.0
            })
            .collect();
        let noise: Vec<f64> = (0..n).map(|i| (i as f64 * 0.731) % 7.0).collect();
        df! {
            "id" => ids,
            "diagnosis" => diag,
            "informative" => informative,
            "noise" => noise,
        }
        .unwrap()
    }

    #[test]
    fn test_target_encoding() {
        let df = sample_df();
        let target = encode_target(&df, &schema()).unwrap();
        assert_eq!(target[0], 1.0);
        assert_eq!(target[1], 0.0);
        assert_eq!(target.len(), 100);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let df = df! {
            "diagnosis" => ["M", "X"],
            "informative" => [1.0, 2.0],
        }
        .unwrap();
        let err = encode_target(&df, &schema()).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaError(_)));
    }

    #[test]
    fn test_numeric_target_passthrough() {
        let df = df! {
            "diagnosis" => [1i64, 0, 1],
            "informative" => [1.0, 2.0, 3.0],
        }
        .unwrap();
        let target = encode_target(&df, &schema()).unwrap();
        assert_eq!(target, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_anova_keeps_informative_drops_noise() {
        let df = sample_df();
        let selected = select_features(&df, &schema(), 0.05).unwrap();
        assert_eq!(selected, vec!["informative".to_string()]);
    }

    #[test]
    fn test_assemble_array_layout() {
        let features = df! { "a" => [1.0, 2.0], "b" => [3.0, 4.0] }.unwrap();
        let target = vec![1.0, 0.0];
        let array = assemble_array(&features, &target).unwrap();
        assert_eq!(array.dim(), (2, 3));
        assert_eq!(array[[0, 0]], 1.0);
        assert_eq!(array[[0, 2]], 1.0);
        assert_eq!(array[[1, 2]], 0.0);
    }

    #[test]
    fn test_assemble_array_length_mismatch() {
        let features = df! { "a" => [1.0, 2.0] }.unwrap();
        assert!(assemble_array(&features, &[1.0]).is_err());
    }
}
