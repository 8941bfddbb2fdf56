//! Data validation stage
//!
//! Checks both splits against the declared schema and runs a per-column
//! two-sample KS drift test between train and test. All findings land in a
//! YAML drift report; the pass/fail verdict goes into the stage artifact.

mod ks;

pub use ks::{ks_2samp, KsTest};

use crate::artifacts::{IngestionArtifact, ValidationArtifact};
use crate::config::{DataSchema, ValidationConfig};
use crate::error::Result;
use crate::ingestion::read_csv;
use crate::utils::write_yaml;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Drift verdict for one column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub statistic: f64,
    pub p_value: f64,
    pub drift_detected: bool,
}

/// Full drift report, persisted as YAML next to the validation artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftReport {
    pub threshold: f64,
    pub drift_detected: bool,
    pub columns: BTreeMap<String, ColumnDrift>,
}

/// Non-null f64 values of a column, or `None` when the dtype is not numeric.
fn numeric_values(df: &DataFrame, name: &str) -> Result<Option<Vec<f64>>> {
    let column = df.column(name)?;
    match column.dtype() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64 => {
            let casted = column.cast(&DataType::Float64)?;
            let ca = casted.as_materialized_series().f64()?.clone();
            Ok(Some(ca.into_iter().flatten().collect()))
        }
        _ => Ok(None),
    }
}

/// Runs the validation stage.
pub struct DataValidation {
    config: ValidationConfig,
    schema: DataSchema,
}

impl DataValidation {
    pub fn new(config: ValidationConfig, schema: DataSchema) -> Self {
        Self { config, schema }
    }

    /// Schema checks for one split: column count and presence of every
    /// schema-declared column. Returns failure reasons.
    fn check_schema(&self, df: &DataFrame, split: &str) -> Vec<String> {
        let mut failures = Vec::new();

        if df.width() != self.schema.n_columns() {
            failures.push(format!(
                "{} split has {} columns, schema declares {}",
                split,
                df.width(),
                self.schema.n_columns()
            ));
        }

        let present: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        for col in self.schema.columns.keys() {
            if !present.contains(&col.as_str()) {
                failures.push(format!("{} split missing column '{}'", split, col));
            }
        }

        failures
    }

    /// KS drift test for every shared numeric column outside the drop list.
    pub fn detect_drift(&self, train: &DataFrame, test: &DataFrame) -> Result<DriftReport> {
        let mut columns = BTreeMap::new();
        let mut any_drift = false;

        for name in train.get_column_names() {
            let name = name.as_str();
            if self.schema.drop_columns.iter().any(|c| c == name) {
                continue;
            }
            if test.column(name).is_err() {
                continue;
            }
            let Some(base) = numeric_values(train, name)? else {
                debug!(column = name, "Skipping non-numeric column in drift check");
                continue;
            };
            let Some(current) = numeric_values(test, name)? else {
                continue;
            };
            if base.is_empty() || current.is_empty() {
                warn!(column = name, "No values to compare, skipping drift check");
                continue;
            }

            let result = ks_2samp(&base, &current)?;
            let drifted = result.p_value < self.config.drift_threshold;
            if drifted {
                warn!(
                    column = name,
                    p_value = result.p_value,
                    "Distribution drift detected"
                );
                any_drift = true;
            }
            columns.insert(
                name.to_string(),
                ColumnDrift {
                    statistic: result.statistic,
                    p_value: result.p_value,
                    drift_detected: drifted,
                },
            );
        }

        Ok(DriftReport {
            threshold: self.config.drift_threshold,
            drift_detected: any_drift,
            columns,
        })
    }

    pub fn run(&self, ingestion: &IngestionArtifact) -> Result<ValidationArtifact> {
        info!("Starting data validation");

        let train = read_csv(&ingestion.train_path)?;
        let test = read_csv(&ingestion.test_path)?;

        let mut failures = self.check_schema(&train, "train");
        failures.extend(self.check_schema(&test, "test"));

        let report = self.detect_drift(&train, &test)?;
        if report.drift_detected {
            let drifted: Vec<&str> = report
                .columns
                .iter()
                .filter(|(_, c)| c.drift_detected)
                .map(|(n, _)| n.as_str())
                .collect();
            failures.push(format!("drift detected in columns: {}", drifted.join(", ")));
        }

        let report_path = self.config.root_dir.join(&self.config.report_file_name);
        write_yaml(&report_path, &report)?;
        info!(report = %report_path.display(), "Wrote drift report");

        let status = failures.is_empty();
        let message = if status {
            "all schema and drift checks passed".to_string()
        } else {
            failures.join("; ")
        };
        if status {
            info!("Validation passed");
        } else {
            warn!(message = %message, "Validation failed");
        }

        Ok(ValidationArtifact {
            validation_status: status,
            message,
        })
    }
}
