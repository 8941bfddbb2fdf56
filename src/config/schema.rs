//! Dataset schema definition, read from `schema.yaml`.

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Read-only description of the expected dataset shape.
///
/// Validation checks incoming splits against this; transformation uses the
/// target mapping and drop list. The schema is loaded once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSchema {
    /// Expected columns and their declared dtypes, in no particular order
    pub columns: BTreeMap<String, String>,
    /// Columns that must be numeric (drift candidates)
    pub numerical_columns: Vec<String>,
    /// Name of the label column
    pub target_column: String,
    /// Label string → encoded integer class
    pub target_mapping: BTreeMap<String, i64>,
    /// Columns excluded from modeling (identifiers, the raw label)
    pub drop_columns: Vec<String>,
}

impl DataSchema {
    /// Load the schema from a YAML file, rejecting incomplete definitions.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let schema: DataSchema = serde_yaml::from_str(&text)
            .map_err(|e| PipelineError::ConfigError(format!("{}: {}", path.display(), e)))?;
        schema.validate()?;
        Ok(schema)
    }

    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(PipelineError::ConfigError(
                "schema declares no columns".to_string(),
            ));
        }
        if !self.columns.contains_key(&self.target_column) {
            return Err(PipelineError::ConfigError(format!(
                "target column '{}' not among declared columns",
                self.target_column
            )));
        }
        if self.target_mapping.is_empty() {
            return Err(PipelineError::ConfigError(
                "schema declares no target mapping".to_string(),
            ));
        }
        for col in &self.numerical_columns {
            if !self.columns.contains_key(col) {
                return Err(PipelineError::ConfigError(format!(
                    "numerical column '{}' not among declared columns",
                    col
                )));
            }
        }
        Ok(())
    }

    /// Number of declared columns.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataSchema {
        let yaml = r#"
columns:
  id: int64
  diagnosis: object
  radius_mean: float64
  texture_mean: float64
numerical_columns:
  - radius_mean
  - texture_mean
target_column: diagnosis
target_mapping:
  M: 1
  B: 0
drop_columns:
  - id
  - diagnosis
"#;
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_schema_roundtrip() {
        let schema = sample();
        schema.validate().unwrap();
        assert_eq!(schema.n_columns(), 4);
        assert_eq!(schema.target_mapping["M"], 1);
        assert_eq!(schema.target_mapping["B"], 0);
    }

    #[test]
    fn test_unknown_target_rejected() {
        let mut schema = sample();
        schema.target_column = "label".to_string();
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_unknown_numerical_column_rejected() {
        let mut schema = sample();
        schema.numerical_columns.push("area_mean".to_string());
        assert!(schema.validate().is_err());
    }
}
