//! Pipeline configuration
//!
//! Loads `config.yaml` into one typed record per stage. Required fields are
//! validated once at load time and every missing key is reported in a single
//! error, rather than silently defaulting to empty values. Fields with a
//! legitimate default carry it via serde.

mod schema;

pub use schema::DataSchema;

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_split_ratio() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_drift_threshold() -> f64 {
    0.05
}

fn default_significance_level() -> f64 {
    0.05
}

fn default_cv_folds() -> usize {
    5
}

fn default_search_iterations() -> usize {
    10
}

/// Take a required field out of its raw `Option`, recording its key when absent.
fn require<T: Default>(value: Option<T>, key: &str, missing: &mut Vec<String>) -> T {
    match value {
        Some(v) => v,
        None => {
            missing.push(key.to_string());
            T::default()
        }
    }
}

/// Data ingestion stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Stage output directory
    pub root_dir: PathBuf,
    /// Dataset locator, e.g. `hf://datasets/<org>/<name>/<file>`
    pub source_url: String,
    /// File name for the raw dataset inside `root_dir`
    pub local_data_file: String,
    /// Fraction of rows held out as the test split (default 0.2)
    #[serde(default = "default_split_ratio")]
    pub train_test_split_ratio: f64,
    /// Seed for the deterministic split shuffle (default 42)
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

/// Data validation stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub root_dir: PathBuf,
    /// Drift report file name inside `root_dir`
    pub report_file_name: String,
    /// KS p-value threshold below which a column is flagged drifted (default 0.05)
    #[serde(default = "default_drift_threshold")]
    pub drift_threshold: f64,
    /// Abort the pipeline when validation fails (default false: log only)
    #[serde(default)]
    pub halt_on_failure: bool,
}

/// Data transformation stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationConfig {
    pub root_dir: PathBuf,
    pub transformed_train_file: String,
    pub transformed_test_file: String,
    pub preprocessor_file: String,
    /// ANOVA p-value threshold for keeping a feature (default 0.05)
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
}

/// Model trainer stage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub root_dir: PathBuf,
    pub trained_model_file: String,
    pub report_file_name: String,
    /// Cross-validation folds for the randomized search (default 5)
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,
    /// Parameter combinations sampled per model family (default 10)
    #[serde(default = "default_search_iterations")]
    pub search_iterations: usize,
    /// Seed for parameter sampling and CV shuffling (default 42)
    #[serde(default = "default_seed")]
    pub random_seed: u64,
}

/// Model evaluation stage configuration. The evaluation stage itself is not
/// implemented; the key is parsed so existing config files round-trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub root_dir: PathBuf,
}

/// Full pipeline configuration, one record per stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_ingestion: IngestionConfig,
    pub data_validation: ValidationConfig,
    pub data_transformation: TransformationConfig,
    pub model_trainer: TrainerConfig,
    pub model_evaluation: EvaluationConfig,
}

// Raw mirror with optional fields so that every missing key can be collected
// before failing, instead of erroring on the first one serde encounters.

#[derive(Debug, Default, Deserialize)]
struct RawIngestion {
    root_dir: Option<PathBuf>,
    source_url: Option<String>,
    local_data_file: Option<String>,
    train_test_split_ratio: Option<f64>,
    random_seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawValidation {
    root_dir: Option<PathBuf>,
    report_file_name: Option<String>,
    drift_threshold: Option<f64>,
    halt_on_failure: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTransformation {
    root_dir: Option<PathBuf>,
    transformed_train_file: Option<String>,
    transformed_test_file: Option<String>,
    preprocessor_file: Option<String>,
    significance_level: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrainer {
    root_dir: Option<PathBuf>,
    trained_model_file: Option<String>,
    report_file_name: Option<String>,
    cv_folds: Option<usize>,
    search_iterations: Option<usize>,
    random_seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    data_ingestion: Option<RawIngestion>,
    data_validation: Option<RawValidation>,
    data_transformation: Option<RawTransformation>,
    model_trainer: Option<RawTrainer>,
    model_evaluation: Option<EvaluationConfig>,
}

impl PipelineConfig {
    /// Load and validate the pipeline configuration from a YAML file.
    ///
    /// Returns a `ConfigError` listing every missing required field.
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        let raw: RawConfig = serde_yaml::from_str(&text)
            .map_err(|e| PipelineError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let mut missing = Vec::new();

        let ing = raw.data_ingestion.unwrap_or_else(|| {
            missing.push("data_ingestion".to_string());
            RawIngestion::default()
        });
        let val = raw.data_validation.unwrap_or_else(|| {
            missing.push("data_validation".to_string());
            RawValidation::default()
        });
        let tra = raw.data_transformation.unwrap_or_else(|| {
            missing.push("data_transformation".to_string());
            RawTransformation::default()
        });
        let trn = raw.model_trainer.unwrap_or_else(|| {
            missing.push("model_trainer".to_string());
            RawTrainer::default()
        });

        let config = PipelineConfig {
            data_ingestion: IngestionConfig {
                root_dir: require(ing.root_dir, "data_ingestion.root_dir", &mut missing),
                source_url: require(ing.source_url, "data_ingestion.source_url", &mut missing),
                local_data_file: require(
                    ing.local_data_file,
                    "data_ingestion.local_data_file",
                    &mut missing,
                ),
                train_test_split_ratio: ing.train_test_split_ratio.unwrap_or_else(default_split_ratio),
                random_seed: ing.random_seed.unwrap_or_else(default_seed),
            },
            data_validation: ValidationConfig {
                root_dir: require(val.root_dir, "data_validation.root_dir", &mut missing),
                report_file_name: require(
                    val.report_file_name,
                    "data_validation.report_file_name",
                    &mut missing,
                ),
                drift_threshold: val.drift_threshold.unwrap_or_else(default_drift_threshold),
                halt_on_failure: val.halt_on_failure.unwrap_or(false),
            },
            data_transformation: TransformationConfig {
                root_dir: require(tra.root_dir, "data_transformation.root_dir", &mut missing),
                transformed_train_file: require(
                    tra.transformed_train_file,
                    "data_transformation.transformed_train_file",
                    &mut missing,
                ),
                transformed_test_file: require(
                    tra.transformed_test_file,
                    "data_transformation.transformed_test_file",
                    &mut missing,
                ),
                preprocessor_file: require(
                    tra.preprocessor_file,
                    "data_transformation.preprocessor_file",
                    &mut missing,
                ),
                significance_level: tra
                    .significance_level
                    .unwrap_or_else(default_significance_level),
            },
            model_trainer: TrainerConfig {
                root_dir: require(trn.root_dir, "model_trainer.root_dir", &mut missing),
                trained_model_file: require(
                    trn.trained_model_file,
                    "model_trainer.trained_model_file",
                    &mut missing,
                ),
                report_file_name: require(
                    trn.report_file_name,
                    "model_trainer.report_file_name",
                    &mut missing,
                ),
                cv_folds: trn.cv_folds.unwrap_or_else(default_cv_folds),
                search_iterations: trn.search_iterations.unwrap_or_else(default_search_iterations),
                random_seed: trn.random_seed.unwrap_or_else(default_seed),
            },
            model_evaluation: raw.model_evaluation.unwrap_or_default(),
        };

        if !missing.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let ratio = config.data_ingestion.train_test_split_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            return Err(PipelineError::ConfigError(format!(
                "data_ingestion.train_test_split_ratio must be in (0, 1), got {}",
                ratio
            )));
        }
        if config.model_trainer.cv_folds < 2 {
            return Err(PipelineError::ConfigError(
                "model_trainer.cv_folds must be at least 2".to_string(),
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
data_ingestion:
  root_dir: artifacts/data_ingestion
  source_url: hf://datasets/acme/breast-cancer/breast_cancer.csv
  local_data_file: breast_cancer.csv
data_validation:
  root_dir: artifacts/data_validation
  report_file_name: drift_report.yaml
data_transformation:
  root_dir: artifacts/data_transformation
  transformed_train_file: train.bin
  transformed_test_file: test.bin
  preprocessor_file: preprocessor.json
model_trainer:
  root_dir: artifacts/model_trainer
  trained_model_file: model.json
  report_file_name: model_report.yaml
"#;

    #[test]
    fn test_full_config_loads_with_defaults() {
        let raw: RawConfig = serde_yaml::from_str(FULL).unwrap();
        let config = PipelineConfig::from_raw(raw).unwrap();
        assert_eq!(config.data_ingestion.train_test_split_ratio, 0.2);
        assert_eq!(config.data_ingestion.random_seed, 42);
        assert_eq!(config.data_validation.drift_threshold, 0.05);
        assert!(!config.data_validation.halt_on_failure);
        assert_eq!(config.model_trainer.cv_folds, 5);
        assert_eq!(config.model_trainer.search_iterations, 10);
    }

    #[test]
    fn test_missing_fields_all_reported() {
        let raw: RawConfig = serde_yaml::from_str(
            r#"
data_ingestion:
  root_dir: artifacts/data_ingestion
data_validation:
  root_dir: artifacts/data_validation
data_transformation:
  root_dir: artifacts/data_transformation
  transformed_train_file: train.bin
  transformed_test_file: test.bin
  preprocessor_file: preprocessor.json
model_trainer:
  root_dir: artifacts/model_trainer
  trained_model_file: model.json
  report_file_name: model_report.yaml
"#,
        )
        .unwrap();
        let err = PipelineConfig::from_raw(raw).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("data_ingestion.source_url"), "{}", msg);
        assert!(msg.contains("data_ingestion.local_data_file"), "{}", msg);
        assert!(msg.contains("data_validation.report_file_name"), "{}", msg);
    }

    #[test]
    fn test_bad_split_ratio_rejected() {
        let text = FULL.replace(
            "  local_data_file: breast_cancer.csv",
            "  local_data_file: breast_cancer.csv\n  train_test_split_ratio: 1.5",
        );
        let raw: RawConfig = serde_yaml::from_str(&text).unwrap();
        assert!(PipelineConfig::from_raw(raw).is_err());
    }
}
