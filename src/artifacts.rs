//! Stage artifacts
//!
//! Each pipeline stage produces one immutable artifact record describing its
//! persisted outputs; the next stage consumes it by path. Artifacts are never
//! mutated after creation.

use crate::trainer::metrics::ClassificationMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output of data ingestion: raw dataset plus the train/test split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionArtifact {
    /// Raw downloaded dataset in the feature store
    pub feature_store_path: PathBuf,
    /// Training split CSV
    pub train_path: PathBuf,
    /// Test split CSV
    pub test_path: PathBuf,
}

/// Output of data validation. Consumed for logging and gating only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationArtifact {
    /// True when all schema and drift checks passed
    pub validation_status: bool,
    /// Concatenated failure reasons (or the all-clear message)
    pub message: String,
}

/// Output of data transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationArtifact {
    /// Transformed training array (features + encoded target as last column)
    pub transformed_train_path: PathBuf,
    /// Transformed test array
    pub transformed_test_path: PathBuf,
    /// Fitted preprocessor object
    pub preprocessor_path: PathBuf,
}

/// Output of model training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerArtifact {
    /// Serialized model bundle (preprocessor + winning classifier)
    pub trained_model_path: PathBuf,
    /// Held-out test metrics of the winning model
    pub metrics: ClassificationMetrics,
}

/// Planned model-acceptance stage output. Declared only; no evaluation
/// stage is implemented.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationArtifact {
    pub is_model_accepted: bool,
    pub improved_accuracy: f64,
    pub trained_model_path: PathBuf,
}

/// Planned deployment stage output. Declared only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PusherArtifact {
    pub bucket_name: String,
    pub remote_model_path: String,
    pub model_version: String,
}
