//! Oncopipe - breast-cancer diagnosis training pipeline
//!
//! This crate runs a four-stage supervised training pipeline end to end:
//! - [`ingestion`] - dataset download and seeded train/test split
//! - [`validation`] - schema checks and KS drift detection between splits
//! - [`transform`] - ANOVA feature selection, Yeo-Johnson + standard scaling
//! - [`trainer`] - randomized hyperparameter search over SVC, AdaBoost and
//!   logistic regression, keeping the most accurate model
//!
//! The winning classifier ships together with the fitted preprocessor as a
//! [`bundle::ModelBundle`], so inference consumes raw rows directly.

pub mod error;

pub mod artifacts;
pub mod bundle;
pub mod config;
pub mod ingestion;
pub mod pipeline;
pub mod trainer;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{PipelineError, Result};

    pub use crate::artifacts::{
        IngestionArtifact, TrainerArtifact, TransformationArtifact, ValidationArtifact,
    };
    pub use crate::bundle::ModelBundle;
    pub use crate::config::{DataSchema, PipelineConfig};
    pub use crate::ingestion::{DataIngestion, DatasetLocator, HubClient};
    pub use crate::pipeline::TrainingPipeline;
    pub use crate::trainer::{
        ClassificationMetrics, Classifier, ModelFamily, ModelTrainer, RandomizedSearch,
    };
    pub use crate::transform::{DataTransformation, Preprocessor};
    pub use crate::validation::DataValidation;
}
