//! End-to-end training pipeline orchestration.

use crate::artifacts::TrainerArtifact;
use crate::config::{DataSchema, PipelineConfig};
use crate::error::{PipelineError, Result};
use crate::ingestion::{DataIngestion, HubClient};
use crate::trainer::ModelTrainer;
use crate::transform::DataTransformation;
use crate::validation::DataValidation;
use tracing::{info, warn};

/// Runs the four stages in order: ingest, validate, transform, train.
///
/// A failed validation is logged and the run continues, unless
/// `data_validation.halt_on_failure` is set, in which case the pipeline
/// stops before transformation.
pub struct TrainingPipeline {
    config: PipelineConfig,
    schema: DataSchema,
    client: HubClient,
}

impl TrainingPipeline {
    pub fn new(config: PipelineConfig, schema: DataSchema, client: HubClient) -> Self {
        Self {
            config,
            schema,
            client,
        }
    }

    pub fn run(&self) -> Result<TrainerArtifact> {
        info!("Training pipeline started");

        let ingestion =
            DataIngestion::new(self.config.data_ingestion.clone(), self.client.clone()).run()?;

        let validation = DataValidation::new(
            self.config.data_validation.clone(),
            self.schema.clone(),
        )
        .run(&ingestion)?;
        if !validation.validation_status {
            if self.config.data_validation.halt_on_failure {
                return Err(PipelineError::ValidationError(validation.message));
            }
            warn!(message = %validation.message, "Continuing despite failed validation");
        }

        let transformation = DataTransformation::new(
            self.config.data_transformation.clone(),
            self.schema.clone(),
        )
        .run(&ingestion)?;

        let trainer = ModelTrainer::new(self.config.model_trainer.clone()).run(&transformation)?;

        info!(
            accuracy = trainer.metrics.accuracy,
            model = %trainer.trained_model_path.display(),
            "Training pipeline finished"
        );
        Ok(trainer)
    }
}
