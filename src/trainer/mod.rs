//! Model trainer stage
//!
//! Runs a randomized hyperparameter search per model family, refits each
//! family's best candidate on the full training array, scores it on the
//! held-out test array, and keeps the most accurate model. The winner is
//! bundled with the fitted preprocessor and persisted.

pub mod adaboost;
pub mod cross_validation;
pub mod logistic;
pub mod metrics;
pub mod model;
pub mod search;
pub mod svc;

pub use adaboost::AdaBoost;
pub use cross_validation::{CvScores, CvSplit, StratifiedKFold};
pub use logistic::LogisticRegression;
pub use metrics::ClassificationMetrics;
pub use model::{Classifier, ModelFamily, ModelParams};
pub use search::{RandomizedSearch, SearchOutcome};
pub use svc::{Gamma, Kernel, Svc, SvcConfig};

use crate::artifacts::{TrainerArtifact, TransformationArtifact};
use crate::bundle::ModelBundle;
use crate::config::TrainerConfig;
use crate::error::{PipelineError, Result};
use crate::transform::Preprocessor;
use crate::utils::{load_array, write_yaml};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// One row per family in the training report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub family: String,
    pub cv_mean_accuracy: f64,
    pub cv_std_accuracy: f64,
    pub test_accuracy: f64,
}

/// Persisted summary of the whole search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub best_family: String,
    pub best_test_accuracy: f64,
    pub candidates: Vec<CandidateReport>,
}

/// Split a transformed array into features and the target last column.
pub fn split_features_target(array: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let n_cols = array.ncols();
    if n_cols < 2 {
        return Err(PipelineError::ShapeError {
            expected: "at least 2 columns (features + target)".to_string(),
            actual: format!("{} columns", n_cols),
        });
    }
    let x = array.slice(s![.., ..n_cols - 1]).to_owned();
    let y = array.column(n_cols - 1).to_owned();
    Ok((x, y))
}

/// Runs the training stage.
pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn run(&self, transformation: &TransformationArtifact) -> Result<TrainerArtifact> {
        info!("Starting model training");

        let train = load_array(&transformation.transformed_train_path)?;
        let test = load_array(&transformation.transformed_test_path)?;
        let (x_train, y_train) = split_features_target(&train)?;
        let (x_test, y_test) = split_features_target(&test)?;

        let search = RandomizedSearch::new(
            self.config.search_iterations,
            self.config.cv_folds,
            self.config.random_seed,
        );

        let mut best: Option<(Classifier, f64, ModelFamily)> = None;
        let mut candidates = Vec::with_capacity(ModelFamily::ALL.len());

        for family in ModelFamily::ALL {
            let outcome = search.search_family(family, &x_train, &y_train)?;
            info!(
                family = family.name(),
                cv_mean = outcome.cv.mean_score,
                "Search done for family"
            );

            let mut classifier = outcome.params.build();
            classifier.fit(&x_train, &y_train)?;
            let test_accuracy = classifier.score(&x_test, &y_test)?;
            info!(family = family.name(), test_accuracy, "Refit and scored");

            candidates.push(CandidateReport {
                family: family.name().to_string(),
                cv_mean_accuracy: outcome.cv.mean_score,
                cv_std_accuracy: outcome.cv.std_score,
                test_accuracy,
            });

            // Strict comparison: on a tie the earlier family keeps the win.
            let better = match &best {
                Some((_, best_acc, _)) => test_accuracy > *best_acc,
                None => true,
            };
            if better {
                best = Some((classifier, test_accuracy, family));
            }
        }

        let (classifier, best_accuracy, best_family) = best.ok_or_else(|| {
            PipelineError::FitError("no model family produced a classifier".to_string())
        })?;
        info!(
            family = best_family.name(),
            accuracy = best_accuracy,
            "Selected best model"
        );

        let predictions = classifier.predict(&x_test)?;
        let metrics = ClassificationMetrics::compute(&y_test, &predictions)?;

        let preprocessor = Preprocessor::load(&transformation.preprocessor_path)?;
        let bundle = ModelBundle::new(preprocessor, classifier);

        let trained_model_path = self.config.root_dir.join(&self.config.trained_model_file);
        bundle.save(&trained_model_path)?;

        let report = TrainingReport {
            best_family: best_family.name().to_string(),
            best_test_accuracy: best_accuracy,
            candidates,
        };
        let report_path = self.config.root_dir.join(&self.config.report_file_name);
        write_yaml(&report_path, &report)?;
        info!(
            model = %trained_model_path.display(),
            report = %report_path.display(),
            "Training complete"
        );

        Ok(TrainerArtifact {
            trained_model_path,
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_split_features_target() {
        let arr = array![[1.0, 2.0, 1.0], [3.0, 4.0, 0.0]];
        let (x, y) = split_features_target(&arr).unwrap();
        assert_eq!(x.dim(), (2, 2));
        assert_eq!(y, array![1.0, 0.0]);
    }

    #[test]
    fn test_split_rejects_single_column() {
        let arr = array![[1.0], [0.0]];
        assert!(split_features_target(&arr).is_err());
    }
}
