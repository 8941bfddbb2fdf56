//! Candidate model families and unified classifier dispatch.

use crate::error::Result;
use crate::trainer::adaboost::AdaBoost;
use crate::trainer::logistic::LogisticRegression;
use crate::trainer::svc::{Svc, SvcConfig};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// The model families entered into the search.
///
/// The declaration order doubles as the tie-break order: when two families
/// reach the same accuracy, the earlier one keeps the win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    Svc,
    AdaBoost,
    LogisticRegression,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::Svc,
        ModelFamily::AdaBoost,
        ModelFamily::LogisticRegression,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::Svc => "svc",
            ModelFamily::AdaBoost => "adaboost",
            ModelFamily::LogisticRegression => "logistic_regression",
        }
    }
}

/// One sampled parameter combination, buildable into a fresh classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ModelParams {
    Svc(SvcConfig),
    AdaBoost {
        n_estimators: usize,
        learning_rate: f64,
    },
    LogisticRegression {
        alpha: f64,
        learning_rate: f64,
        max_iter: usize,
    },
}

impl ModelParams {
    pub fn family(&self) -> ModelFamily {
        match self {
            ModelParams::Svc(_) => ModelFamily::Svc,
            ModelParams::AdaBoost { .. } => ModelFamily::AdaBoost,
            ModelParams::LogisticRegression { .. } => ModelFamily::LogisticRegression,
        }
    }

    /// Build an unfitted classifier with these parameters.
    pub fn build(&self) -> Classifier {
        match self {
            ModelParams::Svc(config) => Classifier::Svc(Svc::new(config.clone())),
            ModelParams::AdaBoost {
                n_estimators,
                learning_rate,
            } => Classifier::AdaBoost(AdaBoost::new(*n_estimators, *learning_rate)),
            ModelParams::LogisticRegression {
                alpha,
                learning_rate,
                max_iter,
            } => Classifier::LogisticRegression(
                LogisticRegression::new()
                    .with_alpha(*alpha)
                    .with_learning_rate(*learning_rate)
                    .with_max_iter(*max_iter),
            ),
        }
    }
}

/// A trained (or trainable) classifier of any family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    Svc(Svc),
    AdaBoost(AdaBoost),
    LogisticRegression(LogisticRegression),
}

impl Classifier {
    pub fn family(&self) -> ModelFamily {
        match self {
            Classifier::Svc(_) => ModelFamily::Svc,
            Classifier::AdaBoost(_) => ModelFamily::AdaBoost,
            Classifier::LogisticRegression(_) => ModelFamily::LogisticRegression,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Classifier::Svc(m) => m.fit(x, y),
            Classifier::AdaBoost(m) => m.fit(x, y).map(|_| ()),
            Classifier::LogisticRegression(m) => m.fit(x, y).map(|_| ()),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::Svc(m) => m.predict(x),
            Classifier::AdaBoost(m) => m.predict(x),
            Classifier::LogisticRegression(m) => m.predict(x),
        }
    }

    /// Accuracy on the given data.
    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let preds = self.predict(x)?;
        let correct = preds
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn data() -> (Array2<f64>, Array1<f64>) {
        (
            array![
                [-2.0, -2.0],
                [-1.5, -1.0],
                [-1.0, -1.5],
                [1.0, 1.5],
                [1.5, 1.0],
                [2.0, 2.0],
            ],
            array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
        )
    }

    #[test]
    fn test_family_order_is_tiebreak_order() {
        assert_eq!(ModelFamily::ALL[0], ModelFamily::Svc);
        assert_eq!(ModelFamily::ALL[1], ModelFamily::AdaBoost);
        assert_eq!(ModelFamily::ALL[2], ModelFamily::LogisticRegression);
    }

    #[test]
    fn test_every_family_fits_and_scores() {
        let (x, y) = data();
        let candidates = [
            ModelParams::Svc(SvcConfig::default()),
            ModelParams::AdaBoost {
                n_estimators: 10,
                learning_rate: 1.0,
            },
            ModelParams::LogisticRegression {
                alpha: 0.01,
                learning_rate: 0.1,
                max_iter: 1000,
            },
        ];

        for params in candidates {
            let mut clf = params.build();
            assert_eq!(clf.family(), params.family());
            clf.fit(&x, &y).unwrap();
            let score = clf.score(&x, &y).unwrap();
            assert!(score >= 0.5, "{:?} scored {}", clf.family(), score);
        }
    }
}
