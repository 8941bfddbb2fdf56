//! Randomized hyperparameter search with cross-validated scoring.

use crate::error::{PipelineError, Result};
use crate::trainer::cross_validation::{CvScores, StratifiedKFold};
use crate::trainer::model::{ModelFamily, ModelParams};
use crate::trainer::svc::{Gamma, Kernel, SvcConfig};
use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SVC_C_GRID: [f64; 4] = [0.1, 1.0, 10.0, 100.0];
const SVC_KERNELS: [Kernel; 4] = [
    Kernel::Linear,
    Kernel::Poly {
        degree: 3,
        coef0: 0.0,
    },
    Kernel::Rbf,
    Kernel::Sigmoid { coef0: 0.0 },
];
const SVC_GAMMAS: [Gamma; 2] = [Gamma::Scale, Gamma::Auto];

const ADABOOST_ESTIMATORS: [usize; 5] = [50, 60, 70, 80, 90];
const ADABOOST_LEARNING_RATES: [f64; 4] = [0.001, 0.01, 0.1, 1.0];

const LOGREG_ALPHAS: [f64; 4] = [0.0001, 0.001, 0.01, 0.1];
const LOGREG_LEARNING_RATES: [f64; 2] = [0.01, 0.1];
const LOGREG_MAX_ITERS: [usize; 2] = [1000, 2000];

/// Best candidate found for one model family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub family: ModelFamily,
    pub params: ModelParams,
    pub cv: CvScores,
}

/// Samples parameter combinations from a fixed grid and scores each with
/// stratified cross-validation, keeping the best mean accuracy.
pub struct RandomizedSearch {
    n_iter: usize,
    cv_folds: usize,
    random_state: u64,
}

impl RandomizedSearch {
    pub fn new(n_iter: usize, cv_folds: usize, random_state: u64) -> Self {
        Self {
            n_iter,
            cv_folds,
            random_state,
        }
    }

    fn sample_params(&self, family: ModelFamily, rng: &mut ChaCha8Rng) -> ModelParams {
        match family {
            ModelFamily::Svc => ModelParams::Svc(SvcConfig {
                c: *SVC_C_GRID.choose(rng).unwrap_or(&1.0),
                kernel: *SVC_KERNELS.choose(rng).unwrap_or(&Kernel::Rbf),
                gamma: *SVC_GAMMAS.choose(rng).unwrap_or(&Gamma::Scale),
                random_state: Some(self.random_state),
                ..Default::default()
            }),
            ModelFamily::AdaBoost => ModelParams::AdaBoost {
                n_estimators: *ADABOOST_ESTIMATORS.choose(rng).unwrap_or(&50),
                learning_rate: *ADABOOST_LEARNING_RATES.choose(rng).unwrap_or(&1.0),
            },
            ModelFamily::LogisticRegression => ModelParams::LogisticRegression {
                alpha: *LOGREG_ALPHAS.choose(rng).unwrap_or(&0.01),
                learning_rate: *LOGREG_LEARNING_RATES.choose(rng).unwrap_or(&0.1),
                max_iter: *LOGREG_MAX_ITERS.choose(rng).unwrap_or(&1000),
            },
        }
    }

    /// Mean cross-validated accuracy of one candidate.
    fn score_candidate(
        &self,
        params: &ModelParams,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<CvScores> {
        let splits = StratifiedKFold::new(self.cv_folds)
            .with_random_state(self.random_state)
            .split(y)?;

        let mut scores = Vec::with_capacity(splits.len());
        for split in &splits {
            let x_train = x.select(Axis(0), &split.train_indices);
            let y_train = Array1::from_iter(split.train_indices.iter().map(|&i| y[i]));
            let x_val = x.select(Axis(0), &split.test_indices);
            let y_val = Array1::from_iter(split.test_indices.iter().map(|&i| y[i]));

            let mut clf = params.build();
            clf.fit(&x_train, &y_train)?;
            scores.push(clf.score(&x_val, &y_val)?);
        }
        Ok(CvScores::from_scores(scores))
    }

    /// Search one family: sample candidates, score them in parallel, keep
    /// the best mean accuracy. The first-sampled candidate wins ties.
    pub fn search_family(
        &self,
        family: ModelFamily,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<SearchOutcome> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let candidates: Vec<ModelParams> = (0..self.n_iter)
            .map(|_| self.sample_params(family, &mut rng))
            .collect();

        let scored: Vec<(ModelParams, CvScores)> = candidates
            .into_par_iter()
            .map(|params| {
                let cv = self.score_candidate(&params, x, y)?;
                Ok((params, cv))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut best: Option<(ModelParams, CvScores)> = None;
        for (params, cv) in scored {
            debug!(
                family = family.name(),
                mean_score = cv.mean_score,
                "Scored candidate"
            );
            match &best {
                Some((_, best_cv)) if cv.mean_score <= best_cv.mean_score => {}
                _ => best = Some((params, cv)),
            }
        }

        let (params, cv) = best.ok_or_else(|| {
            PipelineError::FitError(format!("no candidate evaluated for {}", family.name()))
        })?;
        Ok(SearchOutcome { family, params, cv })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Separable 2-feature data, 60 rows.
    fn data() -> (Array2<f64>, Array1<f64>) {
        let n = 60;
        let mut rows = Vec::with_capacity(n * 2);
        let mut labels = Vec::with_capacity(n);
        for i in 0..n {
            let class = i % 2;
            let jitter = (i as f64 * 0.173) % 0.5;
            let center = if class == 0 { -2.0 } else { 2.0 };
            rows.push(center + jitter);
            rows.push(center - jitter);
            labels.push(class as f64);
        }
        (
            Array2::from_shape_vec((n, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_search_finds_accurate_candidate() {
        let (x, y) = data();
        let search = RandomizedSearch::new(4, 3, 42);
        let outcome = search
            .search_family(ModelFamily::LogisticRegression, &x, &y)
            .unwrap();
        assert_eq!(outcome.family, ModelFamily::LogisticRegression);
        assert!(outcome.cv.mean_score > 0.9, "mean = {}", outcome.cv.mean_score);
    }

    #[test]
    fn test_search_is_deterministic() {
        let (x, y) = data();
        let a = RandomizedSearch::new(4, 3, 7)
            .search_family(ModelFamily::AdaBoost, &x, &y)
            .unwrap();
        let b = RandomizedSearch::new(4, 3, 7)
            .search_family(ModelFamily::AdaBoost, &x, &y)
            .unwrap();
        assert_eq!(a.cv.mean_score, b.cv.mean_score);
        assert_eq!(a.cv.scores, b.cv.scores);
    }

    #[test]
    fn test_sample_params_stay_on_grid() {
        let search = RandomizedSearch::new(10, 5, 1);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..20 {
            match search.sample_params(ModelFamily::AdaBoost, &mut rng) {
                ModelParams::AdaBoost {
                    n_estimators,
                    learning_rate,
                } => {
                    assert!(ADABOOST_ESTIMATORS.contains(&n_estimators));
                    assert!(ADABOOST_LEARNING_RATES.contains(&learning_rate));
                }
                other => panic!("unexpected params: {:?}", other),
            }
        }
    }
}
