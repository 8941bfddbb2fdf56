//! Stratified k-fold splitting for the hyperparameter search.

use crate::error::{PipelineError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/validation split.
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold: every fold keeps roughly the training class mix.
pub struct StratifiedKFold {
    n_splits: usize,
    random_state: Option<u64>,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits,
            random_state: None,
        }
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(PipelineError::ValidationError(
                "n_splits must be at least 2".to_string(),
            ));
        }

        // Group sample indices by class, deterministically ordered.
        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &val) in y.iter().enumerate() {
            class_indices.entry(val.round() as i64).or_default().push(idx);
        }

        for (class, indices) in &class_indices {
            if indices.len() < self.n_splits {
                return Err(PipelineError::ValidationError(format!(
                    "class {} has {} samples, fewer than {} folds",
                    class,
                    indices.len(),
                    self.n_splits
                )));
            }
        }

        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        for indices in class_indices.values_mut() {
            indices.shuffle(&mut rng);
        }

        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for indices in class_indices.values() {
            for (i, &idx) in indices.iter().enumerate() {
                folds[i % self.n_splits].push(idx);
            }
        }

        let mut splits = Vec::with_capacity(self.n_splits);
        for fold_idx in 0..self.n_splits {
            let test_indices = folds[fold_idx].clone();
            let train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();
            splits.push(CvSplit {
                train_indices,
                test_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }
}

/// Per-fold scores of one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvScores {
    pub scores: Vec<f64>,
    pub mean_score: f64,
    pub std_score: f64,
}

impl CvScores {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len();
        let mean_score = scores.iter().sum::<f64>() / n as f64;
        let variance = scores.iter().map(|s| (s - mean_score).powi(2)).sum::<f64>() / n as f64;
        Self {
            scores,
            mean_score,
            std_score: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_cover_all_samples() {
        let y = Array1::from_vec((0..50).map(|i| (i % 2) as f64).collect());
        let cv = StratifiedKFold::new(5).with_random_state(42);
        let splits = cv.split(&y).unwrap();

        assert_eq!(splits.len(), 5);
        let mut all_test: Vec<usize> =
            splits.iter().flat_map(|s| s.test_indices.clone()).collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_folds_keep_class_mix() {
        // 40 of class 0, 10 of class 1
        let y = Array1::from_vec(
            (0..50).map(|i| if i < 40 { 0.0 } else { 1.0 }).collect(),
        );
        let cv = StratifiedKFold::new(5).with_random_state(0);
        let splits = cv.split(&y).unwrap();

        for split in &splits {
            let positives = split
                .test_indices
                .iter()
                .filter(|&&i| y[i] == 1.0)
                .count();
            assert_eq!(positives, 2);
            assert_eq!(split.test_indices.len(), 10);
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let y = Array1::from_vec((0..30).map(|i| (i % 2) as f64).collect());
        let a = StratifiedKFold::new(3).with_random_state(7).split(&y).unwrap();
        let b = StratifiedKFold::new(3).with_random_state(7).split(&y).unwrap();
        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.test_indices, sb.test_indices);
        }
    }

    #[test]
    fn test_too_few_samples_per_class() {
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0]);
        let cv = StratifiedKFold::new(3);
        assert!(cv.split(&y).is_err());
    }

    #[test]
    fn test_cv_scores_stats() {
        let scores = CvScores::from_scores(vec![0.8, 0.9, 1.0]);
        assert!((scores.mean_score - 0.9).abs() < 1e-12);
        assert!(scores.std_score > 0.0);
    }
}
