//! AdaBoost classifier over decision stumps.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A single decision stump: splits on one feature at one threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature_index: usize,
    threshold: f64,
    /// Prediction when feature <= threshold
    left_label: f64,
    /// Prediction when feature > threshold
    right_label: f64,
}

impl Stump {
    fn predict_sample(&self, sample: &[f64]) -> f64 {
        if sample[self.feature_index] <= self.threshold {
            self.left_label
        } else {
            self.right_label
        }
    }
}

/// Binary AdaBoost classifier (SAMME weight updates).
///
/// Each boosting round fits the stump minimizing the weighted error, then
/// reweights misclassified samples before the next round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoost {
    pub n_estimators: usize,
    pub learning_rate: f64,
    stumps: Vec<Stump>,
    alphas: Vec<f64>,
    is_fitted: bool,
}

impl Default for AdaBoost {
    fn default() -> Self {
        Self::new(50, 1.0)
    }
}

impl AdaBoost {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            stumps: Vec::new(),
            alphas: Vec::new(),
            is_fitted: false,
        }
    }

    /// Best stump for the current sample weights.
    fn fit_stump(x: &Array2<f64>, y: &Array1<f64>, weights: &Array1<f64>) -> Stump {
        let n_samples = x.nrows();

        let mut best_stump = Stump {
            feature_index: 0,
            threshold: 0.0,
            left_label: 0.0,
            right_label: 1.0,
        };
        let mut best_error = f64::MAX;

        for f in 0..x.ncols() {
            let col = x.column(f);
            let mut vals: Vec<f64> = col.to_vec();
            vals.sort_by(|a, b| a.total_cmp(b));
            vals.dedup();

            for w in vals.windows(2) {
                let threshold = (w[0] + w[1]) / 2.0;

                for (left_label, right_label) in [(0.0, 1.0), (1.0, 0.0)] {
                    let mut error = 0.0;
                    for i in 0..n_samples {
                        let pred = if col[i] <= threshold {
                            left_label
                        } else {
                            right_label
                        };
                        if (pred - y[i]).abs() > 1e-10 {
                            error += weights[i];
                        }
                    }
                    if error < best_error {
                        best_error = error;
                        best_stump = Stump {
                            feature_index: f,
                            threshold,
                            left_label,
                            right_label,
                        };
                    }
                }
            }
        }
        best_stump
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(PipelineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        for (i, &v) in y.iter().enumerate() {
            if v != 0.0 && v != 1.0 {
                return Err(PipelineError::InvalidInput(format!(
                    "AdaBoost requires 0/1 labels, sample {} has label {}",
                    i, v
                )));
            }
        }

        let mut weights = Array1::from_elem(n_samples, 1.0 / n_samples as f64);
        self.stumps.clear();
        self.alphas.clear();

        for _round in 0..self.n_estimators {
            let stump = Self::fit_stump(x, y, &weights);

            let predictions: Vec<f64> = (0..n_samples)
                .map(|i| stump.predict_sample(&x.row(i).to_vec()))
                .collect();

            let mut error = 0.0;
            for i in 0..n_samples {
                if (predictions[i] - y[i]).abs() > 1e-10 {
                    error += weights[i];
                }
            }
            error = error.clamp(1e-15, 1.0 - 1e-15);

            let alpha = self.learning_rate * ((1.0 - error) / error).ln();

            // A stump no better than chance stops the boosting early.
            if alpha <= 0.0 {
                if self.stumps.is_empty() {
                    self.stumps.push(stump);
                    self.alphas.push(0.0);
                }
                break;
            }

            for i in 0..n_samples {
                if (predictions[i] - y[i]).abs() > 1e-10 {
                    weights[i] *= alpha.exp();
                }
            }
            let w_sum = weights.sum();
            if w_sum > 0.0 {
                weights /= w_sum;
            }

            self.stumps.push(stump);
            self.alphas.push(alpha);
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let n_samples = x.nrows();
        let mut predictions = Array1::zeros(n_samples);

        for i in 0..n_samples {
            let row = x.row(i).to_vec();

            let mut score_one = 0.0;
            let mut score_zero = 0.0;
            for (stump, &alpha) in self.stumps.iter().zip(self.alphas.iter()) {
                if stump.predict_sample(&row) == 1.0 {
                    score_one += alpha;
                } else {
                    score_zero += alpha;
                }
            }
            predictions[i] = if score_one >= score_zero { 1.0 } else { 0.0 };
        }

        Ok(predictions)
    }

    pub fn score(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<f64> {
        let preds = self.predict(x)?;
        let correct = preds
            .iter()
            .zip(y.iter())
            .filter(|(p, a)| (*p - *a).abs() < 0.5)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }

    pub fn n_rounds(&self) -> usize {
        self.stumps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_data() {
        let x = array![
            [1.0, 2.0],
            [2.0, 3.0],
            [3.0, 4.0],
            [6.0, 7.0],
            [7.0, 8.0],
            [8.0, 9.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut model = AdaBoost::new(10, 1.0);
        model.fit(&x, &y).unwrap();
        let acc = model.score(&x, &y).unwrap();
        assert!(acc >= 0.99, "accuracy = {}", acc);
    }

    #[test]
    fn test_xor_needs_multiple_rounds() {
        // Not separable by a single stump.
        let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![0.0, 1.0, 1.0, 0.0];
        let mut model = AdaBoost::new(50, 1.0);
        model.fit(&x, &y).unwrap();
        assert!(model.n_rounds() >= 1);
        let preds = model.predict(&x).unwrap();
        assert_eq!(preds.len(), 4);
    }

    #[test]
    fn test_non_binary_labels_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 2.0];
        let mut model = AdaBoost::default();
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = AdaBoost::default();
        let x = array![[1.0, 2.0]];
        assert!(matches!(
            model.predict(&x),
            Err(PipelineError::ModelNotFitted)
        ));
    }
}
