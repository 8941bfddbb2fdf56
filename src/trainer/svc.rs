//! Support vector classifier trained with SMO.

use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Maximum number of samples for eager kernel matrix computation.
const MAX_KERNEL_MATRIX_SAMPLES: usize = 10_000;

/// Kernel function. Gamma is configured separately via [`Gamma`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    /// K(x, y) = x · y
    Linear,
    /// K(x, y) = (γ * x · y + r)^d
    Poly { degree: usize, coef0: f64 },
    /// K(x, y) = exp(-γ * ||x - y||²)
    Rbf,
    /// K(x, y) = tanh(γ * x · y + r)
    Sigmoid { coef0: f64 },
}

/// Kernel coefficient, resolved against the training data at fit time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Gamma {
    /// 1 / (n_features * var(X))
    Scale,
    /// 1 / n_features
    Auto,
}

impl Gamma {
    fn resolve(&self, x: &Array2<f64>) -> f64 {
        let n_features = x.ncols() as f64;
        match self {
            Gamma::Auto => 1.0 / n_features,
            Gamma::Scale => {
                let n = x.len() as f64;
                let mean = x.sum() / n;
                let var = x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                if var > 0.0 {
                    1.0 / (n_features * var)
                } else {
                    1.0 / n_features
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvcConfig {
    /// Regularization strength
    pub c: f64,
    pub kernel: Kernel,
    pub gamma: Gamma,
    /// KKT tolerance for the stopping criterion
    pub tol: f64,
    pub max_iter: usize,
    pub random_state: Option<u64>,
}

impl Default for SvcConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            kernel: Kernel::Rbf,
            gamma: Gamma::Scale,
            tol: 1e-3,
            max_iter: 1000,
            random_state: Some(42),
        }
    }
}

/// Binary support vector classifier over {0, 1} labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Svc {
    config: SvcConfig,
    support_vectors: Option<Array2<f64>>,
    alphas: Option<Array1<f64>>,
    support_labels: Option<Array1<f64>>,
    bias: f64,
    /// Gamma resolved at fit time
    gamma_value: f64,
    is_fitted: bool,
}

impl Svc {
    pub fn new(config: SvcConfig) -> Self {
        Self {
            config,
            support_vectors: None,
            alphas: None,
            support_labels: None,
            bias: 0.0,
            gamma_value: 1.0,
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n = x.nrows();
        if n > MAX_KERNEL_MATRIX_SAMPLES {
            return Err(PipelineError::InvalidInput(format!(
                "dataset has {} samples, exceeding the maximum {} for the kernel matrix",
                n, MAX_KERNEL_MATRIX_SAMPLES
            )));
        }
        for (i, &v) in y.iter().enumerate() {
            if v != 0.0 && v != 1.0 {
                return Err(PipelineError::InvalidInput(format!(
                    "binary SVC requires 0/1 labels, sample {} has label {}",
                    i, v
                )));
            }
        }
        if y.iter().all(|&v| v == 0.0) || y.iter().all(|&v| v == 1.0) {
            return Err(PipelineError::InvalidInput(
                "SVC requires both classes in the training data".to_string(),
            ));
        }

        self.gamma_value = self.config.gamma.resolve(x);

        // SMO works on ±1 labels.
        let y_signed: Array1<f64> = y.mapv(|v| if v == 1.0 { 1.0 } else { -1.0 });
        let (alphas, bias, support_indices) = self.smo_train(x, &y_signed)?;

        let sv_count = support_indices.len();
        let mut support_vectors = Array2::zeros((sv_count, x.ncols()));
        let mut support_labels = Array1::zeros(sv_count);
        let mut support_alphas = Array1::zeros(sv_count);
        for (i, &idx) in support_indices.iter().enumerate() {
            support_vectors.row_mut(i).assign(&x.row(idx));
            support_labels[i] = y_signed[idx];
            support_alphas[i] = alphas[idx];
        }

        self.support_vectors = Some(support_vectors);
        self.support_labels = Some(support_labels);
        self.alphas = Some(support_alphas);
        self.bias = bias;
        self.is_fitted = true;
        Ok(())
    }

    fn smo_train(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(Array1<f64>, f64, Vec<usize>)> {
        let n = x.nrows();
        let mut alphas = Array1::zeros(n);
        let mut bias = 0.0;

        let kernel_matrix = self.compute_kernel_matrix(x);

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        let mut passes = 0;
        let max_passes = 5;
        let mut total_iter = 0;

        while passes < max_passes && total_iter < self.config.max_iter {
            let mut num_changed = 0;

            if n <= 1 {
                break;
            }

            for i in 0..n {
                let e_i = Self::decision_cached(&kernel_matrix, &alphas, y, bias, i) - y[i];

                if (y[i] * e_i < -self.config.tol && alphas[i] < self.config.c)
                    || (y[i] * e_i > self.config.tol && alphas[i] > 0.0)
                {
                    let j = loop {
                        let j = rng.gen_range(0..n);
                        if j != i {
                            break j;
                        }
                    };

                    let e_j = Self::decision_cached(&kernel_matrix, &alphas, y, bias, j) - y[j];

                    let alpha_i_old = alphas[i];
                    let alpha_j_old = alphas[j];

                    let (l, h) = if y[i] != y[j] {
                        (
                            (alphas[j] - alphas[i]).max(0.0),
                            (self.config.c + alphas[j] - alphas[i]).min(self.config.c),
                        )
                    } else {
                        (
                            (alphas[i] + alphas[j] - self.config.c).max(0.0),
                            (alphas[i] + alphas[j]).min(self.config.c),
                        )
                    };

                    if (l - h).abs() < 1e-10 {
                        continue;
                    }

                    let eta =
                        2.0 * kernel_matrix[[i, j]] - kernel_matrix[[i, i]] - kernel_matrix[[j, j]];
                    if eta >= 0.0 {
                        continue;
                    }

                    alphas[j] -= y[j] * (e_i - e_j) / eta;
                    alphas[j] = alphas[j].max(l).min(h);

                    if (alphas[j] - alpha_j_old).abs() < 1e-5 {
                        continue;
                    }

                    alphas[i] += y[i] * y[j] * (alpha_j_old - alphas[j]);

                    let b1 = bias
                        - e_i
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, i]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[i, j]];
                    let b2 = bias
                        - e_j
                        - y[i] * (alphas[i] - alpha_i_old) * kernel_matrix[[i, j]]
                        - y[j] * (alphas[j] - alpha_j_old) * kernel_matrix[[j, j]];

                    bias = if alphas[i] > 0.0 && alphas[i] < self.config.c {
                        b1
                    } else if alphas[j] > 0.0 && alphas[j] < self.config.c {
                        b2
                    } else {
                        (b1 + b2) / 2.0
                    };

                    num_changed += 1;
                }
            }

            total_iter += 1;
            if num_changed == 0 {
                passes += 1;
            } else {
                passes = 0;
            }
        }

        let support_indices: Vec<usize> = alphas
            .iter()
            .enumerate()
            .filter(|(_, &a)| a > 1e-8)
            .map(|(i, _)| i)
            .collect();

        Ok((alphas, bias, support_indices))
    }

    fn compute_kernel_matrix(&self, x: &Array2<f64>) -> Array2<f64> {
        let n = x.nrows();
        let mut k = Array2::zeros((n, n));
        for i in 0..n {
            for j in i..n {
                let val = self.kernel(&x.row(i).to_owned(), &x.row(j).to_owned());
                k[[i, j]] = val;
                k[[j, i]] = val;
            }
        }
        k
    }

    fn kernel(&self, x1: &Array1<f64>, x2: &Array1<f64>) -> f64 {
        let gamma = self.gamma_value;
        match self.config.kernel {
            Kernel::Linear => x1.dot(x2),
            Kernel::Poly { degree, coef0 } => {
                (gamma * x1.dot(x2) + coef0).powi(degree.min(i32::MAX as usize) as i32)
            }
            Kernel::Rbf => {
                let diff = x1 - x2;
                (-gamma * diff.dot(&diff)).exp()
            }
            Kernel::Sigmoid { coef0 } => (gamma * x1.dot(x2) + coef0).tanh(),
        }
    }

    fn decision_cached(
        k: &Array2<f64>,
        alphas: &Array1<f64>,
        y: &Array1<f64>,
        bias: f64,
        idx: usize,
    ) -> f64 {
        let mut sum = 0.0;
        for i in 0..alphas.len() {
            sum += alphas[i] * y[i] * k[[i, idx]];
        }
        sum + bias
    }

    fn score_sample(&self, sample: &Array1<f64>) -> Result<f64> {
        let sv = self.support_vectors.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        let alphas = self.alphas.as_ref().ok_or(PipelineError::ModelNotFitted)?;
        let labels = self.support_labels.as_ref().ok_or(PipelineError::ModelNotFitted)?;

        let mut sum = self.bias;
        for j in 0..sv.nrows() {
            sum += alphas[j] * labels[j] * self.kernel(sample, &sv.row(j).to_owned());
        }
        Ok(sum)
    }

    /// Predict 0/1 class labels.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        let mut predictions = Array1::zeros(x.nrows());
        for i in 0..x.nrows() {
            let score = self.score_sample(&x.row(i).to_owned())?;
            predictions[i] = if score >= 0.0 { 1.0 } else { 0.0 };
        }
        Ok(predictions)
    }

    /// Signed distance to the separating surface.
    pub fn decision_function(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        let mut scores = Array1::zeros(x.nrows());
        for i in 0..x.nrows() {
            scores[i] = self.score_sample(&x.row(i).to_owned())?;
        }
        Ok(scores)
    }

    pub fn n_support_vectors(&self) -> usize {
        self.support_vectors.as_ref().map(|sv| sv.nrows()).unwrap_or(0)
    }
}
