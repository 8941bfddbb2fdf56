//! Yeo-Johnson power transform.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-column Yeo-Johnson transform with maximum-likelihood lambda.
///
/// Unlike Box-Cox it is defined for zero and negative inputs, so no shift
/// is needed. Lambda is estimated on fit by a grid search over [-2, 2].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerTransformer {
    lambdas: HashMap<String, f64>,
    is_fitted: bool,
}

impl Default for PowerTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerTransformer {
    pub fn new() -> Self {
        Self {
            lambdas: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Estimate a lambda for each column from the training data.
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
            let values: Vec<f64> = column
                .as_materialized_series()
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .into_iter()
                .flatten()
                .collect();
            if values.is_empty() {
                return Err(PipelineError::DataError(format!(
                    "column '{}' has no values to fit",
                    col_name
                )));
            }
            let lambda = estimate_lambda(&values);
            self.lambdas.insert(col_name.to_string(), lambda);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted per-column transforms.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, &lambda) in &self.lambdas {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
            let transformed: Float64Chunked = column
                .as_materialized_series()
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .into_iter()
                .map(|opt| opt.map(|x| yeo_johnson(x, lambda)))
                .collect();
            result = result
                .with_column(transformed.with_name(col_name.as_str().into()).into_series())?
                .clone();
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn lambda(&self, column: &str) -> Option<f64> {
        self.lambdas.get(column).copied()
    }
}

/// Yeo-Johnson transform of a single value.
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < 1e-10 {
            (x + 1.0).ln()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < 1e-10 {
        -((-x + 1.0).ln())
    } else {
        -(((-x + 1.0).powf(2.0 - lambda) - 1.0) / (2.0 - lambda))
    }
}

/// Grid search for the lambda maximizing the Yeo-Johnson log-likelihood.
fn estimate_lambda(values: &[f64]) -> f64 {
    let mut best_lambda = 1.0;
    let mut best_ll = f64::NEG_INFINITY;

    for step in -40..=40 {
        let lambda = step as f64 * 0.05;
        let ll = log_likelihood(values, lambda);
        if ll > best_ll {
            best_ll = ll;
            best_lambda = lambda;
        }
    }

    best_lambda
}

fn log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();

    let mean = transformed.iter().sum::<f64>() / n;
    let variance = transformed.iter().map(|&t| (t - mean).powi(2)).sum::<f64>() / n;
    if variance <= 0.0 {
        return f64::NEG_INFINITY;
    }

    let log_jacobian: f64 = values.iter().map(|&x| (x.abs() + 1.0).ln().copysign(x)).sum();
    -n / 2.0 * variance.ln() + (lambda - 1.0) * log_jacobian
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_at_lambda_one() {
        assert!((yeo_johnson(3.0, 1.0) - 3.0).abs() < 1e-12);
        assert!((yeo_johnson(-2.0, 1.0) - (-2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_log_branch_at_lambda_zero() {
        assert!((yeo_johnson(1.0, 0.0) - 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_negative_branch_at_lambda_two() {
        assert!((yeo_johnson(-1.0, 2.0) - (-(2.0_f64.ln()))).abs() < 1e-12);
    }

    #[test]
    fn test_skewed_data_gets_compressive_lambda() {
        // Strongly right-skewed data wants lambda < 1.
        let values: Vec<f64> = (0..100).map(|i| (i as f64 / 10.0).exp()).collect();
        let lambda = estimate_lambda(&values);
        assert!(lambda < 0.5, "lambda = {}", lambda);
    }

    #[test]
    fn test_fit_transform_reduces_skew() {
        let values: Vec<f64> = (1..=200).map(|i| (i as f64 * 0.05).exp()).collect();
        let df = df! { "x" => &values }.unwrap();

        let mut pt = PowerTransformer::new();
        let out = pt.fit_transform(&df, &["x"]).unwrap();

        let skew = |v: &[f64]| {
            let n = v.len() as f64;
            let mean = v.iter().sum::<f64>() / n;
            let std = (v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
            v.iter().map(|x| ((x - mean) / std).powi(3)).sum::<f64>() / n
        };

        let after: Vec<f64> = out
            .column("x")
            .unwrap()
            .f64()
            .unwrap()
            .into_iter()
            .flatten()
            .collect();
        assert!(skew(&after).abs() < skew(&values).abs());
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = df! { "x" => [1.0, 2.0] }.unwrap();
        let pt = PowerTransformer::new();
        assert!(matches!(
            pt.transform(&df),
            Err(PipelineError::ModelNotFitted)
        ));
    }
}
