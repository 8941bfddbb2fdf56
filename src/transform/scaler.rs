//! Z-score standardization.

use crate::error::{PipelineError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    mean: f64,
    std: f64,
}

/// Standard scaler: `(x - mean) / std` per column, fitted on train data only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    params: HashMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
            let ca = column
                .as_materialized_series()
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .clone();

            let mean = ca.mean().unwrap_or(0.0);
            let std = ca.std(1).unwrap_or(1.0);
            self.params.insert(
                col_name.to_string(),
                ScalerParams {
                    mean,
                    // Constant columns pass through unscaled.
                    std: if std == 0.0 { 1.0 } else { std },
                },
            );
        }

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, params) in &self.params {
            let column = df
                .column(col_name)
                .map_err(|_| PipelineError::FeatureNotFound(col_name.to_string()))?;
            let scaled: Float64Chunked = column
                .as_materialized_series()
                .f64()
                .map_err(|e| PipelineError::DataError(e.to_string()))?
                .into_iter()
                .map(|opt| opt.map(|v| (v - params.mean) / params.std))
                .collect();
            result = result
                .with_column(scaled.with_name(col_name.as_str().into()).into_series())?
                .clone();
        }

        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }
}
