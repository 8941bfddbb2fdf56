//! Fitted preprocessing object shared by training and inference.

use crate::error::{PipelineError, Result};
use crate::transform::power::PowerTransformer;
use crate::transform::scaler::StandardScaler;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Composed feature preprocessor: Yeo-Johnson, then z-score standardization,
/// over a fixed list of selected columns.
///
/// Fit on the training split only; the same fitted object transforms test
/// and inference data. Output keeps exactly the selected columns, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    columns: Vec<String>,
    power: PowerTransformer,
    scaler: StandardScaler,
    is_fitted: bool,
}

impl Preprocessor {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            power: PowerTransformer::new(),
            scaler: StandardScaler::new(),
            is_fitted: false,
        }
    }

    /// Selected feature columns, in output order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Selected columns cast to Float64, in declared order.
    fn select(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut cols = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            let column = df
                .column(name)
                .map_err(|_| PipelineError::FeatureNotFound(name.to_string()))?;
            cols.push(column.cast(&DataType::Float64)?);
        }
        Ok(DataFrame::new(cols)?)
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let selected = self.select(df)?;
        let names: Vec<&str> = self.columns.iter().map(|s| s.as_str()).collect();

        let powered = self.power.fit_transform(&selected, &names)?;
        self.scaler.fit(&powered, &names)?;

        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PipelineError::ModelNotFitted);
        }
        let selected = self.select(df)?;
        let powered = self.power.transform(&selected)?;
        self.scaler.transform(&powered)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Persist the fitted preprocessor as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let preprocessor = serde_json::from_reader(reader)?;
        Ok(preprocessor)
    }
}
