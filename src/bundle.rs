//! Deployable model bundle.

use crate::error::{PipelineError, Result};
use crate::trainer::{Classifier, ModelFamily};
use crate::transform::Preprocessor;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Fitted preprocessor paired with the winning classifier.
///
/// Prediction takes raw rows (same columns as the training CSV) through the
/// full transform before classifying, so callers never re-implement the
/// feature pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    preprocessor: Preprocessor,
    classifier: Classifier,
    pub trained_at: DateTime<Utc>,
    pub format_version: u32,
}

impl ModelBundle {
    pub const FORMAT_VERSION: u32 = 1;

    pub fn new(preprocessor: Preprocessor, classifier: Classifier) -> Self {
        Self {
            preprocessor,
            classifier,
            trained_at: Utc::now(),
            format_version: Self::FORMAT_VERSION,
        }
    }

    pub fn family(&self) -> ModelFamily {
        self.classifier.family()
    }

    /// Predict 0/1 classes for raw, untransformed rows.
    pub fn predict(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let features = self.preprocessor.transform(df)?;
        let x = frame_to_array(&features)?;
        self.classifier.predict(&x)
    }

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
        let reader = BufReader::new(File::open(path.as_ref())?);
        let bundle: ModelBundle = serde_json::from_reader(reader)?;
        if bundle.format_version != Self::FORMAT_VERSION {
            return Err(PipelineError::SerializationError(format!(
                "unsupported bundle format version {}",
                bundle.format_version
            )));
        }
        Ok(bundle)
    }
}

fn frame_to_array(df: &DataFrame) -> Result<Array2<f64>> {
    let mut array = Array2::<f64>::zeros((df.height(), df.width()));
    for (j, column) in df.get_columns().iter().enumerate() {
        let ca = column
            .as_materialized_series()
            .f64()
            .map_err(|e| PipelineError::DataError(e.to_string()))?
            .clone();
        for (i, opt) in ca.into_iter().enumerate() {
            array[[i, j]] = opt.ok_or_else(|| {
                PipelineError::DataError(format!("null value in column '{}'", column.name()))
            })?;
        }
    }
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::LogisticRegression;
    use ndarray::Array1;

    fn fitted_bundle() -> (ModelBundle, DataFrame) {
        let a: Vec<f64> = (0..40)
            .map(|i| if i % 2 == 0 { -2.0 } else { 2.0 } + (i as f64 * 0.01))
            .collect();
        let df = df! { "a" => &a }.unwrap();

        let mut pre = Preprocessor::new(vec!["a".to_string()]);
        let features = pre.fit_transform(&df).unwrap();
        let x = frame_to_array(&features).unwrap();
        let y = Array1::from_iter((0..40).map(|i| (i % 2) as f64));

        let mut lr = LogisticRegression::new().with_max_iter(2000);
        lr.fit(&x, &y).unwrap();

        (
            ModelBundle::new(pre, Classifier::LogisticRegression(lr)),
            df,
        )
    }

    #[test]
    fn test_predict_from_raw_rows() {
        let (bundle, df) = fitted_bundle();
        let preds = bundle.predict(&df).unwrap();
        assert_eq!(preds.len(), 40);
        let correct = preds
            .iter()
            .enumerate()
            .filter(|(i, &p)| p == (*i % 2) as f64)
            .count();
        assert!(correct >= 36, "correct = {}", correct);
    }

    #[test]
    fn test_save_load_preserves_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let (bundle, df) = fitted_bundle();
        let before = bundle.predict(&df).unwrap();
        bundle.save(&path).unwrap();

        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.family(), ModelFamily::LogisticRegression);
        let after = loaded.predict(&df).unwrap();
        assert_eq!(before, after);
    }
}
