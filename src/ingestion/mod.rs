//! Data ingestion stage
//!
//! Downloads the raw dataset into the feature store, then produces a
//! deterministic, seeded train/test split written back out as CSV.

mod hub;

pub use hub::{DatasetLocator, HubClient};

use crate::artifacts::IngestionArtifact;
use crate::config::IngestionConfig;
use crate::error::{PipelineError, Result};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;
use tracing::info;

pub const TRAIN_FILE: &str = "train.csv";
pub const TEST_FILE: &str = "test.csv";

/// Load a headered CSV into a DataFrame.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)?;
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()?;
    Ok(df)
}

/// Write a DataFrame as a headered CSV, creating parent directories.
pub fn write_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

/// Shuffle row indices with a seeded generator and cut off the test fraction.
///
/// Returns `(train_indices, test_indices)`. The same seed always yields the
/// same partition for a given row count. The rounded test count is clamped
/// to `1..=n_rows - 1`, so any ratio in (0, 1) leaves both sides non-empty.
pub fn split_indices(n_rows: usize, test_ratio: f64, seed: u64) -> Result<(Vec<u32>, Vec<u32>)> {
    if n_rows < 2 {
        return Err(PipelineError::DataError(format!(
            "cannot split {} rows into train and test",
            n_rows
        )));
    }
    let n_test = ((n_rows as f64 * test_ratio).ceil() as usize).clamp(1, n_rows - 1);

    let mut indices: Vec<u32> = (0..n_rows as u32).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test = indices[..n_test].to_vec();
    let train = indices[n_test..].to_vec();
    Ok((train, test))
}

/// Runs the ingestion stage: download, split, persist.
pub struct DataIngestion {
    config: IngestionConfig,
    client: HubClient,
}

impl DataIngestion {
    pub fn new(config: IngestionConfig, client: HubClient) -> Self {
        Self { config, client }
    }

    pub fn run(&self) -> Result<IngestionArtifact> {
        info!("Starting data ingestion");

        let locator = DatasetLocator::parse(&self.config.source_url)?;
        let feature_store_path = self
            .config
            .root_dir
            .join("feature_store")
            .join(&self.config.local_data_file);
        self.client.download(&locator, &feature_store_path)?;

        let df = read_csv(&feature_store_path)?;
        if df.height() == 0 {
            return Err(PipelineError::DataError(
                "downloaded dataset has no rows".to_string(),
            ));
        }
        info!(rows = df.height(), cols = df.width(), "Loaded raw dataset");

        let (train_idx, test_idx) = split_indices(
            df.height(),
            self.config.train_test_split_ratio,
            self.config.random_seed,
        )?;
        let mut train = df.take(&IdxCa::from_vec("idx".into(), train_idx))?;
        let mut test = df.take(&IdxCa::from_vec("idx".into(), test_idx))?;

        let ingested = self.config.root_dir.join("ingested");
        let train_path = ingested.join(TRAIN_FILE);
        let test_path = ingested.join(TEST_FILE);
        write_csv(&train_path, &mut train)?;
        write_csv(&test_path, &mut test)?;

        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            "Ingestion complete"
        );
        Ok(IngestionArtifact {
            feature_store_path,
            train_path,
            test_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_is_deterministic() {
        let (train_a, test_a) = split_indices(100, 0.2, 7).unwrap();
        let (train_b, test_b) = split_indices(100, 0.2, 7).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn test_split_sizes_and_disjoint() {
        let (train, test) = split_indices(101, 0.2, 42).unwrap();
        assert_eq!(test.len(), 21);
        assert_eq!(train.len(), 80);
        let mut all: Vec<u32> = train.iter().chain(test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<u32>>());
    }

    #[test]
    fn test_split_seed_changes_partition() {
        let (_, test_a) = split_indices(100, 0.2, 1).unwrap();
        let (_, test_b) = split_indices(100, 0.2, 2).unwrap();
        assert_ne!(test_a, test_b);
    }

    #[test]
    fn test_split_rejects_too_few_rows() {
        assert!(split_indices(0, 0.2, 0).is_err());
        assert!(split_indices(1, 0.2, 0).is_err());
        assert!(split_indices(2, 0.2, 0).is_ok());
    }

    #[test]
    fn test_extreme_ratios_clamp_to_valid_split() {
        // ceil(10 * 0.99) = 10 would empty the training side; the clamp
        // keeps one row on each side instead.
        let (train, test) = split_indices(10, 0.99, 0).unwrap();
        assert_eq!(train.len(), 1);
        assert_eq!(test.len(), 9);

        let (train, test) = split_indices(10, 0.001, 0).unwrap();
        assert_eq!(train.len(), 9);
        assert_eq!(test.len(), 1);
    }

    #[test]
    fn test_csv_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        let mut df = df! {
            "radius_mean" => [14.2, 20.1, 11.8],
            "diagnosis" => ["B", "M", "B"],
        }
        .unwrap();
        write_csv(&path, &mut df).unwrap();
        let back = read_csv(&path).unwrap();
        assert_eq!(back.shape(), (3, 2));
        assert_eq!(back.get_column_names()[0].as_str(), "radius_mean");
    }
}
