//! Small file helpers shared across stages.

use crate::error::{PipelineError, Result};
use ndarray::Array2;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write any serializable value as YAML, creating parent directories.
pub fn write_yaml<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let text = serde_yaml::to_string(value)?;
    let mut file = File::create(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Read a YAML file into a typed value.
pub fn read_yaml<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let value = serde_yaml::from_str(&text)
        .map_err(|e| PipelineError::SerializationError(format!("{}: {}", path.display(), e)))?;
    Ok(value)
}

/// Persist a dense f64 array in compact binary form.
pub fn save_array(path: impl AsRef<Path>, array: &Array2<f64>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    bincode::serialize_into(writer, array)
        .map_err(|e| PipelineError::SerializationError(e.to_string()))?;
    Ok(())
}

/// Load an array written by [`save_array`].
pub fn load_array(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let array = bincode::deserialize_from(reader)
        .map_err(|e| PipelineError::SerializationError(e.to_string()))?;
    Ok(array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::BTreeMap;

    #[test]
    fn test_yaml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/report.yaml");
        let mut value = BTreeMap::new();
        value.insert("radius_mean".to_string(), 0.032_f64);
        write_yaml(&path, &value).unwrap();
        let back: BTreeMap<String, f64> = read_yaml(&path).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_array_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.bin");
        let arr = array![[1.0, 2.0, 0.0], [3.0, 4.0, 1.0]];
        save_array(&path, &arr).unwrap();
        let back = load_array(&path).unwrap();
        assert_eq!(back, arr);
    }
}
