//! Dataset hub access
//!
//! Resolves `hf://` dataset locators and streams the file to disk over a
//! blocking HTTP client. Failures are fatal; there is no retry.

use crate::error::{PipelineError, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(120);

/// A parsed dataset location.
///
/// `hf://datasets/<org>/<name>/<path>` addresses a file inside a Hugging Face
/// dataset repository; plain `http(s)://` URLs pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocator {
    Hub {
        org: String,
        name: String,
        file: String,
    },
    Url(String),
}

impl DatasetLocator {
    /// Parse a locator string, rejecting malformed `hf://` forms.
    pub fn parse(source: &str) -> Result<Self> {
        if let Some(rest) = source.strip_prefix("hf://") {
            let rest = rest.strip_prefix("datasets/").ok_or_else(|| {
                PipelineError::ConfigError(format!(
                    "hub locator must start with hf://datasets/, got '{}'",
                    source
                ))
            })?;
            let mut parts = rest.splitn(3, '/');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(org), Some(name), Some(file))
                    if !org.is_empty() && !name.is_empty() && !file.is_empty() =>
                {
                    Ok(DatasetLocator::Hub {
                        org: org.to_string(),
                        name: name.to_string(),
                        file: file.to_string(),
                    })
                }
                _ => Err(PipelineError::ConfigError(format!(
                    "hub locator needs org/name/file, got '{}'",
                    source
                ))),
            }
        } else if source.starts_with("http://") || source.starts_with("https://") {
            Ok(DatasetLocator::Url(source.to_string()))
        } else {
            Err(PipelineError::ConfigError(format!(
                "unsupported dataset locator '{}'",
                source
            )))
        }
    }

    /// Resolve to a concrete download URL against the given hub endpoint.
    pub fn resolve(&self, endpoint: &str) -> String {
        match self {
            DatasetLocator::Hub { org, name, file } => format!(
                "{}/datasets/{}/{}/resolve/main/{}",
                endpoint.trim_end_matches('/'),
                org,
                name,
                file
            ),
            DatasetLocator::Url(url) => url.clone(),
        }
    }
}

/// Blocking HTTP client for dataset downloads.
///
/// The endpoint is injectable so tests can point it at a local server.
#[derive(Clone)]
pub struct HubClient {
    agent: ureq::Agent,
    endpoint: String,
}

impl Default for HubClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HubClient {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .build();
        Self {
            agent,
            endpoint: "https://huggingface.co".to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Stream the located file to `dest`, creating parent directories.
    pub fn download(&self, locator: &DatasetLocator, dest: &Path) -> Result<u64> {
        let url = locator.resolve(&self.endpoint);
        info!(url = %url, dest = %dest.display(), "Downloading dataset");

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| PipelineError::DownloadError(format!("{}: {}", url, e)))?;

        let mut reader = response.into_reader();
        let mut writer = BufWriter::new(File::create(dest)?);
        let bytes = std::io::copy(&mut reader, &mut writer)?;

        info!(bytes, "Download complete");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hub_locator() {
        let loc = DatasetLocator::parse("hf://datasets/acme/breast-cancer/breast_cancer.csv")
            .unwrap();
        assert_eq!(
            loc,
            DatasetLocator::Hub {
                org: "acme".to_string(),
                name: "breast-cancer".to_string(),
                file: "breast_cancer.csv".to_string(),
            }
        );
        assert_eq!(
            loc.resolve("https://huggingface.co"),
            "https://huggingface.co/datasets/acme/breast-cancer/resolve/main/breast_cancer.csv"
        );
    }

    #[test]
    fn test_parse_nested_file_path() {
        let loc = DatasetLocator::parse("hf://datasets/acme/bc/data/v2/raw.csv").unwrap();
        match loc {
            DatasetLocator::Hub { file, .. } => assert_eq!(file, "data/v2/raw.csv"),
            _ => panic!("expected hub locator"),
        }
    }

    #[test]
    fn test_plain_url_passthrough() {
        let loc = DatasetLocator::parse("https://example.com/data.csv").unwrap();
        assert_eq!(loc.resolve("https://huggingface.co"), "https://example.com/data.csv");
    }

    #[test]
    fn test_malformed_locators_rejected() {
        assert!(DatasetLocator::parse("hf://models/acme/bc/f.csv").is_err());
        assert!(DatasetLocator::parse("hf://datasets/acme/bc").is_err());
        assert!(DatasetLocator::parse("s3://bucket/data.csv").is_err());
    }
}
