//! Contract sources and byte fetching.

use driveby_core::ContractLoadError;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Where a contract is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSource {
    /// Local file
    File(PathBuf),
    /// Remote `http://` or `https://` URL
    Url(String),
}

impl ContractSource {
    /// Classifies a user-supplied path or URL.
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ContractSource::Url(trimmed.to_string())
        } else {
            ContractSource::File(PathBuf::from(trimmed))
        }
    }

    /// Reads the raw contract bytes.
    pub async fn fetch(&self) -> Result<Vec<u8>, ContractLoadError> {
        match self {
            ContractSource::File(path) => {
                debug!(path = %path.display(), "Reading contract file");
                Ok(tokio::fs::read(path).await?)
            }
            ContractSource::Url(url) => {
                debug!(url = %url, "Fetching contract");
                let response = reqwest::get(url)
                    .await
                    .map_err(|e| ContractLoadError::unreachable(url, e.to_string()))?;
                let status = response.status();
                if status != reqwest::StatusCode::OK {
                    return Err(ContractLoadError::unreachable(
                        url,
                        format!("unexpected status {}", status),
                    ));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| ContractLoadError::unreachable(url, e.to_string()))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl fmt::Display for ContractSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractSource::File(path) => write!(f, "{}", path.display()),
            ContractSource::Url(url) => f.write_str(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            ContractSource::parse("https://api.example.com/openapi.json"),
            ContractSource::Url("https://api.example.com/openapi.json".to_string())
        );
        assert_eq!(
            ContractSource::parse("specs/openapi.yaml"),
            ContractSource::File(PathBuf::from("specs/openapi.yaml"))
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = ContractSource::parse("/definitely/not/here.yaml");
        assert!(matches!(
            source.fetch().await,
            Err(ContractLoadError::Io(_))
        ));
    }
}
