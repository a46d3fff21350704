//! TOML/JSON document loading shared by every configuration document.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported document format: {}", .0.display())]
    UnknownFormat(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocFormat {
    Toml,
    Json,
}

impl DocFormat {
    /// Picks the format from the file extension; `None` for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

pub fn parse_str<T: DeserializeOwned>(text: &str, format: DocFormat) -> Result<T, DocError> {
    Ok(match format {
        DocFormat::Toml => toml::from_str(text)?,
        DocFormat::Json => serde_json::from_str(text)?,
    })
}

pub fn load_path<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, DocError> {
    let path = path.as_ref();
    let format =
        DocFormat::from_path(path).ok_or_else(|| DocError::UnknownFormat(path.to_path_buf()))?;
    let text = fs::read_to_string(path).map_err(|source| DocError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_str(&text, format)
}
