use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ModError {
    #[error("I/O error: {0}")]
    IOError(String),
    #[error("{0}")]
    ParseError(String),
    #[error("Archive error: {0}")]
    ArchiveError(String),
    #[error("No manifest found in {0}")]
    ManifestNotFound(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Remote store error: {0}")]
    Remote(String),
    #[error("Operation cancelled")]
    Cancelled,
    #[error("Unexpected error{}", .0.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unexpected(Option<String>),
}

impl From<std::io::Error> for ModError {
    fn from(e: std::io::Error) -> Self {
        ModError::IOError(e.to_string())
    }
}

impl From<serde_json::Error> for ModError {
    fn from(e: serde_json::Error) -> Self {
        ModError::ParseError(e.to_string())
    }
}

impl From<zip::result::ZipError> for ModError {
    fn from(e: zip::result::ZipError) -> Self {
        ModError::ArchiveError(e.to_string())
    }
}

impl From<toml::de::Error> for ModError {
    fn from(e: toml::de::Error) -> Self {
        ModError::ParseError(e.to_string())
    }
}

impl From<toml::ser::Error> for ModError {
    fn from(e: toml::ser::Error) -> Self {
        ModError::ParseError(e.to_string())
    }
}

impl From<ureq::Error> for ModError {
    fn from(e: ureq::Error) -> Self {
        ModError::Remote(e.to_string())
    }
}
