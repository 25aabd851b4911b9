//! Failure taxonomy for the acquisition subsystem.
//!
//! None of these abort a run: callers log them and leave the affected source,
//! video or clip out of the tree.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AcquisitionError>;

#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// The extractor could not enumerate a channel or playlist.
    #[error("could not resolve {source_url}: {message}")]
    Resolution { source_url: String, message: String },

    /// The extractor could not fetch media or metadata for a single video.
    #[error("could not download {url}: {message}")]
    Download { url: String, message: String },

    /// Extractor output lacked a field we rely on.
    #[error("extractor response for {url} is missing `{field}`")]
    MalformedResponse { url: String, field: &'static str },

    /// A clip could not be re-encoded.
    #[error("could not encode {}: {message}", path.display())]
    Encode { path: PathBuf, message: String },
}

impl AcquisitionError {
    pub fn resolution(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            source_url: source_url.into(),
            message: message.into(),
        }
    }

    pub fn download(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Download {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn malformed(url: impl Into<String>, field: &'static str) -> Self {
        Self::MalformedResponse {
            url: url.into(),
            field,
        }
    }

    pub fn encode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short label used as a structured logging field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution { .. } => "resolution",
            Self::Download { .. } => "download",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Encode { .. } => "encode",
        }
    }
}
