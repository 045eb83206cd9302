//! Error types for pkpass.
//!
//! Every pipeline stage returns [`Result`]; the orchestrator wraps the first
//! failure in a [`PipelineError`] naming the stage that produced it.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub use crate::core::pipeline::PipelineError;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid credential source: {0}")]
    InvalidCredentialSource(String),

    #[error("invalid asset name '{name}': {reason}")]
    InvalidAssetName { name: String, reason: &'static str },

    #[error("invalid output name '{0}': must be a bare file name")]
    InvalidOutputName(String),

    #[error("failed to read {name} ({}): {source}", path.display())]
    FileRead {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("failed to create archive {}: {source}", path.display())]
    ArchiveCreation {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("failed to read archive {}: {source}", path.display())]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("{} failed inspection", .0.display())]
    InspectionFailed(PathBuf),

    #[error("password prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Failures reported by a [`Signer`](crate::core::signer::Signer).
#[derive(Error, Debug)]
pub enum SigningError {
    #[error("{0} not found on PATH. Install OpenSSL from https://www.openssl.org/")]
    ToolNotFound(String),

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool exited unsuccessfully; `stderr` is its diagnostic, unmodified.
    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("signature file {} is missing or empty", .0.display())]
    EmptySignature(PathBuf),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Failure raised by an in-process backend.
    #[error("{0}")]
    Backend(String),
}

/// Configuration file errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("environment variable {0} is not set")]
    MissingEnv(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Signing failure, if this error (or the stage error it wraps) is one.
    pub fn as_signing(&self) -> Option<&SigningError> {
        match self {
            Error::Signing(e) => Some(e),
            Error::Pipeline(p) => p.error().as_signing(),
            _ => None,
        }
    }
}
