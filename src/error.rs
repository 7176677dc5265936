//! Errors surfaced by the `azvm` command line.

use std::path::PathBuf;

use azvm_azure::types::AzureError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Azure(#[from] AzureError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid VM description {}: {source}", .path.display())]
    VmDescription {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
