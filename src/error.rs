// ABOUTME: Application-wide error types for rokka.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::batch::BatchError;
use crate::client::ClientError;
use crate::types::OrganizationError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid organization name: {0}")]
    Organization(#[from] OrganizationError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
