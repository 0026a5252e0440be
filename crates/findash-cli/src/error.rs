use thiserror::Error;

use findash_core::{ConfigError, FetchError, ValidationError};

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Config(_) => 2,
            Self::Fetch(FetchError::Validation(_)) => 2,
            Self::Fetch(FetchError::FetchFailure { .. }) => 3,
            Self::Fetch(FetchError::SchemaMismatch { .. }) => 4,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
