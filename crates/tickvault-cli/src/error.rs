use thiserror::Error;

use tickvault_core::DownloadError;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] tickvault_core::ValidationError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("command error: {0}")]
    Command(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Download(DownloadError::Validation(_)) => 2,
            Self::Download(DownloadError::UnregisteredCategory { .. }) => 2,
            Self::Download(DownloadError::TotalFailure { .. }) => 4,
            Self::Command(_) => 2,
            Self::Serialization(_) => 4,
            Self::Csv(_) => 4,
            Self::Io(_) => 10,
        }
    }
}
