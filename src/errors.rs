use thiserror::Error;
use crate::providers::ProviderError;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    /// A multi-item job stopped at `item`; the `completed` items before it stay applied.
    #[error("{item}: {source}")]
    Job {
        item: String,
        completed: usize,
        source: ProviderError,
    },
}

impl AppError {
    /// Name of the item a job failed on, if this is a job failure
    pub fn failed_item(&self) -> Option<&str> {
        match self {
            AppError::Job { item, .. } => Some(item),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
