// src/error/types.rs
use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Which external collaborator an upstream failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    OverrideStore,
    OfflineDatabase,
    MetadataApi,
    Crossmap,
    SeriesMetadata,
    Indexer,
}

impl std::fmt::Display for Collaborator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collaborator::OverrideStore => write!(f, "override store"),
            Collaborator::OfflineDatabase => write!(f, "offline database"),
            Collaborator::MetadataApi => write!(f, "metadata api"),
            Collaborator::Crossmap => write!(f, "crossmap"),
            Collaborator::SeriesMetadata => write!(f, "series metadata"),
            Collaborator::Indexer => write!(f, "indexer"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{collaborator} unavailable: {message}")]
    Upstream {
        collaborator: Collaborator,
        message: String,
    },

    #[error("Operation timed out")]
    Timeout,

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    pub fn upstream(collaborator: Collaborator, message: impl Into<String>) -> Self {
        AppError::Upstream {
            collaborator,
            message: message.into(),
        }
    }

    /// True for failures that the pipeline recovers from by skipping a tier or query.
    pub fn is_upstream(&self) -> bool {
        matches!(self, AppError::Upstream { .. } | AppError::Timeout)
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout
    }
}

pub type AppResult<T> = Result<T, AppError>;
