use crate::calculator::DistributionRow;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// Conflict, not a crash: the sale already carries a calculated row
    /// set and the caller did not ask for recalculation. The existing
    /// rows ride along so the caller can reconcile.
    #[error("Sale '{sale_id}' is already calculated")]
    AlreadyCalculated {
        sale_id: String,
        rows: Vec<DistributionRow>,
    },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("External dependency '{dependency}' failed: {message}")]
    ExternalDependency {
        dependency: &'static str,
        message: String,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(message: impl Into<String>) -> Self {
        EngineError::Validation {
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
