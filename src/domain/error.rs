use thiserror::Error;

use super::{gateway::GatewayError, store::StoreError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether the surrounding job queue should retry with backoff.
    /// Store failures are retried because reconciliation is idempotent;
    /// validation failures never resolve on their own.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Gateway(e) => e.is_transient(),
            Self::Store(_) => true,
            Self::Validation(_) | Self::Serialization(_) => false,
        }
    }
}
