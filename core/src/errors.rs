//! Error types for the state engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid election parameters: {0}")]
    InvalidParams(String),

    #[error("Cannot {operation} during the {period} period")]
    WrongPeriod {
        operation: &'static str,
        period: &'static str,
    },

    #[error("Signup capacity exhausted ({capacity} participants)")]
    SignupCapacity { capacity: usize },

    #[error("Message capacity exhausted ({capacity} messages)")]
    MessageCapacity { capacity: usize },

    #[error("Expected batch {expected}, got batch {got}")]
    BatchOutOfOrder { expected: u64, got: u64 },

    #[error("All message batches have been processed")]
    ProcessingComplete,

    #[error("Staged batch {batch_index} no longer matches the engine state")]
    StaleBatch { batch_index: u64 },

    #[error("Tally accumulator diverged from the final vote records")]
    TallyMismatch,

    #[error("Tree operation failed: {0}")]
    Tree(#[from] sotto_tree::TreeError),

    #[error("Domain operation failed: {0}")]
    Domain(#[from] sotto_domain::DomainError),
}

pub type CoreResult<T> = Result<T, CoreError>;
