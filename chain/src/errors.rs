//! Error types for event ingestion and coordination.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Core(#[from] sotto_core::CoreError),

    #[error("Prover error: {0}")]
    Prover(#[from] sotto_prover::ProverError),

    #[error("Signup at block {block}, log {log_index} arrived after voting began")]
    SignupAfterVoting { block: u64, log_index: u64 },

    #[error("Event log entry {position} is out of order")]
    UnsortedLog { position: usize },

    #[error("Event source failure: {0}")]
    Source(String),

    #[error("Batch submission failure: {0}")]
    Submit(String),
}

pub type ChainResult<T> = Result<T, ChainError>;
