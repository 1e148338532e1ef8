//! Error types for witness generation and attestation.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("Coordinator key does not match the batch inputs")]
    CoordinatorMismatch,

    #[error("Inconsistent inputs for batch {batch_index}, slot {slot}: {what}")]
    InconsistentInputs {
        batch_index: u64,
        slot: usize,
        what: String,
    },

    #[error("Inconsistent zero leaf inputs for batch {batch_index}: {what}")]
    ZeroLeafInputs { batch_index: u64, what: String },

    #[error(
        "State root mismatch for batch {batch_index}: engine claims {claimed}, \
         witness yields {recomputed}"
    )]
    RootMismatch {
        batch_index: u64,
        claimed: String,
        recomputed: String,
    },
}

pub type ProverResult<T> = Result<T, ProverError>;
