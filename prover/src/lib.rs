//! Batch witness generation and root attestation.
//!
//! The engine stages a batch and claims a post-batch state root; this
//! crate recomputes that root independently from the batch's circuit
//! inputs and refuses to attest any batch where the two disagree. The
//! replay generator stands where a proving backend would, consuming the
//! exact inputs a state transition circuit takes.

pub mod bridge;
pub mod errors;
pub mod witness;

pub use bridge::{ProofBridge, RootAttestation};
pub use errors::{ProverError, ProverResult};
pub use witness::{BatchWitness, ReplayWitnessGenerator, WitnessGenerator};
