//! Sotto: an off-chain engine for collusion-resistant encrypted voting
//!
//! This is the root crate that re-exports all sotto components for integration
//! testing and provides unified access to the engine.
//!
//! ## Architecture Overview
//!
//! Participants sign up on chain with a public key and a voice credit grant,
//! then publish encrypted, signed vote commands. The coordinator replays the
//! chain events into an in-memory state, decrypts and validates every command,
//! and applies them in batches processed newest first, so a later key change
//! invalidates any earlier coerced vote. Each batch yields circuit inputs
//! whose claimed state root is independently recomputed before the batch is
//! committed, and the final quadratic tally is cross-checked against a full
//! recount.
//!
//! ## Crate Organization
//!
//! - `sotto-hash`: Poseidon permutation over the BN254 scalar field
//! - `sotto-curve`: Baby Jubjub group operations
//! - `sotto-domain`: keys, commands, messages, state leaves and their codecs
//! - `sotto-tree`: incremental Merkle trees and witnesses
//! - `sotto-core`: the election state machine and batch processor
//! - `sotto-prover`: circuit input attestation by independent replay
//! - `sotto-chain`: event ingestion, the event log and the coordinator loop

// Re-export all crates for integration testing
pub use sotto_chain as chain;
pub use sotto_core as core;
pub use sotto_curve as curve;
pub use sotto_domain as domain;
pub use sotto_hash as hash;
pub use sotto_prover as prover;
pub use sotto_tree as tree;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    pub use sotto_chain::{
        ChainEvent, Coordinator, DryRunSubmitter, EventIngester, EventLog, MessageEvent,
        SignupEvent,
    };
    pub use sotto_core::{Election, ElectionParams, Period, TallyResult};
    pub use sotto_curve::{BabyJubjub, PointOps};
    pub use sotto_domain::{Command, Keypair, Message, PrivKey, PubKey, StateLeaf};
    pub use sotto_hash::{FieldHash, Poseidon};
    pub use sotto_prover::{ProofBridge, ReplayWitnessGenerator, WitnessGenerator};
    pub use sotto_tree::{IncrementalTree, MerkleWitness};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
