//! Sotto Merkle Accumulators
//!
//! Fixed-depth binary Merkle trees over field elements, used for the state
//! tree, the message tree and each participant's vote option tree. Trees are
//! append-only for signups and messages, and support in-place leaf updates
//! during batch processing.

pub mod errors;
pub mod merkle;

pub use errors::{TreeError, TreeResult};
pub use merkle::{IncrementalTree, MerkleWitness};
