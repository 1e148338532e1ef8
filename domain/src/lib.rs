//! Sotto Protocol Objects
//!
//! The value types every other crate speaks: keypairs and shared keys on
//! Baby Jubjub, signed vote commands, encrypted messages and state leaves.
//! Encoding rules live here so the engine, the prover and the CLI cannot
//! drift apart on the wire format.
//!
//! A command is seven field elements, its signature three more; together
//! they fill the ten ciphertext words of a [`Message`].

pub mod command;
pub mod errors;
pub mod keys;
pub mod message;
pub mod ser;
pub mod state_leaf;

pub use command::{sign_digest, verify_digest, Command, Signature, COMMAND_LENGTH};
pub use errors::{DomainError, DomainResult};
pub use keys::{ecdh, Keypair, PrivKey, PubKey, SharedKey};
pub use message::{decrypt, encrypt, Message, MESSAGE_LENGTH};
pub use state_leaf::StateLeaf;

/// Coordinate field for all protocol words (BN254 scalar field).
pub type Field = sotto_curve::BaseField;
