//! Error types for protocol object encoding and decoding

use sotto_curve::CurveError;
use thiserror::Error;

/// Errors that can occur while building or decoding protocol objects
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Value does not fit the protocol encoding: {0}")]
    EncodingOverflow(String),

    #[error("Ciphertext does not decode to a well-formed command: {0}")]
    Decryption(String),

    #[error("Invalid key encoding: {0}")]
    KeyEncoding(String),

    #[error("Invalid public key: {0}")]
    InvalidKey(#[from] CurveError),
}

/// Result alias for protocol object operations
pub type DomainResult<T> = Result<T, DomainError>;
