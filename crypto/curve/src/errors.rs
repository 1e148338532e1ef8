//! Error types for curve operations

use thiserror::Error;

/// Errors that can occur during group arithmetic
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurveError {
    #[error("Point is not on the curve")]
    NotOnCurve,

    #[error("Point is not in the prime-order subgroup")]
    NotInSubgroup,
}

/// Result alias for curve operations
pub type CurveResult<T> = Result<T, CurveError>;
