//! Sotto Curve Arithmetic
//!
//! Group operations on Baby Jubjub, the twisted Edwards curve whose base
//! field is the BN254 scalar field. Key exchange and signatures run on this
//! curve precisely so that both can be re-verified inside a BN254 circuit.
//!
//! [`PointOps`] is the capability trait the rest of the workspace consumes;
//! [`BabyJubjub`] is the arkworks-backed default. Points are carried as plain
//! affine coordinate pairs so domain types stay independent of the backend.

pub mod babyjubjub;
pub mod errors;

pub use babyjubjub::BabyJubjub;
pub use errors::{CurveError, CurveResult};

use ark_ff::{BigInteger, PrimeField, UniformRand};

/// Coordinate field of Baby Jubjub (equals the BN254 scalar field).
pub type BaseField = ark_bn254::Fr;

/// Scalar field of the prime-order subgroup of Baby Jubjub.
pub type ScalarField = ark_ed_on_bn254::Fr;

/// An affine point given by its coordinates in the base field.
///
/// `(0, 1)` is the group identity. Construction does not validate curve
/// membership; use [`PointOps::validate`] before trusting untrusted input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: BaseField,
    pub y: BaseField,
}

impl Point {
    /// Create a point from raw coordinates without validation
    pub fn new(x: BaseField, y: BaseField) -> Self {
        Self { x, y }
    }
}

/// Group arithmetic over the prime-order subgroup of Baby Jubjub.
pub trait PointOps: Send + Sync {
    /// Check that a point lies on the curve and in the prime-order subgroup
    fn validate(&self, point: &Point) -> CurveResult<()>;

    /// Multiply the subgroup generator by a scalar
    fn mul_base(&self, scalar: &ScalarField) -> Point;

    /// Multiply a validated point by a scalar
    fn mul(&self, point: &Point, scalar: &ScalarField) -> CurveResult<Point>;

    /// Add two validated points
    fn add(&self, a: &Point, b: &Point) -> CurveResult<Point>;

    /// The group identity
    fn identity(&self) -> Point;
}

impl<T: PointOps + ?Sized> PointOps for &T {
    fn validate(&self, point: &Point) -> CurveResult<()> {
        (**self).validate(point)
    }

    fn mul_base(&self, scalar: &ScalarField) -> Point {
        (**self).mul_base(scalar)
    }

    fn mul(&self, point: &Point, scalar: &ScalarField) -> CurveResult<Point> {
        (**self).mul(point, scalar)
    }

    fn add(&self, a: &Point, b: &Point) -> CurveResult<Point> {
        (**self).add(a, b)
    }

    fn identity(&self) -> Point {
        (**self).identity()
    }
}

/// Sample a uniformly random subgroup scalar
pub fn random_scalar<R: ark_std::rand::Rng + ?Sized>(rng: &mut R) -> ScalarField {
    ScalarField::rand(rng)
}

/// Reduce a base field element into the scalar field.
///
/// Signature challenges are hashed in the base field and enter scalar
/// arithmetic through this reduction; signer and verifier must agree on it.
pub fn reduce_to_scalar(value: &BaseField) -> ScalarField {
    ScalarField::from_le_bytes_mod_order(&value.into_bigint().to_bytes_le())
}

/// Embed a scalar into the base field.
///
/// Injective because the subgroup order is smaller than the base field
/// modulus.
pub fn scalar_to_base(scalar: &ScalarField) -> BaseField {
    BaseField::from_le_bytes_mod_order(&scalar.into_bigint().to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_embedding_is_injective_on_samples() {
        let mut rng = ark_std::test_rng();

        for _ in 0..32 {
            let a = random_scalar(&mut rng);
            let b = random_scalar(&mut rng);
            if a != b {
                assert_ne!(scalar_to_base(&a), scalar_to_base(&b));
            }
        }
    }

    #[test]
    fn test_reduce_embed_roundtrip() {
        let mut rng = ark_std::test_rng();
        let s = random_scalar(&mut rng);

        // Embedding then reducing returns the original scalar
        assert_eq!(reduce_to_scalar(&scalar_to_base(&s)), s);
    }
}
