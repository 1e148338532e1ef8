//! Baby Jubjub backend over arkworks
//!
//! Wraps `ark-ed-on-bn254` behind [`PointOps`]. All scalar multiplication
//! stays inside the prime-order subgroup; cofactor components are rejected
//! at validation instead of being cleared silently.

use ark_ec::{AffineRepr, CurveGroup};
use ark_ed_on_bn254::{EdwardsAffine, EdwardsProjective};
use ark_ff::Zero;

use crate::errors::{CurveError, CurveResult};
use crate::{Point, PointOps, ScalarField};

/// Arkworks-backed Baby Jubjub arithmetic
#[derive(Clone, Copy, Debug, Default)]
pub struct BabyJubjub;

impl BabyJubjub {
    /// Create the default backend
    pub fn new() -> Self {
        Self
    }

    fn to_affine(point: &Point) -> CurveResult<EdwardsAffine> {
        let affine = EdwardsAffine::new_unchecked(point.x, point.y);
        if !affine.is_on_curve() {
            return Err(CurveError::NotOnCurve);
        }
        if !affine.is_in_correct_subgroup_assuming_on_curve() {
            return Err(CurveError::NotInSubgroup);
        }
        Ok(affine)
    }

    fn from_projective(point: EdwardsProjective) -> Point {
        let affine = point.into_affine();
        Point {
            x: affine.x,
            y: affine.y,
        }
    }
}

impl PointOps for BabyJubjub {
    fn validate(&self, point: &Point) -> CurveResult<()> {
        Self::to_affine(point).map(|_| ())
    }

    fn mul_base(&self, scalar: &ScalarField) -> Point {
        let result = EdwardsAffine::generator().into_group() * *scalar;
        Self::from_projective(result)
    }

    fn mul(&self, point: &Point, scalar: &ScalarField) -> CurveResult<Point> {
        let affine = Self::to_affine(point)?;
        Ok(Self::from_projective(affine.into_group() * *scalar))
    }

    fn add(&self, a: &Point, b: &Point) -> CurveResult<Point> {
        let a = Self::to_affine(a)?;
        let b = Self::to_affine(b)?;
        Ok(Self::from_projective(a.into_group() + b.into_group()))
    }

    fn identity(&self) -> Point {
        let zero = EdwardsAffine::zero();
        Point {
            x: zero.x,
            y: zero.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{random_scalar, BaseField};
    use ark_ff::One;

    #[test]
    fn test_generator_is_valid() {
        let curve = BabyJubjub::new();
        let generator = curve.mul_base(&ScalarField::one());

        assert!(curve.validate(&generator).is_ok());
    }

    #[test]
    fn test_identity_is_valid() {
        let curve = BabyJubjub::new();
        let identity = curve.identity();

        assert_eq!(identity.x, BaseField::zero());
        assert_eq!(identity.y, BaseField::one());
        assert!(curve.validate(&identity).is_ok());
    }

    #[test]
    fn test_add_identity_is_noop() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();

        let p = curve.mul_base(&random_scalar(&mut rng));
        let sum = curve.add(&p, &curve.identity()).unwrap();

        assert_eq!(sum, p);
    }

    #[test]
    fn test_scalar_mul_matches_repeated_add() {
        let curve = BabyJubjub::new();
        let g = curve.mul_base(&ScalarField::one());

        let doubled = curve.add(&g, &g).unwrap();
        let by_scalar = curve.mul_base(&ScalarField::from(2u64));

        assert_eq!(doubled, by_scalar);
    }

    #[test]
    fn test_diffie_hellman_symmetry() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();

        let a = random_scalar(&mut rng);
        let b = random_scalar(&mut rng);

        let pub_a = curve.mul_base(&a);
        let pub_b = curve.mul_base(&b);

        let shared_ab = curve.mul(&pub_b, &a).unwrap();
        let shared_ba = curve.mul(&pub_a, &b).unwrap();

        assert_eq!(shared_ab, shared_ba);
    }

    #[test]
    fn test_off_curve_point_rejected() {
        let curve = BabyJubjub::new();
        let bogus = Point::new(BaseField::from(3u64), BaseField::from(5u64));

        assert_eq!(curve.validate(&bogus), Err(CurveError::NotOnCurve));
        assert!(curve.mul(&bogus, &ScalarField::one()).is_err());
    }
}
