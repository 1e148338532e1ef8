//! Keypairs and key agreement
//!
//! Users and the coordinator hold Baby Jubjub keypairs. A message is
//! encrypted under the ECDH secret between an ephemeral key and the
//! coordinator key, so only those two parties can read it.
//!
//! String forms use the `sottosk.` / `sottopk.` prefixes so keys cannot be
//! pasted into the wrong slot unnoticed.

use std::fmt;

use ark_ed_on_bn254::EdwardsAffine;
use ark_ff::{BigInteger, PrimeField};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use sotto_curve::{Point, PointOps, ScalarField};

use crate::errors::{DomainError, DomainResult};

/// Serialized private key prefix
pub const PRIV_KEY_PREFIX: &str = "sottosk.";

/// Serialized public key prefix
pub const PUB_KEY_PREFIX: &str = "sottopk.";

/// A private key: a scalar in the prime-order subgroup
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PrivKey(ScalarField);

impl PrivKey {
    /// Wrap an existing scalar
    pub fn from_scalar(scalar: ScalarField) -> Self {
        Self(scalar)
    }

    /// Sample a fresh private key
    pub fn random<R: ark_std::rand::Rng + ?Sized>(rng: &mut R) -> Self {
        Self(sotto_curve::random_scalar(rng))
    }

    /// The underlying scalar
    pub fn scalar(&self) -> &ScalarField {
        &self.0
    }

    /// Derive the matching public key
    pub fn public_key<C: PointOps>(&self, curve: &C) -> PubKey {
        PubKey(curve.mul_base(&self.0))
    }

    /// Serialize as `sottosk.<hex>`
    pub fn serialize(&self) -> String {
        let bytes = self.0.into_bigint().to_bytes_be();
        format!("{}{}", PRIV_KEY_PREFIX, hex::encode(bytes))
    }

    /// Parse a `sottosk.<hex>` string
    pub fn deserialize(input: &str) -> DomainResult<Self> {
        let body = input
            .strip_prefix(PRIV_KEY_PREFIX)
            .ok_or_else(|| DomainError::KeyEncoding("missing sottosk. prefix".into()))?;

        let bytes = hex::decode(body).map_err(|e| DomainError::KeyEncoding(e.to_string()))?;
        if bytes.len() > 32 {
            return Err(DomainError::KeyEncoding(format!(
                "expected at most 32 bytes, got {}",
                bytes.len()
            )));
        }

        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(&bytes);
        let scalar = ScalarField::from_be_bytes_mod_order(&padded);

        // Reject non-canonical values (>= subgroup order)
        if scalar.into_bigint().to_bytes_be() != padded {
            return Err(DomainError::KeyEncoding(
                "scalar exceeds the subgroup order".into(),
            ));
        }

        Ok(Self(scalar))
    }
}

impl fmt::Debug for PrivKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never log key material
        write!(f, "PrivKey(..)")
    }
}

/// A public key: a validated point on Baby Jubjub
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PubKey(pub Point);

impl PubKey {
    /// Wrap raw coordinates without validation
    pub fn from_point(point: Point) -> Self {
        Self(point)
    }

    /// The affine point
    pub fn point(&self) -> &Point {
        &self.0
    }

    /// Serialize as `sottopk.<hex>` (compressed point)
    pub fn serialize(&self) -> DomainResult<String> {
        let affine = EdwardsAffine::new_unchecked(self.0.x, self.0.y);
        let mut buf = Vec::with_capacity(32);
        affine
            .serialize_compressed(&mut buf)
            .map_err(|e| DomainError::KeyEncoding(e.to_string()))?;
        Ok(format!("{}{}", PUB_KEY_PREFIX, hex::encode(buf)))
    }

    /// Parse a `sottopk.<hex>` string, validating curve membership
    pub fn deserialize(input: &str) -> DomainResult<Self> {
        let body = input
            .strip_prefix(PUB_KEY_PREFIX)
            .ok_or_else(|| DomainError::KeyEncoding("missing sottopk. prefix".into()))?;

        let bytes = hex::decode(body).map_err(|e| DomainError::KeyEncoding(e.to_string()))?;
        let affine = EdwardsAffine::deserialize_compressed(bytes.as_slice())
            .map_err(|e| DomainError::KeyEncoding(e.to_string()))?;

        Ok(Self(Point::new(affine.x, affine.y)))
    }
}

/// A private/public keypair
#[derive(Clone, Debug)]
pub struct Keypair {
    pub priv_key: PrivKey,
    pub pub_key: PubKey,
}

impl Keypair {
    /// Generate a fresh keypair
    pub fn generate<C: PointOps, R: ark_std::rand::Rng + ?Sized>(curve: &C, rng: &mut R) -> Self {
        let priv_key = PrivKey::random(rng);
        let pub_key = priv_key.public_key(curve);
        Self { priv_key, pub_key }
    }

    /// Rebuild a keypair from a private key
    pub fn from_priv_key<C: PointOps>(curve: &C, priv_key: PrivKey) -> Self {
        let pub_key = priv_key.public_key(curve);
        Self { priv_key, pub_key }
    }
}

/// An ECDH shared secret, kept as a curve point
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SharedKey(pub Point);

/// Derive the ECDH shared key between a private and a public key.
///
/// Both sides of an exchange arrive at the same point:
/// `ecdh(a, B) == ecdh(b, A)`.
pub fn ecdh<C: PointOps>(curve: &C, priv_key: &PrivKey, pub_key: &PubKey) -> DomainResult<SharedKey> {
    let point = curve.mul(pub_key.point(), priv_key.scalar())?;
    Ok(SharedKey(point))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_curve::BabyJubjub;

    #[test]
    fn test_keypair_roundtrip() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let sk = keypair.priv_key.serialize();
        let pk = keypair.pub_key.serialize().unwrap();

        assert!(sk.starts_with(PRIV_KEY_PREFIX));
        assert!(pk.starts_with(PUB_KEY_PREFIX));

        let sk_back = PrivKey::deserialize(&sk).unwrap();
        let pk_back = PubKey::deserialize(&pk).unwrap();

        assert_eq!(sk_back, keypair.priv_key);
        assert_eq!(pk_back, keypair.pub_key);
    }

    #[test]
    fn test_priv_key_prefix_required() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let raw = keypair.priv_key.serialize().replace(PRIV_KEY_PREFIX, "");
        assert!(PrivKey::deserialize(&raw).is_err());
        assert!(PubKey::deserialize(&raw).is_err());
    }

    #[test]
    fn test_pub_key_matches_priv_key() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let derived = keypair.priv_key.public_key(&curve);
        assert_eq!(derived, keypair.pub_key);
    }

    #[test]
    fn test_ecdh_symmetry() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();

        let alice = Keypair::generate(&curve, &mut rng);
        let bob = Keypair::generate(&curve, &mut rng);

        let k1 = ecdh(&curve, &alice.priv_key, &bob.pub_key).unwrap();
        let k2 = ecdh(&curve, &bob.priv_key, &alice.pub_key).unwrap();

        assert_eq!(k1, k2);
    }

    #[test]
    fn test_debug_does_not_leak_scalar() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let rendered = format!("{:?}", keypair.priv_key);
        assert_eq!(rendered, "PrivKey(..)");
    }
}
