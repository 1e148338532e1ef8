//! Vote commands and their signatures
//!
//! A command says: as the user at `state_index`, replace my key with
//! `new_pub_key`, set my vote for `vote_option_index` to `new_vote_weight`,
//! with sequence number `nonce`. The salt blinds otherwise identical
//! commands. Commands are signed with a Schnorr-style signature over Baby
//! Jubjub whose challenge is a field hash, so the whole check can be
//! replayed in-circuit.

use sotto_curve::{reduce_to_scalar, scalar_to_base, Point, PointOps, ScalarField};
use sotto_hash::FieldHash;

use crate::errors::{DomainError, DomainResult};
use crate::keys::{PrivKey, PubKey};
use crate::Field;

/// Number of field words in a canonical command encoding
pub const COMMAND_LENGTH: usize = 7;

/// Number of field words in a serialized signature
pub const SIGNATURE_LENGTH: usize = 3;

/// A decrypted vote command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    /// Leaf the command claims to act for
    pub state_index: u64,
    /// Key installed in the leaf when the command is accepted
    pub new_pub_key: PubKey,
    /// Vote option being set
    pub vote_option_index: u64,
    /// New weight for that option
    pub new_vote_weight: u64,
    /// Expected to be exactly one above the leaf nonce
    pub nonce: u64,
    /// Blinding salt
    pub salt: Field,
}

impl Command {
    /// Canonical field word encoding
    pub fn to_words(&self) -> [Field; COMMAND_LENGTH] {
        [
            Field::from(self.state_index),
            self.new_pub_key.0.x,
            self.new_pub_key.0.y,
            Field::from(self.vote_option_index),
            Field::from(self.new_vote_weight),
            Field::from(self.nonce),
            self.salt,
        ]
    }

    /// Decode a command from field words.
    ///
    /// Index, option, weight and nonce words must fit in 64 bits; anything
    /// else cannot have been produced by an honest encoder.
    pub fn from_words(words: &[Field; COMMAND_LENGTH]) -> DomainResult<Self> {
        Ok(Self {
            state_index: word_to_u64(&words[0], "state index")?,
            new_pub_key: PubKey::from_point(Point::new(words[1], words[2])),
            vote_option_index: word_to_u64(&words[3], "vote option index")?,
            new_vote_weight: word_to_u64(&words[4], "vote weight")?,
            nonce: word_to_u64(&words[5], "nonce")?,
            salt: words[6],
        })
    }

    /// Hash of the canonical encoding; this is what gets signed
    pub fn digest<H: FieldHash>(&self, hasher: &H) -> Field {
        hasher.hash(&self.to_words())
    }

    /// Sign this command
    pub fn sign<C: PointOps, H: FieldHash>(
        &self,
        curve: &C,
        hasher: &H,
        priv_key: &PrivKey,
    ) -> Signature {
        sign_digest(curve, hasher, priv_key, self.digest(hasher))
    }

    /// Verify a signature on this command against a public key
    pub fn verify<C: PointOps, H: FieldHash>(
        &self,
        curve: &C,
        hasher: &H,
        pub_key: &PubKey,
        signature: &Signature,
    ) -> bool {
        verify_digest(curve, hasher, pub_key, self.digest(hasher), signature)
    }
}

/// A Schnorr-style signature on Baby Jubjub
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Commitment point `r * B`
    pub r8: Point,
    /// Response scalar `r + challenge * priv`
    pub s: ScalarField,
}

impl Signature {
    /// Serialize as field words: `[r8.x, r8.y, s]`
    pub fn to_words(&self) -> [Field; SIGNATURE_LENGTH] {
        [self.r8.x, self.r8.y, scalar_to_base(&self.s)]
    }

    /// Decode from field words.
    ///
    /// The response word must be a canonical scalar; the commitment point is
    /// validated later, during verification.
    pub fn from_words(words: &[Field; SIGNATURE_LENGTH]) -> DomainResult<Self> {
        let s = reduce_to_scalar(&words[2]);
        if scalar_to_base(&s) != words[2] {
            return Err(DomainError::Decryption(
                "signature scalar exceeds the subgroup order".into(),
            ));
        }
        Ok(Self {
            r8: Point::new(words[0], words[1]),
            s,
        })
    }
}

/// Sign a message digest.
///
/// The commitment nonce is derived deterministically from the private key
/// and the digest, so signing never consumes external randomness and
/// repeated signing of the same digest yields the same signature.
pub fn sign_digest<C: PointOps, H: FieldHash>(
    curve: &C,
    hasher: &H,
    priv_key: &PrivKey,
    digest: Field,
) -> Signature {
    let nonce_seed = hasher.hash(&[scalar_to_base(priv_key.scalar()), digest]);
    let r = reduce_to_scalar(&nonce_seed);
    let r8 = curve.mul_base(&r);

    let pub_key = priv_key.public_key(curve);
    let challenge = challenge_scalar(hasher, &r8, pub_key.point(), digest);

    Signature {
        r8,
        s: r + challenge * *priv_key.scalar(),
    }
}

/// Verify a signature over a message digest.
///
/// Returns `false` (rather than an error) for any failure mode, including a
/// commitment or key that is not a valid subgroup point; a signature that
/// cannot be checked is simply not valid.
pub fn verify_digest<C: PointOps, H: FieldHash>(
    curve: &C,
    hasher: &H,
    pub_key: &PubKey,
    digest: Field,
    signature: &Signature,
) -> bool {
    if curve.validate(&signature.r8).is_err() || curve.validate(pub_key.point()).is_err() {
        return false;
    }

    let challenge = challenge_scalar(hasher, &signature.r8, pub_key.point(), digest);

    let lhs = curve.mul_base(&signature.s);
    let rhs = match curve
        .mul(pub_key.point(), &challenge)
        .and_then(|scaled| curve.add(&signature.r8, &scaled))
    {
        Ok(point) => point,
        Err(_) => return false,
    };

    lhs == rhs
}

fn challenge_scalar<H: FieldHash>(
    hasher: &H,
    r8: &Point,
    pub_key: &Point,
    digest: Field,
) -> ScalarField {
    let challenge = hasher.hash(&[r8.x, r8.y, pub_key.x, pub_key.y, digest]);
    reduce_to_scalar(&challenge)
}

fn word_to_u64(value: &Field, what: &str) -> DomainResult<u64> {
    use ark_ff::PrimeField;

    let limbs = value.into_bigint().0;
    if limbs[1..].iter().any(|limb| *limb != 0) {
        return Err(DomainError::Decryption(format!("{} exceeds u64 range", what)));
    }
    Ok(limbs[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;
    use sotto_curve::BabyJubjub;
    use sotto_hash::Poseidon;

    fn sample_command(keypair: &Keypair) -> Command {
        Command {
            state_index: 1,
            new_pub_key: keypair.pub_key,
            vote_option_index: 2,
            new_vote_weight: 9,
            nonce: 1,
            salt: Field::from(77u64),
        }
    }

    #[test]
    fn test_word_roundtrip() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&keypair);
        let decoded = Command::from_words(&command.to_words()).unwrap();

        assert_eq!(decoded, command);
    }

    #[test]
    fn test_oversized_word_rejected() {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let mut words = sample_command(&keypair).to_words();
        // A weight that cannot fit in 64 bits
        words[4] = Field::from(u64::MAX) + Field::from(1u64);

        assert!(Command::from_words(&words).is_err());
    }

    #[test]
    fn test_sign_and_verify() {
        let curve = BabyJubjub::new();
        let hasher = Poseidon::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&keypair);
        let signature = command.sign(&curve, &hasher, &keypair.priv_key);

        assert!(command.verify(&curve, &hasher, &keypair.pub_key, &signature));
    }

    #[test]
    fn test_signature_rejects_wrong_key() {
        let curve = BabyJubjub::new();
        let hasher = Poseidon::new();
        let mut rng = ark_std::test_rng();

        let signer = Keypair::generate(&curve, &mut rng);
        let other = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&signer);
        let signature = command.sign(&curve, &hasher, &signer.priv_key);

        assert!(!command.verify(&curve, &hasher, &other.pub_key, &signature));
    }

    #[test]
    fn test_signature_rejects_tampered_command() {
        let curve = BabyJubjub::new();
        let hasher = Poseidon::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&keypair);
        let signature = command.sign(&curve, &hasher, &keypair.priv_key);

        let mut tampered = command;
        tampered.new_vote_weight += 1;

        assert!(!tampered.verify(&curve, &hasher, &keypair.pub_key, &signature));
    }

    #[test]
    fn test_signature_words_roundtrip() {
        let curve = BabyJubjub::new();
        let hasher = Poseidon::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&keypair);
        let signature = command.sign(&curve, &hasher, &keypair.priv_key);

        let decoded = Signature::from_words(&signature.to_words()).unwrap();
        assert_eq!(decoded, signature);
    }

    #[test]
    fn test_signing_is_deterministic() {
        let curve = BabyJubjub::new();
        let hasher = Poseidon::new();
        let mut rng = ark_std::test_rng();
        let keypair = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&keypair);
        let first = command.sign(&curve, &hasher, &keypair.priv_key);
        let second = command.sign(&curve, &hasher, &keypair.priv_key);

        assert_eq!(first, second);
    }
}
