//! Sotto Field Hashing
//!
//! Every commitment in the protocol (state leaves, message leaves, Merkle
//! nodes, signature challenges, keystream words) is a hash over BN254 scalar
//! field elements. The [`FieldHash`] trait is the seam through which the hash
//! family is injected; [`Poseidon`] is the default backend.

pub mod poseidon;

pub use ark_bn254::Fr;
pub use poseidon::{
    bytes_to_field, field_to_bytes, poseidon_hash_many, poseidon_hash_two, Poseidon,
    PoseidonHasher, PoseidonParams,
};

/// Fixed-arity hash over the BN254 scalar field.
///
/// Implementations must be deterministic and collision resistant over
/// variable-length input slices; callers rely on `hash(&[a, b]) !=
/// hash(&[b, a])` for distinct `a`, `b`.
pub trait FieldHash: Send + Sync {
    /// Hash a sequence of field elements to a single field element.
    fn hash(&self, inputs: &[Fr]) -> Fr;

    /// Hash a pair of nodes (Merkle compression).
    fn hash_two(&self, left: Fr, right: Fr) -> Fr {
        self.hash(&[left, right])
    }
}

impl<T: FieldHash + ?Sized> FieldHash for &T {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        (**self).hash(inputs)
    }
}
