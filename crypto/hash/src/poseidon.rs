//! Poseidon Hash Implementation
//!
//! ZK-friendly algebraic hash function using arkworks. Used for state leaf
//! digests, message leaves and Merkle tree nodes so that every commitment the
//! engine produces can be recomputed inside an arithmetic circuit.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::poseidon::{PoseidonConfig, PoseidonSponge};
use ark_crypto_primitives::sponge::CryptographicSponge;
use ark_ff::{Field, PrimeField};
use ark_std::vec::Vec;

use crate::FieldHash;

/// Poseidon parameters for BN254 scalar field
#[derive(Clone)]
pub struct PoseidonParams {
    config: PoseidonConfig<Fr>,
}

impl PoseidonParams {
    /// Create default Poseidon parameters
    /// Uses rate=2, capacity=1 for 2:1 compression
    pub fn new() -> Self {
        Self {
            config: Self::default_config(),
        }
    }

    /// Generate default Poseidon config
    /// Parameters based on secure Poseidon instantiation
    fn default_config() -> PoseidonConfig<Fr> {
        // Standard Poseidon parameters for BN254
        // t = 3 (rate=2, capacity=1), full_rounds=8, partial_rounds=57
        let full_rounds = 8;
        let partial_rounds = 57;
        let alpha = 5; // S-box exponent x^5

        let rate = 2;
        let capacity = 1;
        let t = rate + capacity;

        // Round constants: t elements per round, derived deterministically
        let ark: Vec<Vec<Fr>> = (0..(full_rounds + partial_rounds))
            .map(|round| {
                (0..t)
                    .map(|i| {
                        let seed = ((round * t + i) as u64).wrapping_mul(0x9e3779b97f4a7c15);
                        Fr::from(seed)
                    })
                    .collect()
            })
            .collect();

        // MDS matrix (Cauchy construction)
        let mds: Vec<Vec<Fr>> = (0..t)
            .map(|i| {
                (0..t)
                    .map(|j| {
                        let x = Fr::from(i as u64);
                        let y = Fr::from((t + j) as u64);
                        (x + y).inverse().unwrap_or_else(|| Fr::from(1u64))
                    })
                    .collect()
            })
            .collect();

        PoseidonConfig::new(
            full_rounds,
            partial_rounds,
            alpha as u64,
            mds,
            ark,
            rate,
            capacity,
        )
    }
}

impl Default for PoseidonParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Poseidon hasher for stateful hashing
pub struct PoseidonHasher {
    sponge: PoseidonSponge<Fr>,
}

impl PoseidonHasher {
    /// Create new hasher with default parameters
    pub fn new() -> Self {
        let params = PoseidonParams::new();
        Self {
            sponge: PoseidonSponge::new(&params.config),
        }
    }

    /// Create with custom parameters
    pub fn with_params(params: &PoseidonParams) -> Self {
        Self {
            sponge: PoseidonSponge::new(&params.config),
        }
    }

    /// Absorb a field element
    pub fn absorb(&mut self, element: &Fr) {
        self.sponge.absorb(element);
    }

    /// Absorb bytes (converted to field elements)
    pub fn absorb_bytes(&mut self, data: &[u8]) {
        // 31-byte chunks always fit in the field
        for chunk in data.chunks(31) {
            let mut bytes = [0u8; 32];
            bytes[..chunk.len()].copy_from_slice(chunk);
            let element = Fr::from_le_bytes_mod_order(&bytes);
            self.sponge.absorb(&element);
        }
    }

    /// Squeeze a single field element
    pub fn squeeze(&mut self) -> Fr {
        self.sponge.squeeze_field_elements(1)[0]
    }

    /// Finalize and return hash as field element
    pub fn finalize(mut self) -> Fr {
        self.squeeze()
    }
}

impl Default for PoseidonHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Default [`FieldHash`] backend.
///
/// Holds the Poseidon parameters once so repeated hashing does not re-derive
/// round constants.
#[derive(Clone)]
pub struct Poseidon {
    params: PoseidonParams,
}

impl Poseidon {
    /// Create a Poseidon backend with default parameters
    pub fn new() -> Self {
        Self {
            params: PoseidonParams::new(),
        }
    }
}

impl Default for Poseidon {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldHash for Poseidon {
    fn hash(&self, inputs: &[Fr]) -> Fr {
        let mut hasher = PoseidonHasher::with_params(&self.params);
        for input in inputs {
            hasher.absorb(input);
        }
        hasher.finalize()
    }
}

/// Hash two field elements (for Merkle trees)
pub fn poseidon_hash_two(left: &Fr, right: &Fr) -> Fr {
    let mut hasher = PoseidonHasher::new();
    hasher.absorb(left);
    hasher.absorb(right);
    hasher.finalize()
}

/// Hash a sequence of field elements
pub fn poseidon_hash_many(inputs: &[Fr]) -> Fr {
    let mut hasher = PoseidonHasher::new();
    for input in inputs {
        hasher.absorb(input);
    }
    hasher.finalize()
}

/// Convert bytes to field element
pub fn bytes_to_field(data: &[u8]) -> Fr {
    let mut bytes = [0u8; 32];
    let len = std::cmp::min(31, data.len()); // Use 31 bytes max
    bytes[..len].copy_from_slice(&data[..len]);
    Fr::from_le_bytes_mod_order(&bytes)
}

/// Convert field element to bytes
pub fn field_to_bytes(element: &Fr) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    let repr = element.into_bigint();
    for (i, limb) in repr.0.iter().enumerate() {
        let offset = i * 8;
        if offset < 32 {
            let len = std::cmp::min(8, 32 - offset);
            bytes[offset..offset + len].copy_from_slice(&limb.to_le_bytes()[..len]);
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poseidon_deterministic() {
        let a = Fr::from(42u64);
        let b = Fr::from(43u64);

        let hash1 = poseidon_hash_two(&a, &b);
        let hash2 = poseidon_hash_two(&a, &b);
        assert_eq!(hash1, hash2, "Same input should produce same hash");
    }

    #[test]
    fn test_poseidon_order_matters() {
        let a = Fr::from(123u64);
        let b = Fr::from(456u64);

        let ab = poseidon_hash_two(&a, &b);
        let ba = poseidon_hash_two(&b, &a);
        assert_ne!(ab, ba, "Order should matter");
    }

    #[test]
    fn test_poseidon_arity_matters() {
        let a = Fr::from(5u64);

        let one = poseidon_hash_many(&[a]);
        let two = poseidon_hash_many(&[a, a]);
        assert_ne!(one, two);
    }

    #[test]
    fn test_poseidon_hasher_stateful() {
        let mut hasher = PoseidonHasher::new();
        hasher.absorb(&Fr::from(1u64));
        hasher.absorb(&Fr::from(2u64));
        let hash1 = hasher.finalize();

        let mut hasher2 = PoseidonHasher::new();
        hasher2.absorb(&Fr::from(1u64));
        hasher2.absorb(&Fr::from(2u64));
        let hash2 = hasher2.finalize();

        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_bytes_field_roundtrip() {
        let data = b"test roundtrip data";
        let field = bytes_to_field(data);
        let back = field_to_bytes(&field);

        // First 31 bytes should match (that's all we encode)
        assert_eq!(&back[..data.len().min(31)], &data[..data.len().min(31)]);
    }

    #[test]
    fn test_backend_reuses_params() {
        let backend = Poseidon::new();
        let x = Fr::from(9u64);
        let y = Fr::from(10u64);

        assert_eq!(backend.hash(&[x, y]), poseidon_hash_two(&x, &y));
    }
}
