//! Keygen Command - Generate a keypair

use std::fs;
use std::path::PathBuf;

use clap::Args;
use rand::rngs::{OsRng, StdRng};
use rand::SeedableRng;
use sotto_curve::BabyJubjub;
use sotto_domain::Keypair;
use sotto_hash::{bytes_to_field, field_to_bytes, poseidon_hash_many, Fr};

/// Generate a keypair
#[derive(Args)]
pub struct KeygenCommand {
    /// Write the private key to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Derive the keypair from a passphrase instead of system randomness.
    /// The same passphrase always yields the same keypair.
    #[arg(short, long)]
    passphrase: Option<String>,
}

impl KeygenCommand {
    pub async fn execute(self) -> anyhow::Result<()> {
        let curve = BabyJubjub::new();
        let keypair = match &self.passphrase {
            Some(phrase) => {
                let mut rng = StdRng::from_seed(passphrase_seed(phrase));
                Keypair::generate(&curve, &mut rng)
            }
            None => Keypair::generate(&curve, &mut OsRng),
        };

        println!("Public key:  {}", keypair.pub_key.serialize()?);

        match self.output {
            Some(path) => {
                fs::write(&path, keypair.priv_key.serialize())?;
                println!("Private key written to {}", path.display());
            }
            None => {
                println!("Private key: {}", keypair.priv_key.serialize());
            }
        }

        println!();
        println!("⚠️  Keep the private key secret. Anyone holding it can vote as you.");

        Ok(())
    }
}

/// Absorb the passphrase in 31-byte chunks plus a length word, so strings
/// that differ only past a chunk boundary still seed differently.
fn passphrase_seed(phrase: &str) -> [u8; 32] {
    let bytes = phrase.as_bytes();
    let mut words: Vec<Fr> = bytes.chunks(31).map(bytes_to_field).collect();
    words.push(Fr::from(bytes.len() as u64));
    field_to_bytes(&poseidon_hash_many(&words))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passphrase_seed_is_deterministic() {
        assert_eq!(
            passphrase_seed("correct horse battery staple"),
            passphrase_seed("correct horse battery staple")
        );
        assert_ne!(passphrase_seed("alpha"), passphrase_seed("beta"));
    }

    #[test]
    fn test_passphrase_seed_separates_long_strings() {
        // Identical first 31 bytes, different tails.
        let base = "x".repeat(31);
        let a = format!("{base}tail-one");
        let b = format!("{base}tail-two");
        assert_ne!(passphrase_seed(&a), passphrase_seed(&b));
    }

    #[test]
    fn test_same_passphrase_yields_same_keypair() {
        let curve = BabyJubjub::new();
        let mut rng_a = StdRng::from_seed(passphrase_seed("quorum"));
        let mut rng_b = StdRng::from_seed(passphrase_seed("quorum"));
        let a = Keypair::generate(&curve, &mut rng_a);
        let b = Keypair::generate(&curve, &mut rng_b);
        assert_eq!(a.pub_key, b.pub_key);
    }
}
