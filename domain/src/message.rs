//! Encrypted messages
//!
//! The ten plaintext words (seven command words, three signature words) are
//! masked with an additive keystream derived from the ECDH shared key:
//! `ct[i] = pt[i] + H(k.x, k.y, i)`. The stream has no integrity of its own;
//! well-formedness of the decoded words and the command signature are the
//! only authenticity checks, which is exactly what the circuit re-runs.

use sotto_hash::FieldHash;

use crate::command::{Command, Signature, COMMAND_LENGTH, SIGNATURE_LENGTH};
use crate::errors::DomainResult;
use crate::keys::{PubKey, SharedKey};
use crate::Field;

/// Number of ciphertext words in a published message
pub const MESSAGE_LENGTH: usize = COMMAND_LENGTH + SIGNATURE_LENGTH;

/// An encrypted command as published on chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    pub words: [Field; MESSAGE_LENGTH],
}

impl Message {
    /// Wrap raw ciphertext words
    pub fn from_words(words: [Field; MESSAGE_LENGTH]) -> Self {
        Self { words }
    }

    /// Leaf digest for the message accumulator.
    ///
    /// Binds the ephemeral encryption key together with the ciphertext so a
    /// message cannot be re-attributed to a different key.
    pub fn digest<H: FieldHash>(&self, hasher: &H, enc_pub_key: &PubKey) -> Field {
        let mut inputs = Vec::with_capacity(MESSAGE_LENGTH + 2);
        inputs.extend_from_slice(&self.words);
        inputs.push(enc_pub_key.0.x);
        inputs.push(enc_pub_key.0.y);
        hasher.hash(&inputs)
    }
}

/// Encrypt a signed command under a shared key
pub fn encrypt<H: FieldHash>(
    hasher: &H,
    key: &SharedKey,
    command: &Command,
    signature: &Signature,
) -> Message {
    let mut plaintext = [Field::from(0u64); MESSAGE_LENGTH];
    plaintext[..COMMAND_LENGTH].copy_from_slice(&command.to_words());
    plaintext[COMMAND_LENGTH..].copy_from_slice(&signature.to_words());

    let mut words = plaintext;
    for (i, word) in words.iter_mut().enumerate() {
        *word += keystream_word(hasher, key, i);
    }

    Message { words }
}

/// Decrypt a message and decode the embedded command and signature.
///
/// Fails when the decoded words are not a well-formed encoding; a wrong key
/// produces pseudo-random words, which this rejects with overwhelming
/// probability via the signature check downstream even when the words
/// happen to parse.
pub fn decrypt<H: FieldHash>(
    hasher: &H,
    key: &SharedKey,
    message: &Message,
) -> DomainResult<(Command, Signature)> {
    let mut plaintext = message.words;
    for (i, word) in plaintext.iter_mut().enumerate() {
        *word -= keystream_word(hasher, key, i);
    }

    let mut command_words = [Field::from(0u64); COMMAND_LENGTH];
    command_words.copy_from_slice(&plaintext[..COMMAND_LENGTH]);
    let command = Command::from_words(&command_words)?;

    let mut signature_words = [Field::from(0u64); SIGNATURE_LENGTH];
    signature_words.copy_from_slice(&plaintext[COMMAND_LENGTH..]);
    let signature = Signature::from_words(&signature_words)?;

    Ok((command, signature))
}

fn keystream_word<H: FieldHash>(hasher: &H, key: &SharedKey, index: usize) -> Field {
    hasher.hash(&[key.0.x, key.0.y, Field::from(index as u64)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{ecdh, Keypair};
    use sotto_curve::BabyJubjub;
    use sotto_hash::Poseidon;

    fn setup() -> (BabyJubjub, Poseidon, Keypair, Keypair) {
        let curve = BabyJubjub::new();
        let hasher = Poseidon::new();
        let mut rng = ark_std::test_rng();
        let coordinator = Keypair::generate(&curve, &mut rng);
        let ephemeral = Keypair::generate(&curve, &mut rng);
        (curve, hasher, coordinator, ephemeral)
    }

    fn sample_command(keypair: &Keypair) -> Command {
        Command {
            state_index: 3,
            new_pub_key: keypair.pub_key,
            vote_option_index: 1,
            new_vote_weight: 5,
            nonce: 1,
            salt: Field::from(42u64),
        }
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let (curve, hasher, coordinator, ephemeral) = setup();

        let command = sample_command(&ephemeral);
        let signature = command.sign(&curve, &hasher, &ephemeral.priv_key);

        let sender_key = ecdh(&curve, &ephemeral.priv_key, &coordinator.pub_key).unwrap();
        let message = encrypt(&hasher, &sender_key, &command, &signature);

        let receiver_key = ecdh(&curve, &coordinator.priv_key, &ephemeral.pub_key).unwrap();
        let (decoded_command, decoded_signature) =
            decrypt(&hasher, &receiver_key, &message).unwrap();

        assert_eq!(decoded_command, command);
        assert_eq!(decoded_signature, signature);
    }

    #[test]
    fn test_ciphertext_differs_from_plaintext() {
        let (curve, hasher, coordinator, ephemeral) = setup();

        let command = sample_command(&ephemeral);
        let signature = command.sign(&curve, &hasher, &ephemeral.priv_key);
        let key = ecdh(&curve, &ephemeral.priv_key, &coordinator.pub_key).unwrap();

        let message = encrypt(&hasher, &key, &command, &signature);
        assert_ne!(message.words[0], command.to_words()[0]);
    }

    #[test]
    fn test_wrong_key_does_not_recover_command() {
        let (curve, hasher, coordinator, ephemeral) = setup();
        let mut rng = ark_std::test_rng();
        let eavesdropper = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&ephemeral);
        let signature = command.sign(&curve, &hasher, &ephemeral.priv_key);
        let key = ecdh(&curve, &ephemeral.priv_key, &coordinator.pub_key).unwrap();
        let message = encrypt(&hasher, &key, &command, &signature);

        let wrong_key = ecdh(&curve, &eavesdropper.priv_key, &ephemeral.pub_key).unwrap();
        match decrypt(&hasher, &wrong_key, &message) {
            // Overwhelmingly likely: some word falls outside its domain
            Err(_) => {}
            // Decoding can still succeed by chance; the signature must not
            Ok((decoded, sig)) => {
                assert!(!decoded.verify(&curve, &hasher, &ephemeral.pub_key, &sig));
            }
        }
    }

    #[test]
    fn test_digest_binds_encryption_key() {
        let (curve, hasher, coordinator, ephemeral) = setup();
        let mut rng = ark_std::test_rng();
        let other = Keypair::generate(&curve, &mut rng);

        let command = sample_command(&ephemeral);
        let signature = command.sign(&curve, &hasher, &ephemeral.priv_key);
        let key = ecdh(&curve, &ephemeral.priv_key, &coordinator.pub_key).unwrap();
        let message = encrypt(&hasher, &key, &command, &signature);

        let with_real_key = message.digest(&hasher, &ephemeral.pub_key);
        let with_other_key = message.digest(&hasher, &other.pub_key);

        assert_ne!(with_real_key, with_other_key);
    }
}
