//! On-chain events the engine is reconstructed from.
//!
//! Events are totally ordered by `(block, log_index)`; replaying them in
//! that order is what makes two independent reconstructions land on the
//! same roots.

use serde::{Deserialize, Serialize};
use sotto_domain::{Message, PubKey};

/// A participant registered with a key and a voice credit grant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignupEvent {
    pub block: u64,
    pub log_index: u64,
    pub pub_key: PubKey,
    pub voice_credits: u64,
}

/// An encrypted command was published.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub block: u64,
    pub log_index: u64,
    pub message: Message,
    pub enc_pub_key: PubKey,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChainEvent {
    Signup(SignupEvent),
    Message(MessageEvent),
}

impl ChainEvent {
    pub fn block(&self) -> u64 {
        match self {
            ChainEvent::Signup(event) => event.block,
            ChainEvent::Message(event) => event.block,
        }
    }

    pub fn log_index(&self) -> u64 {
        match self {
            ChainEvent::Signup(event) => event.log_index,
            ChainEvent::Message(event) => event.log_index,
        }
    }

    /// Total ordering key
    pub fn key(&self) -> (u64, u64) {
        (self.block(), self.log_index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_curve::{BabyJubjub, PointOps};
    use sotto_domain::{Field, PrivKey};

    fn some_key() -> PubKey {
        let curve = BabyJubjub::new();
        PrivKey::from_scalar(sotto_curve::ScalarField::from(5u64)).public_key(&curve)
    }

    #[test]
    fn test_event_json_roundtrip() {
        let signup = ChainEvent::Signup(SignupEvent {
            block: 3,
            log_index: 1,
            pub_key: some_key(),
            voice_credits: 100,
        });
        let message = ChainEvent::Message(MessageEvent {
            block: 9,
            log_index: 0,
            message: Message::from_words([Field::from(7u64); sotto_domain::MESSAGE_LENGTH]),
            enc_pub_key: some_key(),
        });

        for event in [signup, message] {
            let json = serde_json::to_string(&event).unwrap();
            let back: ChainEvent = serde_json::from_str(&json).unwrap();
            assert_eq!(back, event);
        }
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = ChainEvent::Signup(SignupEvent {
            block: 1,
            log_index: 0,
            pub_key: some_key(),
            voice_credits: 42,
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"signup""#));
    }

    #[test]
    fn test_ordering_key() {
        let event = ChainEvent::Message(MessageEvent {
            block: 12,
            log_index: 4,
            message: Message::from_words([Field::from(0u64); sotto_domain::MESSAGE_LENGTH]),
            enc_pub_key: some_key(),
        });
        assert_eq!(event.key(), (12, 4));
    }
}
