//! Serialization helpers
//!
//! JSON artifacts (event logs, tallies, exported circuit inputs) render
//! field elements as canonical decimal strings, the convention circuit
//! tooling expects. Parsing is strict: a value at or above the field
//! modulus is an encoding error, never silently reduced.

use std::str::FromStr;

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{DomainError, DomainResult};
use crate::keys::PubKey;
use crate::message::{Message, MESSAGE_LENGTH};
use crate::state_leaf::StateLeaf;
use crate::Field;
use sotto_curve::Point;

/// Render a field element as a canonical decimal string
pub fn field_to_decimal(value: &Field) -> String {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le()).to_string()
}

/// Parse a canonical decimal string into a field element
pub fn field_from_decimal(input: &str) -> DomainResult<Field> {
    let value = BigUint::from_str(input)
        .map_err(|_| DomainError::EncodingOverflow(format!("not a decimal integer: {:?}", input)))?;

    let modulus = BigUint::from_bytes_le(&Field::MODULUS.to_bytes_le());
    if value >= modulus {
        return Err(DomainError::EncodingOverflow(
            "value is not below the field modulus".into(),
        ));
    }

    Ok(Field::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Serde adapter for a single field element, e.g.
/// `#[serde(with = "sotto_domain::ser::field_str")]`
pub mod field_str {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Field, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&field_to_decimal(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Field, D::Error> {
        let text = String::deserialize(deserializer)?;
        field_from_decimal(&text).map_err(D::Error::custom)
    }
}

#[derive(Serialize, Deserialize)]
struct PubKeyRepr {
    x: String,
    y: String,
}

impl Serialize for PubKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PubKeyRepr {
            x: field_to_decimal(&self.0.x),
            y: field_to_decimal(&self.0.y),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PubKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = PubKeyRepr::deserialize(deserializer)?;
        let x = field_from_decimal(&repr.x).map_err(D::Error::custom)?;
        let y = field_from_decimal(&repr.y).map_err(D::Error::custom)?;
        Ok(PubKey::from_point(Point::new(x, y)))
    }
}

#[derive(Serialize, Deserialize)]
struct StateLeafRepr {
    pub_key: PubKey,
    voice_credit_balance: u64,
    vote_option_tree_root: String,
    nonce: u64,
}

impl Serialize for StateLeaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        StateLeafRepr {
            pub_key: self.pub_key,
            voice_credit_balance: self.voice_credit_balance,
            vote_option_tree_root: field_to_decimal(&self.vote_option_tree_root),
            nonce: self.nonce,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StateLeaf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = StateLeafRepr::deserialize(deserializer)?;
        Ok(StateLeaf {
            pub_key: repr.pub_key,
            voice_credit_balance: repr.voice_credit_balance,
            vote_option_tree_root: field_from_decimal(&repr.vote_option_tree_root)
                .map_err(D::Error::custom)?,
            nonce: repr.nonce,
        })
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let words: Vec<String> = self.words.iter().map(field_to_decimal).collect();
        words.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let texts = Vec::<String>::deserialize(deserializer)?;
        if texts.len() != MESSAGE_LENGTH {
            return Err(D::Error::custom(format!(
                "expected {} ciphertext words, got {}",
                MESSAGE_LENGTH,
                texts.len()
            )));
        }

        let mut words = [Field::from(0u64); MESSAGE_LENGTH];
        for (word, text) in words.iter_mut().zip(&texts) {
            *word = field_from_decimal(text).map_err(D::Error::custom)?;
        }
        Ok(Message::from_words(words))
    }
}
