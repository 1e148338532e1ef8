//! State leaves
//!
//! One leaf per participant: their current key, remaining voice credits,
//! the root of their per-option vote tree and the last accepted nonce. Leaf
//! zero never belongs to a user; it is re-randomized after every processed
//! batch so observers cannot correlate roots across batches.

use sotto_curve::{Point, PointOps};
use sotto_hash::FieldHash;

use crate::keys::{Keypair, PubKey};
use crate::Field;

/// A single leaf of the state accumulator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateLeaf {
    /// Key commands must currently be signed with
    pub pub_key: PubKey,
    /// Remaining voice credits
    pub voice_credit_balance: u64,
    /// Root of the per-option vote weight tree
    pub vote_option_tree_root: Field,
    /// Last accepted command nonce
    pub nonce: u64,
}

impl StateLeaf {
    /// Leaf digest committed into the state tree
    pub fn digest<H: FieldHash>(&self, hasher: &H) -> Field {
        hasher.hash(&[
            self.pub_key.0.x,
            self.pub_key.0.y,
            self.vote_option_tree_root,
            Field::from(self.voice_credit_balance),
            Field::from(self.nonce),
        ])
    }

    /// The initial zeroth leaf: group identity key, nothing spent
    pub fn blank(empty_vote_root: Field) -> Self {
        Self {
            pub_key: PubKey::from_point(Point::new(Field::from(0u64), Field::from(1u64))),
            voice_credit_balance: 0,
            vote_option_tree_root: empty_vote_root,
            nonce: 0,
        }
    }

    /// A fresh blinding leaf for the zeroth slot.
    ///
    /// The key is sampled from a throwaway keypair, so the digest is
    /// unpredictable to anyone who does not hold the discarded scalar.
    pub fn random<C: PointOps, R: ark_std::rand::Rng + ?Sized>(
        curve: &C,
        rng: &mut R,
        empty_vote_root: Field,
    ) -> Self {
        let throwaway = Keypair::generate(curve, rng);
        Self {
            pub_key: throwaway.pub_key,
            voice_credit_balance: 0,
            vote_option_tree_root: empty_vote_root,
            nonce: 0,
        }
    }
}
