//! Independent batch witness generation.
//!
//! A witness generator receives only a batch's circuit inputs and must
//! rebuild the post-batch state root from them, without peeking at the
//! engine's live trees. [`ReplayWitnessGenerator`] does exactly what the
//! real state transition circuit would: verify every inclusion witness
//! against the running root, re-derive every accept/reject decision with
//! its own copy of the coordinator key, and fold the accepted leaf updates
//! into a fresh root.

use tracing::debug;

use sotto_core::{BatchCircuitInputs, CommandValidator, Decision, LeafContext, SlotInput};
use sotto_curve::PointOps;
use sotto_domain::{decrypt, ecdh, Field, Keypair, StateLeaf};
use sotto_hash::FieldHash;

use crate::errors::{ProverError, ProverResult};

/// The quantity a batch proof ultimately certifies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchWitness {
    pub batch_index: u64,
    /// Post-batch state root, recomputed from the inputs alone
    pub new_state_root: Field,
}

/// Recomputes a batch transition from its circuit inputs.
pub trait WitnessGenerator: Send + Sync {
    fn generate(&self, inputs: &BatchCircuitInputs) -> ProverResult<BatchWitness>;
}

/// Replays a batch the way the transition circuit would.
pub struct ReplayWitnessGenerator<H, C> {
    coordinator: Keypair,
    hasher: H,
    curve: C,
}

impl<H: FieldHash, C: PointOps> ReplayWitnessGenerator<H, C> {
    pub fn new(coordinator: Keypair, hasher: H, curve: C) -> Self {
        Self {
            coordinator,
            hasher,
            curve,
        }
    }

    /// Fold one slot into the running root.
    ///
    /// Rejected and padding slots hand the root through unchanged; an
    /// accepted slot swaps the old leaf for the updated one along the same
    /// witness path.
    fn slot_root(
        &self,
        inputs: &BatchCircuitInputs,
        index: usize,
        slot: &SlotInput,
        running_root: Field,
        validator: &CommandValidator,
    ) -> ProverResult<Field> {
        let batch = inputs.batch_index;

        ensure(
            slot.leaf_witness.index == slot.target_index as usize,
            batch,
            index,
            "leaf witness opens the wrong index",
        )?;
        ensure(
            slot.leaf_witness
                .verify(slot.old_leaf.digest(&self.hasher), running_root, &self.hasher),
            batch,
            index,
            "old leaf is not in the running state root",
        )?;

        // Padding slots sit below the front of the message log
        let Some(message_witness) = &slot.message_witness else {
            ensure(
                slot.target_index == 0,
                batch,
                index,
                "padding slot must target leaf zero",
            )?;
            return Ok(running_root);
        };

        ensure(
            message_witness.verify(
                slot.message.digest(&self.hasher, &slot.enc_pub_key),
                inputs.message_root,
                &self.hasher,
            ),
            batch,
            index,
            "message is not in the accumulator",
        )?;

        let decoded = ecdh(&self.curve, &self.coordinator.priv_key, &slot.enc_pub_key)
            .and_then(|shared| decrypt(&self.hasher, &shared, &slot.message));
        let (command, signature) = match decoded {
            Ok(pair) => pair,
            Err(_) => {
                ensure(
                    slot.target_index == 0,
                    batch,
                    index,
                    "malformed slot must target leaf zero",
                )?;
                return Ok(running_root);
            }
        };

        if validator.check_state_index(command.state_index).is_some() {
            ensure(
                slot.target_index == 0,
                batch,
                index,
                "unresolvable command must target leaf zero",
            )?;
            return Ok(running_root);
        }
        ensure(
            slot.target_index == command.state_index,
            batch,
            index,
            "leaf witness does not open the command's leaf",
        )?;

        let witness_option = command
            .vote_option_index
            .min(inputs.max_vote_options - 1);
        ensure(
            slot.vote_witness.index == witness_option as usize,
            batch,
            index,
            "vote witness opens the wrong option",
        )?;
        ensure(
            slot.vote_witness.verify(
                Field::from(slot.prev_weight),
                slot.old_leaf.vote_option_tree_root,
                &self.hasher,
            ),
            batch,
            index,
            "previous weight is not in the vote option root",
        )?;

        let context = LeafContext {
            pub_key: slot.old_leaf.pub_key,
            nonce: slot.old_leaf.nonce,
            voice_credit_balance: slot.old_leaf.voice_credit_balance,
            prev_weight: slot.prev_weight,
        };
        match validator.validate(&self.curve, &self.hasher, &context, &command, &signature) {
            Decision::Reject(_) => Ok(running_root),
            Decision::Accept { new_balance } => {
                let new_vote_root = slot
                    .vote_witness
                    .fold(Field::from(command.new_vote_weight), &self.hasher);
                let new_leaf = StateLeaf {
                    pub_key: command.new_pub_key,
                    voice_credit_balance: new_balance,
                    vote_option_tree_root: new_vote_root,
                    nonce: command.nonce,
                };
                Ok(slot
                    .leaf_witness
                    .fold(new_leaf.digest(&self.hasher), &self.hasher))
            }
        }
    }
}

impl<H: FieldHash, C: PointOps> WitnessGenerator for ReplayWitnessGenerator<H, C> {
    fn generate(&self, inputs: &BatchCircuitInputs) -> ProverResult<BatchWitness> {
        if self.coordinator.pub_key != inputs.coordinator_pub_key {
            return Err(ProverError::CoordinatorMismatch);
        }

        let validator = CommandValidator::new(inputs.max_vote_options, inputs.num_signups);
        let mut running_root = inputs.old_state_root;
        for (index, slot) in inputs.slots.iter().enumerate() {
            running_root = self.slot_root(inputs, index, slot, running_root, &validator)?;
        }

        // The zero leaf swap closes every batch
        if inputs.zero_leaf_witness.index != 0 {
            return Err(ProverError::ZeroLeafInputs {
                batch_index: inputs.batch_index,
                what: "witness does not open leaf zero".into(),
            });
        }
        if !inputs.zero_leaf_witness.verify(
            inputs.old_zero_leaf.digest(&self.hasher),
            running_root,
            &self.hasher,
        ) {
            return Err(ProverError::ZeroLeafInputs {
                batch_index: inputs.batch_index,
                what: "retired leaf is not in the post-slot root".into(),
            });
        }
        running_root = inputs
            .zero_leaf_witness
            .fold(inputs.new_zero_leaf.digest(&self.hasher), &self.hasher);

        debug!(batch_index = inputs.batch_index, "batch witness recomputed");
        Ok(BatchWitness {
            batch_index: inputs.batch_index,
            new_state_root: running_root,
        })
    }
}

fn ensure(condition: bool, batch_index: u64, slot: usize, what: &str) -> ProverResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProverError::InconsistentInputs {
            batch_index,
            slot,
            what: what.into(),
        })
    }
}
