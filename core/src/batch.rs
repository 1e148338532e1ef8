//! Reverse-order batch processing.
//!
//! Messages are replayed in batches from the newest window back to the
//! oldest, and newest-first inside each window. Later messages therefore
//! take effect first, which is what lets a participant silently invalidate
//! an earlier coerced vote with a later key change.
//!
//! Windows are end-aligned: the last batch ends exactly at the message
//! count and every earlier batch sits one batch size lower, so only the
//! earliest batch can run past the front of the log. Those slots are
//! padding and touch nothing.
//!
//! Processing is two-phase. [`Election::stage_batch`] derives the full
//! transition on scratch copies and returns it together with the circuit
//! inputs; nothing is live until [`Election::commit_batch`] adopts it,
//! which callers do only after the claimed root survived an independent
//! witness check.

use serde::{Serialize, Serializer};
use tracing::info;

use sotto_curve::PointOps;
use sotto_domain::ser::field_to_decimal;
use sotto_domain::{
    decrypt, ecdh, Command, Field, Message, PubKey, StateLeaf, MESSAGE_LENGTH,
};
use sotto_hash::FieldHash;
use sotto_tree::{IncrementalTree, MerkleWitness};

use crate::audit::AuditRow;
use crate::election::{Election, PublishedMessage, UserRecord};
use crate::errors::{CoreError, CoreResult};
use crate::period::Period;
use crate::tally::TallyAccumulator;
use crate::validator::{CommandValidator, Decision, RejectReason};
use crate::vote_record::VoteRecord;

/// Inputs for one message slot of a batch proof.
#[derive(Clone, Debug)]
pub struct SlotInput {
    /// Ciphertext words as published; all zero for padding slots
    pub message: Message,
    /// Ephemeral encryption key; the identity point for padding slots
    pub enc_pub_key: PubKey,
    /// Witness for the message leaf; `None` for padding slots
    pub message_witness: Option<MerkleWitness>,
    /// Leaf the state witness opens: the command's index when it resolves
    /// to a participant, otherwise zero
    pub target_index: u64,
    /// The targeted leaf before this slot was applied
    pub old_leaf: StateLeaf,
    /// Inclusion witness for `old_leaf` in the pre-slot state tree
    pub leaf_witness: MerkleWitness,
    /// Weight recorded for the witnessed vote option before this slot
    pub prev_weight: u64,
    /// Witness for `prev_weight` in the leaf's vote option tree
    pub vote_witness: MerkleWitness,
}

/// Everything a proof of one batch transition consumes.
#[derive(Clone, Debug)]
pub struct BatchCircuitInputs {
    pub batch_index: u64,
    /// State root before any slot of this batch
    pub old_state_root: Field,
    /// Claimed root after the batch, including the zero leaf swap
    pub new_state_root: Field,
    /// Root of the full message accumulator
    pub message_root: Field,
    pub num_signups: u64,
    pub max_vote_options: u64,
    pub coordinator_pub_key: PubKey,
    /// Slots in processing order, newest message first
    pub slots: Vec<SlotInput>,
    /// The zeroth leaf this batch retires
    pub old_zero_leaf: StateLeaf,
    /// Witness for the zeroth leaf in the tree after all slots applied
    pub zero_leaf_witness: MerkleWitness,
    /// Replacement zeroth leaf
    pub new_zero_leaf: StateLeaf,
}

#[derive(Serialize)]
struct WitnessRepr {
    path: Vec<String>,
    index: usize,
    directions: Vec<bool>,
}

impl WitnessRepr {
    fn new(witness: &MerkleWitness) -> Self {
        Self {
            path: witness.path.iter().map(field_to_decimal).collect(),
            index: witness.index,
            directions: witness.directions.clone(),
        }
    }
}

#[derive(Serialize)]
struct SlotInputRepr<'a> {
    message: &'a Message,
    enc_pub_key: &'a PubKey,
    message_witness: Option<WitnessRepr>,
    target_index: u64,
    old_leaf: &'a StateLeaf,
    leaf_witness: WitnessRepr,
    prev_weight: u64,
    vote_witness: WitnessRepr,
}

impl Serialize for SlotInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SlotInputRepr {
            message: &self.message,
            enc_pub_key: &self.enc_pub_key,
            message_witness: self.message_witness.as_ref().map(WitnessRepr::new),
            target_index: self.target_index,
            old_leaf: &self.old_leaf,
            leaf_witness: WitnessRepr::new(&self.leaf_witness),
            prev_weight: self.prev_weight,
            vote_witness: WitnessRepr::new(&self.vote_witness),
        }
        .serialize(serializer)
    }
}

#[derive(Serialize)]
struct BatchCircuitInputsRepr<'a> {
    batch_index: u64,
    old_state_root: String,
    new_state_root: String,
    message_root: String,
    num_signups: u64,
    max_vote_options: u64,
    coordinator_pub_key: &'a PubKey,
    slots: &'a [SlotInput],
    old_zero_leaf: &'a StateLeaf,
    zero_leaf_witness: WitnessRepr,
    new_zero_leaf: &'a StateLeaf,
}

// Field elements render as decimal strings so the export is what circuit
// tooling consumes directly.
impl Serialize for BatchCircuitInputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BatchCircuitInputsRepr {
            batch_index: self.batch_index,
            old_state_root: field_to_decimal(&self.old_state_root),
            new_state_root: field_to_decimal(&self.new_state_root),
            message_root: field_to_decimal(&self.message_root),
            num_signups: self.num_signups,
            max_vote_options: self.max_vote_options,
            coordinator_pub_key: &self.coordinator_pub_key,
            slots: &self.slots,
            old_zero_leaf: &self.old_zero_leaf,
            zero_leaf_witness: WitnessRepr::new(&self.zero_leaf_witness),
            new_zero_leaf: &self.new_zero_leaf,
        }
        .serialize(serializer)
    }
}

/// A staged, not yet committed batch transition.
#[derive(Debug)]
pub struct StagedBatch {
    inputs: BatchCircuitInputs,
    records: Vec<AuditRow>,
    state_tree: IncrementalTree,
    users: Vec<UserRecord>,
    new_zero_leaf: StateLeaf,
    tally_delta: TallyAccumulator,
}

impl StagedBatch {
    pub fn inputs(&self) -> &BatchCircuitInputs {
        &self.inputs
    }

    pub fn batch_index(&self) -> u64 {
        self.inputs.batch_index
    }

    pub fn old_state_root(&self) -> Field {
        self.inputs.old_state_root
    }

    pub fn new_state_root(&self) -> Field {
        self.inputs.new_state_root
    }

    /// Audit rows for the real messages of this batch, processing order
    pub fn audit_rows(&self) -> &[AuditRow] {
        &self.records
    }
}

/// Message window of one batch, as signed offsets into the log.
///
/// `total` is the batch count for `len` messages; `start` is negative
/// exactly when the earliest batch is padded.
fn batch_window(len: usize, batch_size: usize, total: u64, batch_index: u64) -> (i64, i64) {
    let end = len as i64 - (total - 1 - batch_index) as i64 * batch_size as i64;
    (end - batch_size as i64, end)
}

/// Scratch state a batch is applied to before anything is committed.
struct Scratch {
    state_tree: IncrementalTree,
    users: Vec<UserRecord>,
}

impl<H: FieldHash, C: PointOps> Election<H, C> {
    /// Derive the state transition for the next batch without touching the
    /// live state.
    ///
    /// `fresh_zero_leaf` replaces the zeroth leaf once the slots have been
    /// applied. The caller samples it, so staging itself is deterministic
    /// in its arguments and can be replayed bit for bit.
    pub fn stage_batch(
        &self,
        batch_index: u64,
        fresh_zero_leaf: StateLeaf,
    ) -> CoreResult<StagedBatch> {
        let expected = self.expected_batch("stage a batch")?;
        if batch_index != expected {
            return Err(CoreError::BatchOutOfOrder {
                expected,
                got: batch_index,
            });
        }

        let mut scratch = Scratch {
            state_tree: self.state_tree.clone(),
            users: self.users.clone(),
        };
        let old_state_root = scratch.state_tree.root();

        let (start, end) = batch_window(
            self.messages.len(),
            self.params.message_batch_size,
            self.total_batches(),
            batch_index,
        );

        let validator = CommandValidator::new(self.params.max_vote_options, self.num_signups());
        let mut slots = Vec::with_capacity(self.params.message_batch_size);
        let mut records = Vec::with_capacity(self.params.message_batch_size);
        let mut tally_delta = TallyAccumulator::new(self.params.max_vote_options);

        for position in (start..end).rev() {
            if position < 0 {
                slots.push(self.padding_slot(&scratch)?);
                continue;
            }

            let message_index = position as usize;
            let published = self.messages[message_index];
            let (slot, command, decision) = self.stage_slot(
                &mut scratch,
                &validator,
                message_index,
                &published,
                &mut tally_delta,
            )?;
            records.push(AuditRow::new(published.block, command.as_ref(), &decision));
            slots.push(slot);
        }

        // Retire the zeroth leaf so the published root does not reveal
        // whether any leaf actually changed in this batch.
        let old_zero_leaf = self.zero_leaf;
        let zero_leaf_witness = scratch.state_tree.witness(0)?;
        scratch
            .state_tree
            .update(0, fresh_zero_leaf.digest(&self.hasher), &self.hasher)?;
        let new_state_root = scratch.state_tree.root();

        let accepted = records
            .iter()
            .filter(|row| row.outcome == "accepted")
            .count();
        info!(
            batch_index,
            messages = records.len(),
            accepted, "batch staged"
        );

        Ok(StagedBatch {
            inputs: BatchCircuitInputs {
                batch_index,
                old_state_root,
                new_state_root,
                message_root: self.message_tree.root(),
                num_signups: self.num_signups(),
                max_vote_options: self.params.max_vote_options,
                coordinator_pub_key: self.coordinator.pub_key,
                slots,
                old_zero_leaf,
                zero_leaf_witness,
                new_zero_leaf: fresh_zero_leaf,
            },
            records,
            state_tree: scratch.state_tree,
            users: scratch.users,
            new_zero_leaf: fresh_zero_leaf,
            tally_delta,
        })
    }

    /// Adopt a staged batch as the live state.
    ///
    /// The staged transition must be the one the engine expects next and
    /// must start from the current root.
    pub fn commit_batch(&mut self, staged: StagedBatch) -> CoreResult<()> {
        let expected = self.expected_batch("commit a batch")?;
        if staged.inputs.batch_index != expected {
            return Err(CoreError::BatchOutOfOrder {
                expected,
                got: staged.inputs.batch_index,
            });
        }
        if staged.inputs.old_state_root != self.state_tree.root() {
            return Err(CoreError::StaleBatch {
                batch_index: staged.inputs.batch_index,
            });
        }

        let StagedBatch {
            inputs,
            records,
            state_tree,
            users,
            new_zero_leaf,
            tally_delta,
        } = staged;

        self.state_tree = state_tree;
        self.users = users;
        self.zero_leaf = new_zero_leaf;
        self.tally.merge(&tally_delta);
        self.audit.extend(records);
        self.period = Period::Processing {
            remaining: expected,
        };

        info!(
            batch_index = inputs.batch_index,
            remaining = expected,
            "batch committed"
        );
        Ok(())
    }

    fn expected_batch(&self, operation: &'static str) -> CoreResult<u64> {
        match self.period {
            Period::Processing { remaining } => remaining
                .checked_sub(1)
                .ok_or(CoreError::ProcessingComplete),
            _ => Err(self.wrong_period(operation)),
        }
    }

    fn stage_slot(
        &self,
        scratch: &mut Scratch,
        validator: &CommandValidator,
        message_index: usize,
        published: &PublishedMessage,
        tally_delta: &mut TallyAccumulator,
    ) -> CoreResult<(SlotInput, Option<Command>, Decision)> {
        let message_witness = self.message_tree.witness(message_index)?;

        // Anything that does not decode to a well-formed signed command is
        // a malformed slot acting on leaf zero.
        let decoded = ecdh(&self.curve, &self.coordinator.priv_key, &published.enc_pub_key)
            .and_then(|shared| decrypt(&self.hasher, &shared, &published.message));
        let (command, signature) = match decoded {
            Ok(pair) => pair,
            Err(_) => {
                let slot = self.noop_slot(
                    scratch,
                    published.message,
                    published.enc_pub_key,
                    Some(message_witness),
                )?;
                return Ok((slot, None, Decision::Reject(RejectReason::Malformed)));
            }
        };

        if validator.check_state_index(command.state_index).is_some() {
            let slot = self.noop_slot(
                scratch,
                published.message,
                published.enc_pub_key,
                Some(message_witness),
            )?;
            return Ok((
                slot,
                Some(command),
                Decision::Reject(RejectReason::UnknownStateIndex),
            ));
        }

        let target_index = command.state_index;
        let user_slot = (target_index - 1) as usize;

        // Witness material is captured against the pre-slot state. An
        // out-of-range option is witnessed at the highest valid option so
        // the inputs stay well formed.
        let witness_option = command
            .vote_option_index
            .min(self.params.max_vote_options - 1);
        let (old_leaf, prev_weight, vote_witness, context) = {
            let user = &scratch.users[user_slot];
            (
                user.state_leaf(&self.hasher)?,
                user.votes.weight(witness_option),
                user.votes.witness(witness_option, &self.hasher)?,
                user.leaf_context(command.vote_option_index),
            )
        };
        let leaf_witness = scratch.state_tree.witness(target_index as usize)?;

        let decision = validator.validate(&self.curve, &self.hasher, &context, &command, &signature);

        if let Decision::Accept { new_balance } = decision {
            let user = &mut scratch.users[user_slot];
            user.pub_key = command.new_pub_key;
            user.nonce = command.nonce;
            user.voice_credit_balance = new_balance;
            user.votes
                .set_weight(command.vote_option_index, command.new_vote_weight);
            let new_digest = scratch.users[user_slot]
                .state_leaf(&self.hasher)?
                .digest(&self.hasher);
            scratch
                .state_tree
                .update(target_index as usize, new_digest, &self.hasher)?;

            tally_delta.apply(
                command.vote_option_index,
                context.prev_weight,
                command.new_vote_weight,
            );
        }

        Ok((
            SlotInput {
                message: published.message,
                enc_pub_key: published.enc_pub_key,
                message_witness: Some(message_witness),
                target_index,
                old_leaf,
                leaf_witness,
                prev_weight,
                vote_witness,
            },
            Some(command),
            decision,
        ))
    }

    /// A slot that targets leaf zero and changes nothing
    fn noop_slot(
        &self,
        scratch: &Scratch,
        message: Message,
        enc_pub_key: PubKey,
        message_witness: Option<MerkleWitness>,
    ) -> CoreResult<SlotInput> {
        let empty_votes = VoteRecord::new(
            self.params.vote_option_tree_depth,
            self.params.max_vote_options,
        );
        Ok(SlotInput {
            message,
            enc_pub_key,
            message_witness,
            target_index: 0,
            old_leaf: self.zero_leaf,
            leaf_witness: scratch.state_tree.witness(0)?,
            prev_weight: 0,
            vote_witness: empty_votes.witness(0, &self.hasher)?,
        })
    }

    fn padding_slot(&self, scratch: &Scratch) -> CoreResult<SlotInput> {
        self.noop_slot(
            scratch,
            Message::from_words([Field::from(0u64); MESSAGE_LENGTH]),
            PubKey::from_point(self.curve.identity()),
            None,
        )
    }
}
