//! Command validation.
//!
//! Every decrypted command is checked against the leaf it targets, in a
//! fixed order: state index, signature, nonce, vote option range, credit
//! budget. The first failing check decides the reject reason. Rejection is
//! routine, never an error; invalid commands simply leave the state
//! untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use sotto_curve::PointOps;
use sotto_domain::{Command, PubKey, Signature};
use sotto_hash::FieldHash;

/// Why a command was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// Targets leaf zero or a leaf never assigned to a participant
    UnknownStateIndex,
    /// Signature does not verify against the key stored in the leaf
    InvalidSignature,
    /// Nonce is not exactly one above the leaf nonce
    NonceMismatch { expected: u64, got: u64 },
    /// Vote option index at or beyond the configured maximum
    OptionOutOfRange { index: u64, max: u64 },
    /// Quadratic charge exceeds the remaining balance
    InsufficientCredits { required: u128, available: u64 },
    /// Ciphertext did not decrypt to a well-formed command
    Malformed,
}

impl RejectReason {
    /// Stable snake_case label used in audit exports
    pub fn label(&self) -> &'static str {
        match self {
            RejectReason::UnknownStateIndex => "unknown_state_index",
            RejectReason::InvalidSignature => "invalid_signature",
            RejectReason::NonceMismatch { .. } => "nonce_mismatch",
            RejectReason::OptionOutOfRange { .. } => "option_out_of_range",
            RejectReason::InsufficientCredits { .. } => "insufficient_credits",
            RejectReason::Malformed => "malformed",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::UnknownStateIndex => write!(f, "unknown state index"),
            RejectReason::InvalidSignature => write!(f, "invalid signature"),
            RejectReason::NonceMismatch { expected, got } => {
                write!(f, "nonce mismatch (expected {expected}, got {got})")
            }
            RejectReason::OptionOutOfRange { index, max } => {
                write!(f, "vote option {index} out of range (max {max})")
            }
            RejectReason::InsufficientCredits { required, available } => {
                write!(
                    f,
                    "insufficient voice credits (need {required}, have {available})"
                )
            }
            RejectReason::Malformed => write!(f, "malformed message"),
        }
    }
}

/// Outcome of validating one command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Command is valid; `new_balance` is the leaf balance after settlement
    Accept { new_balance: u64 },
    Reject(RejectReason),
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept { .. })
    }

    /// Stable snake_case label used in audit exports
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Accept { .. } => "accepted",
            Decision::Reject(reason) => reason.label(),
        }
    }
}

/// Everything validation needs to know about the targeted leaf.
#[derive(Clone, Copy, Debug)]
pub struct LeafContext {
    /// Key the command must be signed with
    pub pub_key: PubKey,
    /// Last accepted nonce
    pub nonce: u64,
    /// Remaining voice credits
    pub voice_credit_balance: u64,
    /// Weight currently recorded for the command's vote option
    pub prev_weight: u64,
}

/// Validates commands against leaf state under fixed election parameters.
#[derive(Clone, Copy, Debug)]
pub struct CommandValidator {
    max_vote_options: u64,
    num_signups: u64,
}

impl CommandValidator {
    pub fn new(max_vote_options: u64, num_signups: u64) -> Self {
        Self {
            max_vote_options,
            num_signups,
        }
    }

    /// Participants occupy leaves `1..=num_signups`; leaf zero is reserved.
    pub fn check_state_index(&self, state_index: u64) -> Option<RejectReason> {
        if state_index == 0 || state_index > self.num_signups {
            Some(RejectReason::UnknownStateIndex)
        } else {
            None
        }
    }

    /// Run the full check ladder for one command.
    ///
    /// `leaf` must describe the leaf at `command.state_index`; callers
    /// resolve the index with [`check_state_index`](Self::check_state_index)
    /// first, but the index is re-checked here so a bad call cannot slip an
    /// out-of-range command through.
    pub fn validate<C: PointOps, H: FieldHash>(
        &self,
        curve: &C,
        hasher: &H,
        leaf: &LeafContext,
        command: &Command,
        signature: &Signature,
    ) -> Decision {
        if let Some(reason) = self.check_state_index(command.state_index) {
            return Decision::Reject(reason);
        }

        if !command.verify(curve, hasher, &leaf.pub_key, signature) {
            return Decision::Reject(RejectReason::InvalidSignature);
        }

        let expected = leaf.nonce + 1;
        if command.nonce != expected {
            return Decision::Reject(RejectReason::NonceMismatch {
                expected,
                got: command.nonce,
            });
        }

        if command.vote_option_index >= self.max_vote_options {
            return Decision::Reject(RejectReason::OptionOutOfRange {
                index: command.vote_option_index,
                max: self.max_vote_options,
            });
        }

        match settle_credits(
            leaf.voice_credit_balance,
            leaf.prev_weight,
            command.new_vote_weight,
        ) {
            Some(new_balance) => Decision::Accept { new_balance },
            None => Decision::Reject(RejectReason::InsufficientCredits {
                required: quadratic_cost(command.new_vote_weight)
                    - quadratic_cost(leaf.prev_weight),
                available: leaf.voice_credit_balance,
            }),
        }
    }
}

/// Credits consumed by a vote of the given weight
pub fn quadratic_cost(weight: u64) -> u128 {
    (weight as u128) * (weight as u128)
}

/// Settle the quadratic charge for moving a vote from `prev_weight` to
/// `new_weight`.
///
/// Returns the post-command balance, or `None` when the balance cannot
/// cover the charge. A shrinking weight refunds the difference; `prev_weight`
/// was paid out of this same balance earlier, so the refunded sum still fits
/// in a `u64`.
pub fn settle_credits(balance: u64, prev_weight: u64, new_weight: u64) -> Option<u64> {
    let prev_cost = quadratic_cost(prev_weight);
    let new_cost = quadratic_cost(new_weight);

    if new_cost >= prev_cost {
        let charge = new_cost - prev_cost;
        if charge > balance as u128 {
            return None;
        }
        Some(balance - charge as u64)
    } else {
        Some(balance + (prev_cost - new_cost) as u64)
    }
}
