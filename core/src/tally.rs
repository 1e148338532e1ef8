//! Vote tally accumulation.
//!
//! The tally is maintained incrementally: every accepted command contributes
//! the delta between its new and previous weight (and between their squares,
//! for credits). Summed over all accepted commands the deltas telescope down
//! to the final recorded weights, so the accumulator and a recount from the
//! final vote records must agree exactly.

use serde::{Deserialize, Serialize};

use crate::validator::quadratic_cost;

/// Running per-option totals.
///
/// Entries are signed while accumulating because a batch in isolation can
/// move an option down; completed totals are never negative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TallyAccumulator {
    votes: Vec<i128>,
    credits: Vec<i128>,
}

impl TallyAccumulator {
    pub fn new(max_options: u64) -> Self {
        Self {
            votes: vec![0; max_options as usize],
            credits: vec![0; max_options as usize],
        }
    }

    /// Record one accepted command.
    ///
    /// Only accepted commands reach here; an accepted weight is bounded by
    /// the credit balance that paid for it, so the squared terms fit well
    /// inside `i128`.
    pub fn apply(&mut self, option: u64, prev_weight: u64, new_weight: u64) {
        let Some(slot) = self.votes.get_mut(option as usize) else {
            return;
        };
        *slot += new_weight as i128 - prev_weight as i128;
        self.credits[option as usize] +=
            quadratic_cost(new_weight) as i128 - quadratic_cost(prev_weight) as i128;
    }

    /// Fold another accumulator (typically one batch's deltas) into this one
    pub fn merge(&mut self, other: &TallyAccumulator) {
        for (mine, theirs) in self.votes.iter_mut().zip(&other.votes) {
            *mine += theirs;
        }
        for (mine, theirs) in self.credits.iter_mut().zip(&other.credits) {
            *mine += theirs;
        }
    }

    /// Snapshot the totals
    pub fn result(&self) -> TallyResult {
        TallyResult::from_totals(
            self.votes.iter().map(|v| (*v).max(0) as u128).collect(),
            self.credits.iter().map(|c| (*c).max(0) as u128).collect(),
        )
    }
}

/// Final per-option vote and credit totals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyResult {
    /// Sum of vote weights per option
    pub votes: Vec<u128>,
    /// Sum of squared vote weights per option
    pub voice_credits_spent: Vec<u128>,
    pub total_votes: u128,
    pub total_voice_credits_spent: u128,
}

impl TallyResult {
    fn from_totals(votes: Vec<u128>, voice_credits_spent: Vec<u128>) -> Self {
        let total_votes = votes.iter().sum();
        let total_voice_credits_spent = voice_credits_spent.iter().sum();
        Self {
            votes,
            voice_credits_spent,
            total_votes,
            total_voice_credits_spent,
        }
    }
}

/// Recount from final vote records, one weight slice per participant.
///
/// This is the ground truth the incremental accumulator is checked against
/// when an election is sealed.
pub fn recount<'a, I>(max_options: u64, records: I) -> TallyResult
where
    I: IntoIterator<Item = &'a [u64]>,
{
    let mut votes = vec![0u128; max_options as usize];
    let mut credits = vec![0u128; max_options as usize];

    for weights in records {
        for (option, weight) in weights.iter().enumerate().take(votes.len()) {
            votes[option] += *weight as u128;
            credits[option] += quadratic_cost(*weight);
        }
    }

    TallyResult::from_totals(votes, credits)
}
