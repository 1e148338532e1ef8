//! Election period state machine.
//!
//! An election moves through a fixed sequence of periods. Signups are only
//! accepted while signing up, messages only while voting, and batches only
//! while processing. The processing period carries the number of batches
//! still outstanding; batches are consumed from the highest index down to
//! zero, so the next expected batch is always `remaining - 1`.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    /// Election created, signups not yet open.
    Created,
    /// Participants may sign up.
    SigningUp,
    /// Participants may publish messages.
    Voting,
    /// The coordinator is replaying message batches in reverse order.
    Processing { remaining: u64 },
    /// All batches processed and the tally sealed.
    Tallied,
}

impl Period {
    pub fn name(&self) -> &'static str {
        match self {
            Period::Created => "created",
            Period::SigningUp => "signing-up",
            Period::Voting => "voting",
            Period::Processing { .. } => "processing",
            Period::Tallied => "tallied",
        }
    }

    /// Index of the batch the engine expects next, newest window first.
    pub fn next_batch_index(&self) -> Option<u64> {
        match self {
            Period::Processing { remaining } => remaining.checked_sub(1),
            _ => None,
        }
    }

    /// True once every batch has been committed (or there were none).
    pub fn is_processing_complete(&self) -> bool {
        matches!(self, Period::Processing { remaining: 0 })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Processing { remaining } => {
                write!(f, "processing ({remaining} batches remaining)")
            }
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_batch_counts_down() {
        assert_eq!(Period::Processing { remaining: 3 }.next_batch_index(), Some(2));
        assert_eq!(Period::Processing { remaining: 1 }.next_batch_index(), Some(0));
        assert_eq!(Period::Processing { remaining: 0 }.next_batch_index(), None);
        assert_eq!(Period::Voting.next_batch_index(), None);
    }

    #[test]
    fn completion_requires_zero_remaining() {
        assert!(Period::Processing { remaining: 0 }.is_processing_complete());
        assert!(!Period::Processing { remaining: 1 }.is_processing_complete());
        assert!(!Period::Tallied.is_processing_complete());
    }
}
