//! Deterministic election state engine.
//!
//! This crate reconstructs an election's off-chain state from its on-chain
//! history and replays encrypted vote commands in reverse batch order,
//! producing for every batch the inputs a state transition proof consumes.
//! Everything here is deterministic: two replays of the same events reach
//! identical roots, which is the property the proof bridge checks before a
//! batch is committed.

pub mod audit;
pub mod batch;
pub mod election;
pub mod errors;
pub mod period;
pub mod tally;
pub mod validator;
pub mod vote_record;

pub use audit::{to_csv, AuditRow, AUDIT_CSV_HEADER};
pub use batch::{BatchCircuitInputs, SlotInput, StagedBatch};
pub use election::{Election, ElectionParams, PublishedMessage, UserRecord};
pub use errors::{CoreError, CoreResult};
pub use period::Period;
pub use tally::{recount, TallyAccumulator, TallyResult};
pub use validator::{
    quadratic_cost, settle_credits, CommandValidator, Decision, LeafContext, RejectReason,
};
pub use vote_record::VoteRecord;
