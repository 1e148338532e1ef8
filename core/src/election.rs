//! The election aggregate.
//!
//! An [`Election`] owns everything the coordinator reconstructs from chain
//! events: the state tree with one leaf per participant, the message
//! accumulator, the raw published messages, and the running tally. All
//! mutation goes through period-checked operations so a replay of the same
//! events always lands on the same roots.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sotto_curve::PointOps;
use sotto_domain::{Field, Keypair, Message, PubKey, StateLeaf};
use sotto_hash::FieldHash;
use sotto_tree::IncrementalTree;

use crate::audit::AuditRow;
use crate::errors::{CoreError, CoreResult};
use crate::period::Period;
use crate::tally::{recount, TallyAccumulator, TallyResult};
use crate::validator::LeafContext;
use crate::vote_record::VoteRecord;

/// Fixed parameters of one election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionParams {
    pub state_tree_depth: usize,
    pub message_tree_depth: usize,
    pub vote_option_tree_depth: usize,
    /// Messages per processed batch
    pub message_batch_size: usize,
    /// Exclusive upper bound on vote option indices
    pub max_vote_options: u64,
}

impl ElectionParams {
    pub fn validate(&self) -> CoreResult<()> {
        for (depth, what) in [
            (self.state_tree_depth, "state"),
            (self.message_tree_depth, "message"),
            (self.vote_option_tree_depth, "vote option"),
        ] {
            if !(1..=32).contains(&depth) {
                return Err(CoreError::InvalidParams(format!(
                    "{what} tree depth must be between 1 and 32, got {depth}"
                )));
            }
        }
        if self.message_batch_size == 0 {
            return Err(CoreError::InvalidParams(
                "message batch size must be positive".into(),
            ));
        }
        if self.max_vote_options == 0 {
            return Err(CoreError::InvalidParams(
                "max vote options must be positive".into(),
            ));
        }
        if self.max_vote_options > 1u64 << self.vote_option_tree_depth {
            return Err(CoreError::InvalidParams(format!(
                "max vote options {} exceed vote option tree capacity {}",
                self.max_vote_options,
                1u64 << self.vote_option_tree_depth
            )));
        }
        Ok(())
    }

    /// Leaf zero is reserved, so one less than the tree capacity
    pub fn max_signups(&self) -> usize {
        (1usize << self.state_tree_depth) - 1
    }
}

impl Default for ElectionParams {
    fn default() -> Self {
        Self {
            state_tree_depth: 10,
            message_tree_depth: 10,
            vote_option_tree_depth: 4,
            message_batch_size: 4,
            max_vote_options: 16,
        }
    }
}

/// Mutable per-participant record backing state leaf `index + 1`.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub pub_key: PubKey,
    pub voice_credit_balance: u64,
    pub nonce: u64,
    pub votes: VoteRecord,
}

impl UserRecord {
    /// Materialize the state leaf this record stands for
    pub fn state_leaf<H: FieldHash>(&self, hasher: &H) -> CoreResult<StateLeaf> {
        Ok(StateLeaf {
            pub_key: self.pub_key,
            voice_credit_balance: self.voice_credit_balance,
            vote_option_tree_root: self.votes.root(hasher)?,
            nonce: self.nonce,
        })
    }

    /// Validation view of this record for a command targeting `option`
    pub fn leaf_context(&self, option: u64) -> LeafContext {
        LeafContext {
            pub_key: self.pub_key,
            nonce: self.nonce,
            voice_credit_balance: self.voice_credit_balance,
            prev_weight: self.votes.weight(option),
        }
    }
}

/// A message as it appeared on chain.
#[derive(Clone, Copy, Debug)]
pub struct PublishedMessage {
    pub message: Message,
    /// Ephemeral key the sender encrypted under
    pub enc_pub_key: PubKey,
    /// Block the publication landed in
    pub block: u64,
}

/// The reconstructed off-chain election state.
pub struct Election<H, C> {
    pub(crate) params: ElectionParams,
    pub(crate) hasher: H,
    pub(crate) curve: C,
    pub(crate) coordinator: Keypair,
    pub(crate) period: Period,
    pub(crate) state_tree: IncrementalTree,
    pub(crate) message_tree: IncrementalTree,
    pub(crate) users: Vec<UserRecord>,
    pub(crate) messages: Vec<PublishedMessage>,
    pub(crate) zero_leaf: StateLeaf,
    pub(crate) empty_vote_root: Field,
    pub(crate) tally: TallyAccumulator,
    pub(crate) audit: Vec<AuditRow>,
}

impl<H: FieldHash, C: PointOps> Election<H, C> {
    pub fn new(params: ElectionParams, coordinator: Keypair, hasher: H, curve: C) -> CoreResult<Self> {
        params.validate()?;

        let empty_vote_root = VoteRecord::empty_root(params.vote_option_tree_depth, &hasher);
        let zero_leaf = StateLeaf::blank(empty_vote_root);

        let mut state_tree =
            IncrementalTree::new(params.state_tree_depth, Field::from(0u64), &hasher);
        state_tree.insert(zero_leaf.digest(&hasher), &hasher)?;

        let message_tree =
            IncrementalTree::new(params.message_tree_depth, Field::from(0u64), &hasher);

        Ok(Self {
            tally: TallyAccumulator::new(params.max_vote_options),
            params,
            hasher,
            curve,
            coordinator,
            period: Period::Created,
            state_tree,
            message_tree,
            users: Vec::new(),
            messages: Vec::new(),
            zero_leaf,
            empty_vote_root,
            audit: Vec::new(),
        })
    }

    pub fn params(&self) -> &ElectionParams {
        &self.params
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn coordinator_pub_key(&self) -> &PubKey {
        &self.coordinator.pub_key
    }

    pub fn state_root(&self) -> Field {
        self.state_tree.root()
    }

    pub fn message_root(&self) -> Field {
        self.message_tree.root()
    }

    /// Root of an all-zero vote option tree at this election's depth
    pub fn empty_vote_root(&self) -> Field {
        self.empty_vote_root
    }

    /// Sample a replacement zeroth leaf for the next batch.
    ///
    /// Kept separate from staging so staging stays a pure function of its
    /// arguments.
    pub fn sample_zero_leaf<R: ark_std::rand::Rng + ?Sized>(&self, rng: &mut R) -> StateLeaf {
        StateLeaf::random(&self.curve, rng, self.empty_vote_root)
    }

    pub fn num_signups(&self) -> u64 {
        self.users.len() as u64
    }

    pub fn num_messages(&self) -> u64 {
        self.messages.len() as u64
    }

    /// Participant behind a state index, if any. Leaf zero never resolves.
    pub fn user(&self, state_index: u64) -> Option<&UserRecord> {
        state_index
            .checked_sub(1)
            .and_then(|i| self.users.get(i as usize))
    }

    pub fn users(&self) -> &[UserRecord] {
        &self.users
    }

    pub fn messages(&self) -> &[PublishedMessage] {
        &self.messages
    }

    pub fn audit_rows(&self) -> &[AuditRow] {
        &self.audit
    }

    /// Number of batches processing will take for the current message count
    pub fn total_batches(&self) -> u64 {
        let len = self.messages.len() as u64;
        let batch = self.params.message_batch_size as u64;
        (len + batch - 1) / batch
    }

    pub fn open_signups(&mut self) -> CoreResult<()> {
        if self.period != Period::Created {
            return Err(self.wrong_period("open signups"));
        }
        self.period = Period::SigningUp;
        info!("signup period opened");
        Ok(())
    }

    pub fn begin_voting(&mut self) -> CoreResult<()> {
        if self.period != Period::SigningUp {
            return Err(self.wrong_period("begin voting"));
        }
        self.period = Period::Voting;
        info!(signups = self.users.len(), "voting period opened");
        Ok(())
    }

    /// Close voting and fix the batch schedule.
    ///
    /// Returns the number of batches to process; with no messages there are
    /// none and the tally is immediately available.
    pub fn begin_processing(&mut self) -> CoreResult<u64> {
        if self.period != Period::Voting {
            return Err(self.wrong_period("begin processing"));
        }
        let batches = self.total_batches();
        self.period = Period::Processing { remaining: batches };
        info!(
            messages = self.messages.len(),
            batches, "voting closed, processing begins"
        );
        Ok(batches)
    }

    /// Register a participant, returning their state index.
    ///
    /// The key is recorded as supplied; a point that never was a valid key
    /// simply can never carry a valid signature later.
    pub fn signup(&mut self, pub_key: PubKey, voice_credits: u64) -> CoreResult<u64> {
        if self.period != Period::SigningUp {
            return Err(self.wrong_period("sign up"));
        }
        if self.users.len() >= self.params.max_signups() {
            return Err(CoreError::SignupCapacity {
                capacity: self.params.max_signups(),
            });
        }

        let leaf = StateLeaf {
            pub_key,
            voice_credit_balance: voice_credits,
            vote_option_tree_root: self.empty_vote_root,
            nonce: 0,
        };
        let index = self.state_tree.insert(leaf.digest(&self.hasher), &self.hasher)?;

        self.users.push(UserRecord {
            pub_key,
            voice_credit_balance: voice_credits,
            nonce: 0,
            votes: VoteRecord::new(
                self.params.vote_option_tree_depth,
                self.params.max_vote_options,
            ),
        });

        debug!(state_index = index, voice_credits, "participant signed up");
        Ok(index as u64)
    }

    /// Accept a published message into the accumulator, returning its index
    pub fn publish_message(
        &mut self,
        message: Message,
        enc_pub_key: PubKey,
        block: u64,
    ) -> CoreResult<u64> {
        if self.period != Period::Voting {
            return Err(self.wrong_period("publish a message"));
        }
        if self.messages.len() >= self.message_tree.capacity() {
            return Err(CoreError::MessageCapacity {
                capacity: self.message_tree.capacity(),
            });
        }

        let digest = message.digest(&self.hasher, &enc_pub_key);
        let index = self.message_tree.insert(digest, &self.hasher)?;
        self.messages.push(PublishedMessage {
            message,
            enc_pub_key,
            block,
        });

        debug!(message_index = index, block, "message published");
        Ok(index as u64)
    }

    /// Current totals; available once every batch has been committed
    pub fn tally(&self) -> CoreResult<TallyResult> {
        match self.period {
            Period::Processing { remaining: 0 } | Period::Tallied => Ok(self.tally.result()),
            _ => Err(self.wrong_period("tally")),
        }
    }

    /// Cross-check the accumulated tally against a recount of the final vote
    /// records and seal the election.
    pub fn seal(&mut self) -> CoreResult<TallyResult> {
        if !matches!(self.period, Period::Processing { remaining: 0 }) {
            return Err(self.wrong_period("seal the tally"));
        }

        let result = self.tally.result();
        let recounted = recount(
            self.params.max_vote_options,
            self.users.iter().map(|user| user.votes.weights()),
        );
        if result != recounted {
            return Err(CoreError::TallyMismatch);
        }

        self.period = Period::Tallied;
        info!(total_votes = %result.total_votes, "tally sealed");
        Ok(result)
    }

    pub(crate) fn wrong_period(&self, operation: &'static str) -> CoreError {
        CoreError::WrongPeriod {
            operation,
            period: self.period.name(),
        }
    }

    /// State leaf at an index: leaf zero or a participant's current record
    pub(crate) fn leaf_at(&self, state_index: u64) -> CoreResult<StateLeaf> {
        match self.user(state_index) {
            Some(user) => user.state_leaf(&self.hasher),
            None => Ok(self.zero_leaf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_curve::BabyJubjub;
    use sotto_hash::Poseidon;

    fn small_params() -> ElectionParams {
        ElectionParams {
            state_tree_depth: 3,
            message_tree_depth: 3,
            vote_option_tree_depth: 2,
            message_batch_size: 2,
            max_vote_options: 4,
        }
    }

    fn new_election() -> Election<Poseidon, BabyJubjub> {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        let coordinator = Keypair::generate(&curve, &mut rng);
        Election::new(small_params(), coordinator, Poseidon::new(), curve).unwrap()
    }

    fn participant() -> Keypair {
        let curve = BabyJubjub::new();
        let mut rng = ark_std::test_rng();
        Keypair::generate(&curve, &mut rng)
    }

    #[test]
    fn test_params_reject_oversized_options() {
        let mut params = small_params();
        params.max_vote_options = 5;
        assert!(params.validate().is_err());
        params.max_vote_options = 4;
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_fresh_elections_share_roots() {
        let a = new_election();
        let b = new_election();
        assert_eq!(a.state_root(), b.state_root());
        assert_eq!(a.message_root(), b.message_root());
    }

    #[test]
    fn test_signup_indices_start_at_one() {
        let mut election = new_election();
        election.open_signups().unwrap();

        let user = participant();
        assert_eq!(election.signup(user.pub_key, 100).unwrap(), 1);
        assert_eq!(election.signup(user.pub_key, 100).unwrap(), 2);
        assert_eq!(election.num_signups(), 2);
        assert!(election.user(0).is_none());
        assert!(election.user(1).is_some());
        assert!(election.user(3).is_none());
    }

    #[test]
    fn test_signup_requires_signup_period() {
        let mut election = new_election();
        let user = participant();

        let err = election.signup(user.pub_key, 100).unwrap_err();
        assert!(matches!(err, CoreError::WrongPeriod { .. }));

        election.open_signups().unwrap();
        election.begin_voting().unwrap();
        let err = election.signup(user.pub_key, 100).unwrap_err();
        assert!(matches!(err, CoreError::WrongPeriod { .. }));
    }

    #[test]
    fn test_signup_capacity_reserves_leaf_zero() {
        let mut election = new_election();
        election.open_signups().unwrap();
        let user = participant();

        // Depth 3 holds 8 leaves, 7 of them for participants
        for _ in 0..7 {
            election.signup(user.pub_key, 1).unwrap();
        }
        let err = election.signup(user.pub_key, 1).unwrap_err();
        assert!(matches!(err, CoreError::SignupCapacity { capacity: 7 }));
    }

    #[test]
    fn test_signup_moves_state_root() {
        let mut election = new_election();
        election.open_signups().unwrap();
        let before = election.state_root();
        election.signup(participant().pub_key, 50).unwrap();
        assert_ne!(election.state_root(), before);
    }

    #[test]
    fn test_publish_requires_voting_period() {
        let mut election = new_election();
        let message = Message::from_words([Field::from(1u64); sotto_domain::MESSAGE_LENGTH]);
        let err = election
            .publish_message(message, participant().pub_key, 1)
            .unwrap_err();
        assert!(matches!(err, CoreError::WrongPeriod { .. }));
    }

    #[test]
    fn test_publish_moves_message_root() {
        let mut election = new_election();
        election.open_signups().unwrap();
        election.begin_voting().unwrap();

        let before = election.message_root();
        let message = Message::from_words([Field::from(1u64); sotto_domain::MESSAGE_LENGTH]);
        let index = election
            .publish_message(message, participant().pub_key, 5)
            .unwrap();
        assert_eq!(index, 0);
        assert_ne!(election.message_root(), before);
    }

    #[test]
    fn test_batch_schedule() {
        let mut election = new_election();
        election.open_signups().unwrap();
        election.begin_voting().unwrap();

        let message = Message::from_words([Field::from(2u64); sotto_domain::MESSAGE_LENGTH]);
        for block in 0..5 {
            election
                .publish_message(message, participant().pub_key, block)
                .unwrap();
        }

        // Five messages in batches of two: three batches
        assert_eq!(election.begin_processing().unwrap(), 3);
        assert_eq!(election.period().next_batch_index(), Some(2));
    }

    #[test]
    fn test_no_messages_means_no_batches() {
        let mut election = new_election();
        election.open_signups().unwrap();
        election.begin_voting().unwrap();

        assert_eq!(election.begin_processing().unwrap(), 0);
        assert!(election.period().is_processing_complete());
        let tally = election.tally().unwrap();
        assert_eq!(tally.total_votes, 0);

        let sealed = election.seal().unwrap();
        assert_eq!(sealed.total_votes, 0);
        assert_eq!(election.period(), Period::Tallied);
    }

    #[test]
    fn test_tally_unavailable_while_batches_remain() {
        let mut election = new_election();
        election.open_signups().unwrap();
        election.begin_voting().unwrap();
        let message = Message::from_words([Field::from(3u64); sotto_domain::MESSAGE_LENGTH]);
        election
            .publish_message(message, participant().pub_key, 1)
            .unwrap();
        election.begin_processing().unwrap();

        assert!(matches!(
            election.tally().unwrap_err(),
            CoreError::WrongPeriod { .. }
        ));
    }
}
