//! Event ingestion.
//!
//! The ingester replays chain events into an election, tracking a cursor
//! so overlapping fetches are idempotent: an event at or before the cursor
//! is silently skipped, never applied twice. Period transitions are driven
//! by the events themselves; the first signup opens signups and the first
//! message closes them.

use tracing::{debug, warn};

use sotto_core::{Election, Period};
use sotto_curve::PointOps;
use sotto_hash::FieldHash;

use crate::errors::{ChainError, ChainResult};
use crate::events::ChainEvent;

#[derive(Clone, Copy, Debug, Default)]
pub struct EventIngester {
    /// Ordering key of the last applied event
    cursor: Option<(u64, u64)>,
    seen_message: bool,
}

impl EventIngester {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<(u64, u64)> {
        self.cursor
    }

    /// Apply a single event; returns `false` when the cursor already
    /// covers it.
    pub fn apply<H: FieldHash, C: PointOps>(
        &mut self,
        election: &mut Election<H, C>,
        event: &ChainEvent,
    ) -> ChainResult<bool> {
        let key = event.key();
        if let Some(cursor) = self.cursor {
            if key <= cursor {
                debug!(block = key.0, log_index = key.1, "event already applied");
                return Ok(false);
            }
        }

        match event {
            ChainEvent::Signup(signup) => {
                if self.seen_message {
                    warn!(block = signup.block, "signup received after voting began");
                    return Err(ChainError::SignupAfterVoting {
                        block: signup.block,
                        log_index: signup.log_index,
                    });
                }
                if election.period() == Period::Created {
                    election.open_signups()?;
                }
                election.signup(signup.pub_key, signup.voice_credits)?;
            }
            ChainEvent::Message(published) => {
                if !self.seen_message {
                    if election.period() == Period::Created {
                        election.open_signups()?;
                    }
                    if election.period() == Period::SigningUp {
                        election.begin_voting()?;
                    }
                    self.seen_message = true;
                }
                election.publish_message(
                    published.message,
                    published.enc_pub_key,
                    published.block,
                )?;
            }
        }

        self.cursor = Some(key);
        Ok(true)
    }

    /// Apply a sorted run of events, returning how many were new
    pub fn apply_all<H: FieldHash, C: PointOps>(
        &mut self,
        election: &mut Election<H, C>,
        events: &[ChainEvent],
    ) -> ChainResult<usize> {
        let mut applied = 0;
        for event in events {
            if self.apply(election, event)? {
                applied += 1;
            }
        }
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sotto_core::ElectionParams;
    use sotto_curve::BabyJubjub;
    use sotto_domain::{Field, Keypair, Message};
    use sotto_hash::Poseidon;

    use crate::events::{MessageEvent, SignupEvent};

    fn new_election() -> Election<Poseidon, BabyJubjub> {
        let curve = BabyJubjub::new();
        let mut rng = StdRng::seed_from_u64(11);
        let coordinator = Keypair::generate(&curve, &mut rng);
        let params = ElectionParams {
            state_tree_depth: 4,
            message_tree_depth: 4,
            vote_option_tree_depth: 2,
            message_batch_size: 2,
            max_vote_options: 4,
        };
        Election::new(params, coordinator, Poseidon::new(), curve).unwrap()
    }

    fn sample_events() -> Vec<ChainEvent> {
        let curve = BabyJubjub::new();
        let mut rng = StdRng::seed_from_u64(12);
        let alice = Keypair::generate(&curve, &mut rng);
        let bob = Keypair::generate(&curve, &mut rng);

        vec![
            ChainEvent::Signup(SignupEvent {
                block: 1,
                log_index: 0,
                pub_key: alice.pub_key,
                voice_credits: 100,
            }),
            ChainEvent::Signup(SignupEvent {
                block: 1,
                log_index: 1,
                pub_key: bob.pub_key,
                voice_credits: 50,
            }),
            ChainEvent::Message(MessageEvent {
                block: 2,
                log_index: 0,
                message: Message::from_words([Field::from(9u64); sotto_domain::MESSAGE_LENGTH]),
                enc_pub_key: alice.pub_key,
            }),
        ]
    }

    #[test]
    fn test_events_drive_period_transitions() {
        let mut election = new_election();
        let mut ingester = EventIngester::new();

        let applied = ingester.apply_all(&mut election, &sample_events()).unwrap();
        assert_eq!(applied, 3);
        assert_eq!(election.period(), Period::Voting);
        assert_eq!(election.num_signups(), 2);
        assert_eq!(election.num_messages(), 1);
        assert_eq!(ingester.cursor(), Some((2, 0)));
    }

    #[test]
    fn test_overlapping_fetches_are_idempotent() {
        let events = sample_events();

        let mut once = new_election();
        let mut once_ingester = EventIngester::new();
        once_ingester.apply_all(&mut once, &events).unwrap();

        let mut twice = new_election();
        let mut twice_ingester = EventIngester::new();
        twice_ingester.apply_all(&mut twice, &events[..2]).unwrap();
        // The second fetch overlaps the first
        let applied = twice_ingester.apply_all(&mut twice, &events).unwrap();
        assert_eq!(applied, 1);

        assert_eq!(once.state_root(), twice.state_root());
        assert_eq!(once.message_root(), twice.message_root());
    }

    #[test]
    fn test_signup_after_message_is_refused() {
        let mut election = new_election();
        let mut ingester = EventIngester::new();
        let mut events = sample_events();
        let late_signup = ChainEvent::Signup(SignupEvent {
            block: 3,
            log_index: 0,
            pub_key: match events[0] {
                ChainEvent::Signup(signup) => signup.pub_key,
                _ => unreachable!(),
            },
            voice_credits: 10,
        });
        events.push(late_signup);

        let err = ingester.apply_all(&mut election, &events).unwrap_err();
        assert!(matches!(
            err,
            ChainError::SignupAfterVoting { block: 3, .. }
        ));
        // Everything before the bad event still landed
        assert_eq!(election.num_signups(), 2);
        assert_eq!(election.num_messages(), 1);
    }
}
