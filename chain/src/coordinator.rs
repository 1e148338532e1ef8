//! The coordinator's processing loop.
//!
//! One loop drives an election end to end: replay the chain history into
//! the engine, then for every batch stage the transition, have the bridge
//! attest the claimed root, submit the attested root, and only then commit.
//! An attestation failure stops the loop before anything from the failing
//! batch becomes live.

use rand::Rng;
use tracing::info;

use sotto_core::{Election, TallyResult};
use sotto_curve::PointOps;
use sotto_hash::FieldHash;
use sotto_prover::{ProofBridge, RootAttestation, WitnessGenerator};

use crate::errors::ChainResult;
use crate::ingest::EventIngester;
use crate::source::{BatchSubmitter, EventSource};

pub struct Coordinator<S, T, W> {
    source: S,
    submitter: T,
    bridge: ProofBridge<W>,
}

impl<S: EventSource, T: BatchSubmitter, W: WitnessGenerator> Coordinator<S, T, W> {
    pub fn new(source: S, submitter: T, bridge: ProofBridge<W>) -> Self {
        Self {
            source,
            submitter,
            bridge,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Pull the event history and replay it into the election
    pub async fn sync<H: FieldHash, C: PointOps>(
        &self,
        election: &mut Election<H, C>,
        ingester: &mut EventIngester,
    ) -> ChainResult<usize> {
        let from_block = ingester.cursor().map(|(block, _)| block).unwrap_or(0);
        let events = self.source.fetch_events(from_block).await?;
        let applied = ingester.apply_all(election, &events)?;
        info!(fetched = events.len(), applied, "synchronized with the chain");
        Ok(applied)
    }

    /// Close voting and drive every batch through stage, attest, submit,
    /// commit, newest window first.
    pub async fn process<H: FieldHash, C: PointOps, R: Rng>(
        &self,
        election: &mut Election<H, C>,
        rng: &mut R,
    ) -> ChainResult<Vec<RootAttestation>> {
        let batches = election.begin_processing()?;
        let mut attestations = Vec::with_capacity(batches as usize);

        while let Some(batch_index) = election.period().next_batch_index() {
            let fresh_zero = election.sample_zero_leaf(rng);
            let staged = election.stage_batch(batch_index, fresh_zero)?;
            let attestation = self.bridge.attest(staged.inputs())?;
            self.submitter.submit(&attestation).await?;
            election.commit_batch(staged)?;
            attestations.push(attestation);
        }

        info!(batches = attestations.len(), "all batches processed");
        Ok(attestations)
    }

    /// Full run: sync, process every batch, seal the tally
    pub async fn run<H: FieldHash, C: PointOps, R: Rng>(
        &self,
        election: &mut Election<H, C>,
        ingester: &mut EventIngester,
        rng: &mut R,
    ) -> ChainResult<TallyResult> {
        self.sync(election, ingester).await?;
        self.process(election, rng).await?;
        Ok(election.seal()?)
    }
}
