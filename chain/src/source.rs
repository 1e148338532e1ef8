//! Abstract boundaries to the chain.
//!
//! The coordinator is generic over where events come from and where batch
//! roots go, so the same loop runs against a file log in tests and a real
//! chain client in a deployment.

use async_trait::async_trait;
use tracing::info;

use sotto_prover::RootAttestation;

use crate::errors::ChainResult;
use crate::events::ChainEvent;

/// Produces chain events in `(block, log_index)` order.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Fetch every known event from `from_block` onward, sorted
    async fn fetch_events(&self, from_block: u64) -> ChainResult<Vec<ChainEvent>>;
}

/// Accepts attested batch roots for publication.
#[async_trait]
pub trait BatchSubmitter: Send + Sync {
    async fn submit(&self, attestation: &RootAttestation) -> ChainResult<()>;
}

/// Submitter for local runs: announces each attested root and drops it.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRunSubmitter;

#[async_trait]
impl BatchSubmitter for DryRunSubmitter {
    async fn submit(&self, attestation: &RootAttestation) -> ChainResult<()> {
        info!(
            batch_index = attestation.batch_index,
            "dry run, attested root not submitted"
        );
        Ok(())
    }
}
