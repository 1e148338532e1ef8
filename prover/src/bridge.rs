//! Root attestation between the engine and the witness.
//!
//! Before any batch is committed or submitted, the bridge asks its witness
//! generator to recompute the post-batch root from the circuit inputs and
//! compares the answer against the root the engine claims. Agreement is
//! the precondition for a provable transition; a mismatch means one side
//! is wrong and the whole run must stop.

use tracing::{error, info};

use sotto_core::BatchCircuitInputs;
use sotto_domain::ser::field_to_decimal;
use sotto_domain::Field;

use crate::errors::{ProverError, ProverResult};
use crate::witness::WitnessGenerator;

/// Agreement on one batch transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RootAttestation {
    pub batch_index: u64,
    pub old_state_root: Field,
    pub new_state_root: Field,
}

/// Cross-checks every staged batch against an independent witness.
pub struct ProofBridge<W> {
    generator: W,
}

impl<W: WitnessGenerator> ProofBridge<W> {
    pub fn new(generator: W) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &W {
        &self.generator
    }

    /// Attest that the claimed post-batch root is reproducible from the
    /// circuit inputs alone.
    ///
    /// [`ProverError::RootMismatch`] is fatal to the processing run:
    /// committing past it would publish a root no proof can back.
    pub fn attest(&self, inputs: &BatchCircuitInputs) -> ProverResult<RootAttestation> {
        let witness = self.generator.generate(inputs)?;

        if witness.new_state_root != inputs.new_state_root {
            error!(
                batch_index = inputs.batch_index,
                "engine and witness disagree on the post-batch state root"
            );
            return Err(ProverError::RootMismatch {
                batch_index: inputs.batch_index,
                claimed: field_to_decimal(&inputs.new_state_root),
                recomputed: field_to_decimal(&witness.new_state_root),
            });
        }

        info!(batch_index = inputs.batch_index, "batch root attested");
        Ok(RootAttestation {
            batch_index: inputs.batch_index,
            old_state_root: inputs.old_state_root,
            new_state_root: inputs.new_state_root,
        })
    }
}
