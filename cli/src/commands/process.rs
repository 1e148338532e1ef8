//! Process Command - Replay the event log and process every batch

use std::path::PathBuf;

use clap::Args;
use rand::rngs::OsRng;
use sotto_chain::{Coordinator, DryRunSubmitter, EventIngester, EventLog};
use sotto_core::Election;
use sotto_curve::BabyJubjub;
use sotto_domain::ser::{field_from_decimal, field_to_decimal};
use sotto_domain::{Keypair, PrivKey, PubKey};
use sotto_hash::Poseidon;
use sotto_prover::{ProofBridge, ReplayWitnessGenerator};

use crate::config::{default_data_dir, SottoConfig};

/// Replay the event log and process every message batch
#[derive(Args)]
pub struct ProcessCommand {
    /// Coordinator private key (sottosk. string)
    #[arg(short, long, env = "SOTTO_COORDINATOR_KEY")]
    key: String,

    /// Fail unless the final state root equals this decimal field element,
    /// e.g. the root an on-chain contract reports
    #[arg(long)]
    expect_root: Option<String>,
}

impl ProcessCommand {
    pub async fn execute(
        self,
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let config = SottoConfig::resolve(config_path.as_deref(), &data_dir)?;

        let curve = BabyJubjub::new();
        let keypair = Keypair::from_priv_key(&curve, PrivKey::deserialize(&self.key)?);
        if let Some(ref configured) = config.coordinator.pub_key {
            if PubKey::deserialize(configured)? != keypair.pub_key {
                anyhow::bail!("private key does not match the configured coordinator key");
            }
        }

        let log = EventLog::open(data_dir.join(&config.storage.event_log))?;
        if log.is_empty() {
            anyhow::bail!("event log {} is empty, nothing to process", log.path().display());
        }

        let mut election = Election::new(
            config.election.params(),
            keypair.clone(),
            Poseidon::new(),
            BabyJubjub::new(),
        )?;
        let bridge = ProofBridge::new(ReplayWitnessGenerator::new(
            keypair,
            Poseidon::new(),
            BabyJubjub::new(),
        ));
        let coordinator = Coordinator::new(log, DryRunSubmitter, bridge);

        let mut ingester = EventIngester::new();
        coordinator.sync(&mut election, &mut ingester).await?;
        let attestations = coordinator.process(&mut election, &mut OsRng).await?;

        println!("Processed {} batches", attestations.len());
        for attestation in &attestations {
            println!(
                "  batch {}: root {}",
                attestation.batch_index,
                field_to_decimal(&attestation.new_state_root)
            );
        }
        let final_root = field_to_decimal(&election.state_root());
        println!();
        println!("Final state root: {}", final_root);

        if let Some(raw) = &self.expect_root {
            if election.state_root() != field_from_decimal(raw)? {
                anyhow::bail!("state root {} does not match the expected root {}", final_root, raw);
            }
            println!("✅ State root matches the expected root");
        }

        println!("Run `sotto tally` to seal and write the totals.");

        Ok(())
    }
}
