//! Tally Command - Process every batch and seal the totals

use std::fs;
use std::path::PathBuf;

use clap::Args;
use rand::rngs::OsRng;
use sotto_chain::{Coordinator, DryRunSubmitter, EventIngester, EventLog};
use sotto_core::{to_csv, Election};
use sotto_curve::BabyJubjub;
use sotto_domain::ser::field_to_decimal;
use sotto_domain::{Keypair, PrivKey, PubKey};
use sotto_hash::Poseidon;
use sotto_prover::{ProofBridge, ReplayWitnessGenerator};
use tracing::info;

use crate::config::{default_data_dir, SottoConfig};

/// Process every batch, seal the tally and write the results
#[derive(Args)]
pub struct TallyCommand {
    /// Coordinator private key (sottosk. string)
    #[arg(short, long, env = "SOTTO_COORDINATOR_KEY")]
    key: String,

    /// Tally output file (defaults to the configured one in the data directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Audit trail output file (defaults to the configured one in the data directory)
    #[arg(long)]
    audit: Option<PathBuf>,
}

impl TallyCommand {
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
            anyhow::bail!("event log {} is empty, nothing to tally", log.path().display());
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
        let result = coordinator
            .run(&mut election, &mut ingester, &mut OsRng)
            .await?;

        let tally_path = self
            .output
            .unwrap_or_else(|| data_dir.join(&config.storage.tally_file));
        fs::write(&tally_path, serde_json::to_string_pretty(&result)?)?;

        let audit_path = self
            .audit
            .unwrap_or_else(|| data_dir.join(&config.storage.audit_file));
        fs::write(&audit_path, to_csv(election.audit_rows()))?;

        info!(
            total_votes = %result.total_votes,
            "tally sealed and written"
        );

        println!("✅ Tally sealed");
        println!();
        println!("{:<8} {:<12} Credits", "Option", "Votes");
        for (option, votes) in result.votes.iter().enumerate() {
            println!(
                "{:<8} {:<12} {}",
                option, votes, result.voice_credits_spent[option]
            );
        }
        println!();
        println!("Total votes:          {}", result.total_votes);
        println!("Total credits spent:  {}", result.total_voice_credits_spent);
        println!("Final state root:     {}", field_to_decimal(&election.state_root()));
        println!();
        println!("Tally written to {}", tally_path.display());
        println!("Audit trail written to {}", audit_path.display());

        Ok(())
    }
}
