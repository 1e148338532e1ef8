//! Signup Command - Record a participant signup

use std::path::PathBuf;

use clap::Args;
use sotto_chain::{ChainEvent, EventLog, SignupEvent};
use sotto_domain::PubKey;
use tracing::info;

use crate::config::{default_data_dir, SottoConfig};

/// Record a participant signup on the event log
#[derive(Args)]
pub struct SignupCommand {
    /// Participant public key (sottopk. string)
    #[arg(short, long)]
    key: String,

    /// Voice credit balance granted at signup
    #[arg(long, default_value_t = 100)]
    credits: u64,
}

impl SignupCommand {
    pub async fn execute(
        self,
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let config = SottoConfig::resolve(config_path.as_deref(), &data_dir)?;

        let pub_key = PubKey::deserialize(&self.key)?;

        let mut log = EventLog::open(data_dir.join(&config.storage.event_log))?;

        // The replay refuses signups once voting has begun; refuse here too so
        // the log stays replayable.
        let signups = count_signups(&log);
        if log.events().iter().any(|e| matches!(e, ChainEvent::Message(_))) {
            anyhow::bail!("voting has begun, signups are closed");
        }
        if signups >= config.election.params().max_signups() {
            anyhow::bail!(
                "state tree is full ({} signups)",
                config.election.params().max_signups()
            );
        }

        let block = log.next_block();
        log.append(ChainEvent::Signup(SignupEvent {
            block,
            log_index: 0,
            pub_key,
            voice_credits: self.credits,
        }))?;

        info!(block, credits = self.credits, "signup recorded");

        // Leaf zero is reserved, so indices start at one
        println!("Signup recorded at block {}", block);
        println!("State index: {}", signups + 1);

        Ok(())
    }
}

fn count_signups(log: &EventLog) -> usize {
    log.events()
        .iter()
        .filter(|e| matches!(e, ChainEvent::Signup(_)))
        .count()
}
