//! Status Command - Show election status

use std::path::PathBuf;

use clap::Args;
use sotto_chain::{ChainEvent, EventLog};

use crate::config::{default_data_dir, SottoConfig};

/// Show election status from the event log
#[derive(Args)]
pub struct StatusCommand {}

impl StatusCommand {
    pub async fn execute(
        self,
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let config = SottoConfig::resolve(config_path.as_deref(), &data_dir)?;
        let params = config.election.params();

        let log = EventLog::open(data_dir.join(&config.storage.event_log))?;
        let signups = log
            .events()
            .iter()
            .filter(|e| matches!(e, ChainEvent::Signup(_)))
            .count();
        let messages = log.len() - signups;
        let batch_size = params.message_batch_size;
        let batches = (messages + batch_size - 1) / batch_size;

        let phase = if messages > 0 {
            "voting"
        } else if signups > 0 {
            "signing up"
        } else {
            "created"
        };

        println!("Election parameters:");
        println!("  State tree depth:        {}", params.state_tree_depth);
        println!("  Message tree depth:      {}", params.message_tree_depth);
        println!("  Vote option tree depth:  {}", params.vote_option_tree_depth);
        println!("  Message batch size:      {}", params.message_batch_size);
        println!("  Vote options:            {}", params.max_vote_options);
        println!();
        println!("Event log: {}", log.path().display());
        println!("  Events:     {}", log.len());
        println!("  Signups:    {} (capacity {})", signups, params.max_signups());
        println!("  Messages:   {}", messages);
        println!("  Batches:    {}", batches);
        println!("  Next block: {}", log.next_block());
        println!();
        println!("Phase: {}", phase);
        match config.coordinator.pub_key {
            Some(key) => println!("Coordinator key: {}", key),
            None => println!("Coordinator key: not configured"),
        }

        Ok(())
    }
}
