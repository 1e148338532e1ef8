//! Init Command - Initialize a new election data directory

use std::fs;
use std::path::PathBuf;

use clap::Args;
use sotto_domain::PubKey;
use tracing::info;

use crate::config::{default_config_path, default_data_dir, SottoConfig};

/// Initialize a new election data directory
#[derive(Args)]
pub struct InitCommand {
    /// Coordinator public key recorded in the config (sottopk. string)
    #[arg(long)]
    coordinator: Option<String>,

    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

impl InitCommand {
    pub async fn execute(self, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let config_path = default_config_path(&data_dir);

        info!("Initializing election data directory");
        info!("Data directory: {}", data_dir.display());

        if config_path.exists() && !self.force {
            anyhow::bail!(
                "Election already initialized at {}. Use --force to overwrite.",
                data_dir.display()
            );
        }

        if let Some(ref key) = self.coordinator {
            PubKey::deserialize(key)?;
        }

        fs::create_dir_all(&data_dir)?;

        let mut config = SottoConfig::default();
        config.coordinator.pub_key = self.coordinator;
        config.save(&config_path)?;

        info!("Configuration saved to {}", config_path.display());

        println!();
        println!("✅ Election initialized successfully!");
        println!();
        println!("Configuration: {}", config_path.display());
        println!("Data directory: {}", data_dir.display());
        println!();
        if config.coordinator.pub_key.is_none() {
            println!("No coordinator key configured yet. Generate one and record it:");
            println!("  sotto keygen");
            println!("  sotto init --force --coordinator <sottopk. key> --data-dir {}", data_dir.display());
        } else {
            println!("To record the first signup:");
            println!("  sotto signup --key <sottopk. key> --data-dir {}", data_dir.display());
        }

        Ok(())
    }
}
