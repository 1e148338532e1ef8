//! Sotto Coordinator CLI
//!
//! Command-line interface for running a sotto election end to end.
//!
//! # Usage
//!
//! ```bash
//! # Initialize a data directory and config
//! sotto init --coordinator <sottopk. key>
//!
//! # Generate a participant keypair
//! sotto keygen
//!
//! # Record a signup on the event log
//! sotto signup --key <sottopk. key> --credits 100
//!
//! # Publish an encrypted vote
//! sotto publish --key <sottosk. key> --state-index 1 --vote-option 2 --weight 9 --nonce 1
//!
//! # Replay the log, process every batch and seal the tally
//! sotto tally --key <coordinator sottosk. key>
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;

use commands::{
    InitCommand, KeygenCommand, ProcessCommand, PubkeyCommand, PublishCommand, SignupCommand,
    StatusCommand, TallyCommand,
};

/// Sotto Election Coordinator
#[derive(Parser)]
#[command(name = "sotto")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Collusion-resistant encrypted voting coordinator", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, global = true, env = "SOTTO_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new election data directory
    Init(InitCommand),

    /// Generate a keypair
    Keygen(KeygenCommand),

    /// Derive the public key of a serialized private key
    Pubkey(PubkeyCommand),

    /// Record a participant signup on the event log
    Signup(SignupCommand),

    /// Sign, encrypt and record a vote message
    Publish(PublishCommand),

    /// Replay the event log and process every message batch
    Process(ProcessCommand),

    /// Process every batch, seal the tally and write the results
    Tally(TallyCommand),

    /// Show election status from the event log
    Status(StatusCommand),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    logging::init(&cli.log_level, cli.json_logs)?;

    // Execute command
    match cli.command {
        Commands::Init(cmd) => cmd.execute(cli.data_dir).await,
        Commands::Keygen(cmd) => cmd.execute().await,
        Commands::Pubkey(cmd) => cmd.execute().await,
        Commands::Signup(cmd) => cmd.execute(cli.config, cli.data_dir).await,
        Commands::Publish(cmd) => cmd.execute(cli.config, cli.data_dir).await,
        Commands::Process(cmd) => cmd.execute(cli.config, cli.data_dir).await,
        Commands::Tally(cmd) => cmd.execute(cli.config, cli.data_dir).await,
        Commands::Status(cmd) => cmd.execute(cli.config, cli.data_dir).await,
        Commands::Version => {
            println!("sotto {}", env!("CARGO_PKG_VERSION"));
            println!("Protocol: collusion-resistant encrypted voting");
            println!("Curve: Baby Jubjub over BN254");
            Ok(())
        }
    }
}
