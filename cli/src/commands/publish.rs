//! Publish Command - Sign, encrypt and record a vote message

use std::path::PathBuf;

use ark_ff::UniformRand;
use clap::Args;
use rand::rngs::OsRng;
use sotto_chain::{ChainEvent, EventLog, MessageEvent};
use sotto_curve::BabyJubjub;
use sotto_domain::ser::field_from_decimal;
use sotto_domain::{ecdh, encrypt, Command, Field, Keypair, PrivKey, PubKey};
use sotto_hash::Poseidon;
use tracing::info;

use crate::config::{default_data_dir, SottoConfig};

/// Sign, encrypt and record a vote message
#[derive(Args)]
pub struct PublishCommand {
    /// Participant private key used to sign the command (sottosk. string)
    #[arg(short, long, env = "SOTTO_PRIVATE_KEY")]
    key: String,

    /// State index assigned at signup
    #[arg(short, long)]
    state_index: u64,

    /// Vote option index
    #[arg(short = 'o', long)]
    vote_option: u64,

    /// New vote weight for the option
    #[arg(short, long)]
    weight: u64,

    /// Command nonce
    #[arg(short, long)]
    nonce: u64,

    /// Rotate the account to this public key (defaults to the signing key)
    #[arg(long)]
    new_key: Option<String>,

    /// Command salt as a decimal field element (random when omitted)
    #[arg(long)]
    salt: Option<String>,

    /// Coordinator public key (overrides the configured one)
    #[arg(long)]
    coordinator: Option<String>,
}

impl PublishCommand {
    pub async fn execute(
        self,
        config_path: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> anyhow::Result<()> {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let config = SottoConfig::resolve(config_path.as_deref(), &data_dir)?;

        let coordinator = match self.coordinator.or(config.coordinator.pub_key) {
            Some(key) => PubKey::deserialize(&key)?,
            None => anyhow::bail!(
                "no coordinator key configured; pass --coordinator or set it with `sotto init`"
            ),
        };

        let curve = BabyJubjub::new();
        let hasher = Poseidon::new();

        let keypair = Keypair::from_priv_key(&curve, PrivKey::deserialize(&self.key)?);
        let new_pub_key = match self.new_key {
            Some(key) => PubKey::deserialize(&key)?,
            None => keypair.pub_key,
        };

        let salt = match &self.salt {
            Some(raw) => field_from_decimal(raw)?,
            None => Field::rand(&mut OsRng),
        };

        let command = Command {
            state_index: self.state_index,
            new_pub_key,
            vote_option_index: self.vote_option,
            new_vote_weight: self.weight,
            nonce: self.nonce,
            salt,
        };
        let signature = command.sign(&curve, &hasher, &keypair.priv_key);

        // Fresh ephemeral key per message, so ciphertexts from the same
        // participant are unlinkable.
        let ephemeral = Keypair::generate(&curve, &mut OsRng);
        let shared = ecdh(&curve, &ephemeral.priv_key, &coordinator)?;
        let message = encrypt(&hasher, &shared, &command, &signature);

        let mut log = EventLog::open(data_dir.join(&config.storage.event_log))?;
        let index = log
            .events()
            .iter()
            .filter(|e| matches!(e, ChainEvent::Message(_)))
            .count();
        let block = log.next_block();
        log.append(ChainEvent::Message(MessageEvent {
            block,
            log_index: 0,
            message,
            enc_pub_key: ephemeral.pub_key,
        }))?;

        info!(block, message_index = index, "vote message recorded");

        println!("Vote message {} recorded at block {}", index, block);

        Ok(())
    }
}
