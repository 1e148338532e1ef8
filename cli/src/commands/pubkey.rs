//! Pubkey Command - Derive a public key

use clap::Args;
use sotto_curve::BabyJubjub;
use sotto_domain::PrivKey;

/// Derive the public key of a serialized private key
#[derive(Args)]
pub struct PubkeyCommand {
    /// Serialized private key (sottosk. string)
    #[arg(short, long, env = "SOTTO_PRIVATE_KEY")]
    key: String,
}

impl PubkeyCommand {
    pub async fn execute(self) -> anyhow::Result<()> {
        let priv_key = PrivKey::deserialize(&self.key)?;
        let pub_key = priv_key.public_key(&BabyJubjub::new());

        println!("{}", pub_key.serialize()?);

        Ok(())
    }
}
