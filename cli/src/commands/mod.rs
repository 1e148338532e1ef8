//! CLI Commands

mod init;
mod keygen;
mod process;
mod pubkey;
mod publish;
mod signup;
mod status;
mod tally;

pub use init::InitCommand;
pub use keygen::KeygenCommand;
pub use process::ProcessCommand;
pub use pubkey::PubkeyCommand;
pub use publish::PublishCommand;
pub use signup::SignupCommand;
pub use status::StatusCommand;
pub use tally::TallyCommand;
