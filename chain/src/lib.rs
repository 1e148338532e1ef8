//! Chain plumbing for the election engine.
//!
//! Events come in through an [`EventSource`], get replayed into the engine
//! by the [`EventIngester`], and attested batch roots leave through a
//! [`BatchSubmitter`]. The [`Coordinator`] ties the three together; the
//! file-backed [`EventLog`] serves as both source and local record.

pub mod coordinator;
pub mod errors;
pub mod events;
pub mod ingest;
pub mod log;
pub mod source;

pub use coordinator::Coordinator;
pub use errors::{ChainError, ChainResult};
pub use events::{ChainEvent, MessageEvent, SignupEvent};
pub use ingest::EventIngester;
pub use log::EventLog;
pub use source::{BatchSubmitter, DryRunSubmitter, EventSource};
