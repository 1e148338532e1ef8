//! File-backed event log.
//!
//! A single JSON file holding an election's ordered event history. In a
//! deployment this sits where a chain indexer would; locally it is both
//! the CLI's write target and the coordinator's event source, which keeps
//! every run replayable from one artifact.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{ChainError, ChainResult};
use crate::events::ChainEvent;
use crate::source::EventSource;

#[derive(Debug)]
pub struct EventLog {
    path: PathBuf,
    events: Vec<ChainEvent>,
}

impl EventLog {
    /// Open a log file; a missing file is an empty log.
    pub fn open(path: impl Into<PathBuf>) -> ChainResult<Self> {
        let path = path.into();
        let events = if path.exists() {
            let bytes = fs::read(&path)?;
            let events: Vec<ChainEvent> = serde_json::from_slice(&bytes)?;
            for (position, pair) in events.windows(2).enumerate() {
                if pair[1].key() <= pair[0].key() {
                    return Err(ChainError::UnsortedLog {
                        position: position + 1,
                    });
                }
            }
            events
        } else {
            Vec::new()
        };
        Ok(Self { path, events })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn events(&self) -> &[ChainEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// First free block number after the recorded history
    pub fn next_block(&self) -> u64 {
        self.events.last().map(|event| event.block() + 1).unwrap_or(1)
    }

    /// Append one event and persist the log.
    ///
    /// The event must sort strictly after everything already recorded.
    pub fn append(&mut self, event: ChainEvent) -> ChainResult<()> {
        if let Some(last) = self.events.last() {
            if event.key() <= last.key() {
                return Err(ChainError::UnsortedLog {
                    position: self.events.len(),
                });
            }
        }
        self.events.push(event);
        self.persist()
    }

    fn persist(&self) -> ChainResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(&self.events)?;
        fs::write(&self.path, json)?;
        debug!(
            path = %self.path.display(),
            events = self.events.len(),
            "event log persisted"
        );
        Ok(())
    }
}

#[async_trait]
impl EventSource for EventLog {
    async fn fetch_events(&self, from_block: u64) -> ChainResult<Vec<ChainEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|event| event.block() >= from_block)
            .copied()
            .collect())
    }
}
