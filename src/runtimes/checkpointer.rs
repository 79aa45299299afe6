//! Pluggable persistence for run checkpoints.
//!
//! A [`Checkpointer`] stores the latest [`RunCheckpoint`] per run so a
//! suspended run can be restored later, including across process restarts
//! with the file-backed implementation. Only the latest checkpoint matters:
//! resumption is graph-position-based, so the single most recent snapshot of
//! state + position is the whole story.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use thiserror::Error;

use crate::runtimes::persistence::{PersistedCheckpoint, PersistenceError};
use crate::state::PipelineState;
use crate::types::StepId;

/// A point-in-time snapshot of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunCheckpoint {
    pub run_id: String,
    /// Monotonic step counter at snapshot time.
    pub step: u64,
    /// The step the run will execute next; `None` once completed.
    pub position: Option<StepId>,
    pub state: PipelineState,
    pub created_at: DateTime<Utc>,
}

/// Which checkpointer backend a runner should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointerKind {
    /// Volatile storage for tests and single-process drivers.
    InMemory,
    /// One JSON file per run under the configured checkpoint directory.
    JsonFile,
}

/// Errors from checkpoint storage backends.
#[derive(Debug, Error, Diagnostic)]
pub enum CheckpointerError {
    #[error("checkpoint I/O failed: {0}")]
    #[diagnostic(code(newsreel::checkpointer::io))]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(code(newsreel::checkpointer::persistence))]
    Persistence(#[from] PersistenceError),
}

/// Storage contract for run checkpoints.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    /// Store the checkpoint, replacing any previous one for the same run.
    async fn save(&self, checkpoint: RunCheckpoint) -> Result<(), CheckpointerError>;

    /// Load the most recent checkpoint for a run, if any exists.
    async fn load_latest(&self, run_id: &str) -> Result<Option<RunCheckpoint>, CheckpointerError>;
}

/// Volatile checkpointer keeping the latest snapshot per run in memory.
#[derive(Default)]
pub struct InMemoryCheckpointer {
    latest: Mutex<FxHashMap<String, RunCheckpoint>>,
}

impl InMemoryCheckpointer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for InMemoryCheckpointer {
    async fn save(&self, checkpoint: RunCheckpoint) -> Result<(), CheckpointerError> {
        self.latest
            .lock()
            .insert(checkpoint.run_id.clone(), checkpoint);
        Ok(())
    }

    async fn load_latest(&self, run_id: &str) -> Result<Option<RunCheckpoint>, CheckpointerError> {
        Ok(self.latest.lock().get(run_id).cloned())
    }
}

/// Durable checkpointer writing one JSON file per run.
pub struct JsonFileCheckpointer {
    dir: PathBuf,
}

impl JsonFileCheckpointer {
    /// Create the checkpointer, ensuring the directory exists.
    pub async fn create(dir: PathBuf) -> Result<Self, CheckpointerError> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, run_id: &str) -> PathBuf {
        // Run ids become filenames; keep them filesystem-safe.
        let safe: String = run_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl Checkpointer for JsonFileCheckpointer {
    async fn save(&self, checkpoint: RunCheckpoint) -> Result<(), CheckpointerError> {
        let persisted = PersistedCheckpoint::from(&checkpoint);
        let json = serde_json::to_vec_pretty(&persisted)
            .map_err(|source| PersistenceError::Serde { source })?;
        tokio::fs::write(self.path_for(&checkpoint.run_id), json).await?;
        Ok(())
    }

    async fn load_latest(&self, run_id: &str) -> Result<Option<RunCheckpoint>, CheckpointerError> {
        let raw = match tokio::fs::read(self.path_for(run_id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let persisted: PersistedCheckpoint = serde_json::from_slice(&raw)
            .map_err(|source| PersistenceError::Serde { source })?;
        Ok(Some(RunCheckpoint::try_from(persisted)?))
    }
}
