//! Runtime infrastructure: the runner, checkpoint persistence, and run ids.
//!
//! The runtime layer is what a driver actually holds: a [`PipelineRunner`]
//! built over a compiled graph, with a pluggable [`Checkpointer`] persisting
//! the latest snapshot of every run so suspended work survives restarts.

pub mod checkpointer;
pub mod persistence;
pub mod runner;

pub use checkpointer::{
    Checkpointer, CheckpointerError, CheckpointerKind, InMemoryCheckpointer, JsonFileCheckpointer,
    RunCheckpoint,
};
pub use persistence::{PersistedCheckpoint, PersistenceError};
pub use runner::{
    Halt, PipelineRunner, RunInit, RunOutcome, RunnerError, StepReport, StepResult, new_run_id,
};
