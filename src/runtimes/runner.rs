//! The pipeline runner: drives state through the graph, one node at a time.
//!
//! [`PipelineRunner`] owns a registry of isolated runs (each with its own
//! [`PipelineState`], step counter, and graph cursor), executes nodes
//! strictly sequentially, and checkpoints after every step. It yields the
//! state produced by every visited node, stops advancing the moment a gate
//! suspends or a stage records an error, and resumes a run at the exact
//! graph position that suspended it, so completed stages are never re-run.
//!
//! Errors are data: a state with `has_error` is yielded like any other and
//! then halts the run. The runner performs no retries; recovery belongs to
//! individual stages (per-image retry) or to the driver (resubmission).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use newsreel::config::Settings;
//! use newsreel::graph::PipelineGraph;
//! use newsreel::runtimes::{CheckpointerKind, Halt, PipelineRunner};
//! use newsreel::state::PipelineState;
//!
//! # async fn example(collaborators: newsreel::providers::Collaborators) -> Result<(), newsreel::runtimes::RunnerError> {
//! let settings = Arc::new(Settings::from_env());
//! let graph = PipelineGraph::standard(collaborators, Arc::clone(&settings));
//! let mut runner = PipelineRunner::new(graph, settings, CheckpointerKind::InMemory).await;
//!
//! let run_id = newsreel::runtimes::new_run_id();
//! runner.create_run(&run_id, PipelineState::for_topic("local election results")).await?;
//!
//! let outcome = runner.run_until_settled(&run_id).await?;
//! if let Halt::Suspended(_checkpoint) = outcome.halt {
//!     // Present outcome.state for review, apply edits, then:
//!     runner.resume(&run_id).await?;
//!     let _outcome = runner.run_until_settled(&run_id).await?;
//! }
//! # Ok(())
//! # }
//! ```

use chrono::Utc;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

use crate::config::Settings;
use crate::events::{EventChannel, PipelineEvent};
use crate::graph::{PipelineGraph, StepNode};
use crate::runtimes::checkpointer::{
    Checkpointer, CheckpointerError, CheckpointerKind, InMemoryCheckpointer, JsonFileCheckpointer,
    RunCheckpoint,
};
use crate::stage::StageContext;
use crate::state::PipelineState;
use crate::types::{Checkpoint, StepId};

/// Generate a fresh run identifier.
#[must_use]
pub fn new_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Why a run stopped advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The terminal step executed.
    Completed,
    /// A gate holds the run pending review.
    Suspended(Checkpoint),
    /// A stage recorded an error; the run halted on that node.
    Faulted,
}

/// The state yielded by one executed node.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Monotonic step counter; cosmetic, never control flow.
    pub step: u64,
    /// The node that produced this state.
    pub node: StepId,
    pub state: PipelineState,
}

/// Result of [`PipelineRunner::advance`].
#[derive(Debug, Clone)]
pub enum StepResult {
    /// A node executed. `settled` carries the halt when the run stopped on it.
    Ran {
        report: StepReport,
        settled: Option<Halt>,
    },
    /// Nothing executed: the run had already settled before the call.
    Settled(Halt),
}

/// Result of [`PipelineRunner::run_until_settled`]: every state yielded on
/// the way plus the final one.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub halt: Halt,
    pub visited: Vec<StepReport>,
    pub state: PipelineState,
}

/// How a run came to exist in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunInit {
    Fresh,
    Restored { checkpoint_step: u64 },
}

/// Per-run execution record: the state plus where the run is in the graph.
#[derive(Debug, Clone)]
struct RunSession {
    state: PipelineState,
    step: u64,
    cursor: usize,
}

/// Errors from the runner's own machinery (never from stage work, which is
/// carried on the state instead).
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    #[error("run not found: {run_id}")]
    #[diagnostic(code(newsreel::runner::run_not_found))]
    RunNotFound { run_id: String },

    #[error("run {run_id} is not suspended")]
    #[diagnostic(
        code(newsreel::runner::not_suspended),
        help("resume() only applies to a run currently held at a review gate.")
    )]
    NotSuspended { run_id: String },

    #[error("checkpoint for run {run_id} references a step missing from this graph")]
    #[diagnostic(
        code(newsreel::runner::corrupt_checkpoint),
        help("The checkpoint was written by a different graph shape; discard it.")
    )]
    CorruptCheckpoint { run_id: String },

    #[error(transparent)]
    #[diagnostic(code(newsreel::runner::checkpointer))]
    Checkpointer(#[from] CheckpointerError),
}

/// Execution engine for pipeline runs.
///
/// One runner can drive many concurrent runs, but each run owns its state
/// and advances strictly sequentially; two nodes of the same run never
/// execute at once.
pub struct PipelineRunner {
    graph: PipelineGraph,
    settings: Arc<Settings>,
    runs: FxHashMap<String, RunSession>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    autosave: bool,
    events: EventChannel,
}

impl PipelineRunner {
    /// Create a runner with autosave checkpointing.
    pub async fn new(
        graph: PipelineGraph,
        settings: Arc<Settings>,
        checkpointer: CheckpointerKind,
    ) -> Self {
        Self::with_options(graph, settings, checkpointer, true).await
    }

    /// Create a runner with an explicit autosave toggle.
    pub async fn with_options(
        graph: PipelineGraph,
        settings: Arc<Settings>,
        checkpointer: CheckpointerKind,
        autosave: bool,
    ) -> Self {
        let checkpointer = Self::create_checkpointer(checkpointer, &settings).await;
        Self {
            graph,
            settings,
            runs: FxHashMap::default(),
            checkpointer,
            autosave,
            events: EventChannel::new(),
        }
    }

    async fn create_checkpointer(
        kind: CheckpointerKind,
        settings: &Settings,
    ) -> Option<Arc<dyn Checkpointer>> {
        match kind {
            CheckpointerKind::InMemory => Some(Arc::new(InMemoryCheckpointer::new())),
            CheckpointerKind::JsonFile => {
                match JsonFileCheckpointer::create(settings.checkpoint_dir.clone()).await {
                    Ok(cp) => Some(Arc::new(cp) as Arc<dyn Checkpointer>),
                    Err(e) => {
                        tracing::error!(
                            dir = %settings.checkpoint_dir.display(),
                            error = %e,
                            "JsonFileCheckpointer initialization failed; running without persistence"
                        );
                        None
                    }
                }
            }
        }
    }

    /// Subscribe to progress events for all runs on this runner.
    #[must_use]
    pub fn events(&self) -> flume::Receiver<PipelineEvent> {
        self.events.subscribe()
    }

    /// Register a run, restoring it from its latest checkpoint when one
    /// exists (in which case `initial_state` is discarded).
    #[instrument(skip(self, initial_state), err)]
    pub async fn create_run(
        &mut self,
        run_id: &str,
        initial_state: PipelineState,
    ) -> Result<RunInit, RunnerError> {
        if let Some(cp) = &self.checkpointer {
            if let Some(stored) = cp.load_latest(run_id).await? {
                let cursor = self.restore_cursor(&stored)?;
                let step = stored.step;
                self.runs.insert(
                    run_id.to_string(),
                    RunSession {
                        state: stored.state,
                        step,
                        cursor,
                    },
                );
                return Ok(RunInit::Restored {
                    checkpoint_step: step,
                });
            }
        }

        self.runs.insert(
            run_id.to_string(),
            RunSession {
                state: initial_state,
                step: 0,
                cursor: 0,
            },
        );
        self.checkpoint(run_id).await;
        Ok(RunInit::Fresh)
    }

    /// Where a restored run re-enters the graph.
    ///
    /// Resumption is graph-position-based: a suspended run re-enters at its
    /// gate (identified by the suspend reason), everything else at the
    /// persisted position.
    fn restore_cursor(&self, stored: &RunCheckpoint) -> Result<usize, RunnerError> {
        if let Some(checkpoint) = stored.state.active_review() {
            return self
                .graph
                .gate_position(checkpoint)
                .ok_or_else(|| RunnerError::CorruptCheckpoint {
                    run_id: stored.run_id.clone(),
                });
        }
        match stored.position {
            Some(id) => self
                .graph
                .position_of(id)
                .ok_or_else(|| RunnerError::CorruptCheckpoint {
                    run_id: stored.run_id.clone(),
                }),
            None => Ok(self.graph.len()),
        }
    }

    /// Execute exactly one node of the run and yield its state.
    ///
    /// A suspended run re-executes its gate (the waiting self-loop) and
    /// settles suspended again; a faulted or completed run executes nothing.
    #[instrument(skip(self), err)]
    pub async fn advance(&mut self, run_id: &str) -> Result<StepResult, RunnerError> {
        let mut session =
            self.runs
                .remove(run_id)
                .ok_or_else(|| RunnerError::RunNotFound {
                    run_id: run_id.to_string(),
                })?;

        if session.state.has_error {
            self.runs.insert(run_id.to_string(), session);
            return Ok(StepResult::Settled(Halt::Faulted));
        }
        let Some(entry) = self.graph.step_at(session.cursor).cloned() else {
            self.runs.insert(run_id.to_string(), session);
            return Ok(StepResult::Settled(Halt::Completed));
        };

        session.step += 1;
        let step = session.step;
        tracing::debug!(step, node = %entry.id, "executing node");

        let state = std::mem::take(&mut session.state);
        session.state = match &entry.node {
            StepNode::Work(stage) => {
                let ctx = StageContext::new(entry.id, step, self.events.emitter());
                stage.run(state, ctx).await
            }
            StepNode::Gate(gate) => {
                let should_pause = self.settings.review.should_pause(gate.checkpoint());
                gate.evaluate(state, should_pause)
            }
        };

        let settled = if session.state.has_error {
            // Halt on the failing node; partial artifacts stay inspectable.
            self.events.emitter().emit(PipelineEvent::scoped(
                "runner",
                format!("run halted at {} with an error", entry.id),
            ));
            Some(Halt::Faulted)
        } else if session.state.is_suspended {
            // The cursor stays on the gate: the paused edge is a self-loop.
            session.state.suspend_reason.checkpoint().map(Halt::Suspended)
        } else {
            session.cursor += 1;
            (session.cursor >= self.graph.len()).then_some(Halt::Completed)
        };

        let report = StepReport {
            step,
            node: entry.id,
            state: session.state.clone(),
        };
        self.runs.insert(run_id.to_string(), session);
        self.checkpoint(run_id).await;
        Ok(StepResult::Ran { report, settled })
    }

    /// Advance until the run completes, suspends, or faults, collecting one
    /// report per visited node.
    pub async fn run_until_settled(&mut self, run_id: &str) -> Result<RunOutcome, RunnerError> {
        let mut visited = Vec::new();
        loop {
            match self.advance(run_id).await? {
                StepResult::Ran { report, settled } => {
                    visited.push(report);
                    if let Some(halt) = settled {
                        return self.outcome(run_id, halt, visited);
                    }
                }
                StepResult::Settled(halt) => {
                    return self.outcome(run_id, halt, visited);
                }
            }
        }
    }

    fn outcome(
        &self,
        run_id: &str,
        halt: Halt,
        visited: Vec<StepReport>,
    ) -> Result<RunOutcome, RunnerError> {
        let state = self.latest_state(run_id)?.clone();
        Ok(RunOutcome {
            halt,
            visited,
            state,
        })
    }

    /// Clear suspension and re-position the run at the gate that held it.
    ///
    /// The suspending checkpoint is recorded as reviewed, so re-entering the
    /// gate flows through instead of re-suspending. Returns the resumed
    /// state; call [`run_until_settled`](Self::run_until_settled) to continue.
    #[instrument(skip(self), err)]
    pub async fn resume(&mut self, run_id: &str) -> Result<PipelineState, RunnerError> {
        let session = self
            .runs
            .get_mut(run_id)
            .ok_or_else(|| RunnerError::RunNotFound {
                run_id: run_id.to_string(),
            })?;
        let Some(checkpoint) = session.state.active_review() else {
            return Err(RunnerError::NotSuspended {
                run_id: run_id.to_string(),
            });
        };
        session.cursor =
            self.graph
                .gate_position(checkpoint)
                .ok_or_else(|| RunnerError::CorruptCheckpoint {
                    run_id: run_id.to_string(),
                })?;
        session.state = std::mem::take(&mut session.state).resumed();
        let state = session.state.clone();

        self.events.emitter().emit(PipelineEvent::scoped(
            "runner",
            format!("resumed after {checkpoint} review"),
        ));
        self.checkpoint(run_id).await;
        Ok(state)
    }

    /// The latest state of a run, for display.
    pub fn latest_state(&self, run_id: &str) -> Result<&PipelineState, RunnerError> {
        self.runs
            .get(run_id)
            .map(|session| &session.state)
            .ok_or_else(|| RunnerError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    /// Mutable access to a run's state for the driver's review edits.
    ///
    /// The state's own edit methods enforce the review windows; this just
    /// locates the record.
    pub fn state_mut(&mut self, run_id: &str) -> Result<&mut PipelineState, RunnerError> {
        self.runs
            .get_mut(run_id)
            .map(|session| &mut session.state)
            .ok_or_else(|| RunnerError::RunNotFound {
                run_id: run_id.to_string(),
            })
    }

    /// Persist the run's latest snapshot when autosave is on.
    async fn checkpoint(&self, run_id: &str) {
        if !self.autosave {
            return;
        }
        let Some(cp) = &self.checkpointer else {
            return;
        };
        let Some(session) = self.runs.get(run_id) else {
            return;
        };
        let record = RunCheckpoint {
            run_id: run_id.to_string(),
            step: session.step,
            position: self.graph.step_at(session.cursor).map(|entry| entry.id),
            state: session.state.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = cp.save(record).await {
            tracing::warn!(run_id, error = %e, "failed to persist checkpoint");
        }
    }
}
