//! Review gates: the pause points of the pipeline.
//!
//! A [`Gate`] is the node type that can suspend forward progress pending
//! external approval. Its state machine has two states per run:
//!
//! ```text
//! Flowing ──(should_pause && artifact ready && not yet reviewed)──▶ Suspended
//! Suspended ──(external resume: PipelineState::resumed)──▶ Flowing
//! ```
//!
//! While suspended, re-evaluating the gate returns the state unchanged (the
//! formal self-loop: "wait here"). A gate never clears suspension itself;
//! only the driver's resume action does, and resuming records the checkpoint
//! as reviewed so re-entering the same gate flows through instead of
//! re-suspending. There is no polling anywhere: a suspended run simply sits
//! idle until resumed.

use crate::state::PipelineState;
use crate::types::Checkpoint;

/// A pipeline node that may suspend the run at its checkpoint.
///
/// # Examples
///
/// ```rust
/// use newsreel::gate::Gate;
/// use newsreel::state::PipelineState;
/// use newsreel::types::Checkpoint;
///
/// let gate = Gate::new(Checkpoint::News);
/// let mut state = PipelineState::for_topic("elections");
/// state.news_summary = "Summary of today's coverage.".to_string();
///
/// // Pause requested and the guarded artifact exists: suspend.
/// let paused = gate.evaluate(state, true);
/// assert!(paused.is_suspended);
///
/// // Re-evaluating without clearing suspension is the waiting self-loop.
/// let still_paused = gate.evaluate(paused.clone(), true);
/// assert_eq!(still_paused, paused);
///
/// // After the external resume, the gate lets the run flow.
/// let resumed = gate.evaluate(still_paused.resumed(), true);
/// assert!(!resumed.is_suspended);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Gate {
    checkpoint: Checkpoint,
}

impl Gate {
    #[must_use]
    pub fn new(checkpoint: Checkpoint) -> Self {
        Self { checkpoint }
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        self.checkpoint
    }

    /// Whether the upstream stage has produced the artifact this gate guards.
    ///
    /// A gate without its artifact passes the run through: there is nothing
    /// to review yet, and suspending would strand the run.
    #[must_use]
    pub fn artifact_ready(&self, state: &PipelineState) -> bool {
        match self.checkpoint {
            Checkpoint::News => !state.news_summary.is_empty(),
            Checkpoint::Script => !state.script.is_empty(),
            Checkpoint::Media => state.audio_path.is_some() || !state.image_paths.is_empty(),
            Checkpoint::Video => state.video_path.is_some(),
        }
    }

    /// Evaluate the gate against the current state.
    ///
    /// Returns the state unchanged when already suspended here (self-loop),
    /// suspends when a pause is requested for an un-reviewed checkpoint whose
    /// artifact is ready, and passes through otherwise.
    #[must_use]
    pub fn evaluate(&self, state: PipelineState, should_pause: bool) -> PipelineState {
        if state.is_suspended {
            // Waiting self-loop; also leaves a foreign gate's suspension
            // untouched rather than stealing it.
            return state;
        }
        if should_pause && self.artifact_ready(&state) && !state.is_reviewed(self.checkpoint) {
            tracing::info!(checkpoint = %self.checkpoint, "suspending for review");
            return state.suspended_at(self.checkpoint);
        }
        state
    }
}
