//! The stage contract: one unit of production work.
//!
//! A [`Stage`] receives the current [`PipelineState`] and returns the next
//! one. Failures never cross the stage boundary as panics or `Err`s; a stage
//! converts any collaborator failure into the state's error fields and
//! returns normally. This is what lets the runner treat errors as data and
//! keep every partial artifact inspectable after a halt.

use async_trait::async_trait;

use crate::events::{EventEmitter, PipelineEvent};
use crate::state::PipelineState;
use crate::types::StepId;

/// A pipeline node performing one production step.
///
/// # Contract
///
/// - Consume the incoming state and return a new one; never mutate shared
///   structures in place.
/// - Catch every collaborator failure and record it via
///   [`PipelineState::with_error`]; never panic past the boundary.
/// - Always rewrite `status_message`, on success and on failure alike.
/// - Tolerate empty predecessor fields by recording an error state
///   ("not yet available"), not by crashing.
/// - Be safe to re-invoke with the same input: the runner never re-runs a
///   completed stage within one run, but resumption must not depend on that.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState;
}

/// Execution context handed to a stage for one invocation.
#[derive(Clone, Debug)]
pub struct StageContext {
    /// Identity of the executing node.
    pub step_id: StepId,
    /// Monotonic step counter for this run; cosmetic only.
    pub step: u64,
    emitter: EventEmitter,
}

impl StageContext {
    #[must_use]
    pub fn new(step_id: StepId, step: u64, emitter: EventEmitter) -> Self {
        Self {
            step_id,
            step,
            emitter,
        }
    }

    /// Emit a node-scoped progress event enriched with this context's
    /// identity. Fire-and-forget; a missing subscriber never fails the stage.
    pub fn emit(&self, scope: impl Into<String>, message: impl Into<String>) {
        self.emitter.emit(PipelineEvent::node_scoped(
            self.step_id.encode(),
            self.step,
            scope,
            message,
        ));
    }
}
