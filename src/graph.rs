//! The pipeline graph: the static order of stages and gates.
//!
//! The graph is a fixed, acyclic sequence with exactly one entry and one
//! terminal step. Gates are the only conditional nodes: a gate's "paused"
//! edge points back to itself (the waiting self-loop) and its "continue"
//! edge points at the next step in the sequence, so the structure reduces to
//! an ordered list plus per-gate suspension semantics.
//!
//! Custom assemblies go through [`PipelineGraphBuilder`], which validates the
//! result; [`PipelineGraph::standard`] wires the production order:
//!
//! ```text
//! fetch_trending_topics
//!  -> fetch_and_consolidate_news -> gate(news)
//!  -> generate_script_and_prompts -> gate(script)
//!  -> generate_audio -> generate_images -> gate(media)
//!  -> assemble_video -> gate(video)
//!  -> upload_video
//!  -> finish
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Settings;
use crate::gate::Gate;
use crate::providers::Collaborators;
use crate::stage::Stage;
use crate::stages;
use crate::types::{Checkpoint, StepId};

/// One node of the graph: a production stage or a review gate.
#[derive(Clone)]
pub enum StepNode {
    Work(Arc<dyn Stage>),
    Gate(Gate),
}

/// A step paired with its identity.
#[derive(Clone)]
pub struct PipelineStep {
    pub id: StepId,
    pub node: StepNode,
}

/// Structural problems caught when building a graph.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    #[error("pipeline graph has no steps")]
    #[diagnostic(code(newsreel::graph::empty))]
    Empty,

    #[error("step {0} appears more than once")]
    #[diagnostic(code(newsreel::graph::duplicate_step))]
    DuplicateStep(StepId),

    #[error("gate {0} cannot be the entry step: it has no upstream artifact to guard")]
    #[diagnostic(code(newsreel::graph::leading_gate))]
    LeadingGate(StepId),
}

/// Builder for assembling a pipeline graph step by step.
pub struct PipelineGraphBuilder {
    steps: Vec<PipelineStep>,
}

impl PipelineGraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a production stage.
    #[must_use]
    pub fn add_stage(mut self, id: StepId, stage: impl Stage + 'static) -> Self {
        self.steps.push(PipelineStep {
            id,
            node: StepNode::Work(Arc::new(stage)),
        });
        self
    }

    /// Append a review gate for the given checkpoint. The gate's id is
    /// derived from the checkpoint, and its continue edge is the next step
    /// appended after it.
    #[must_use]
    pub fn add_gate(mut self, checkpoint: Checkpoint) -> Self {
        self.steps.push(PipelineStep {
            id: checkpoint.gate_step(),
            node: StepNode::Gate(Gate::new(checkpoint)),
        });
        self
    }

    /// Validate and build the graph.
    pub fn build(self) -> Result<PipelineGraph, GraphError> {
        if self.steps.is_empty() {
            return Err(GraphError::Empty);
        }
        if let StepNode::Gate(_) = self.steps[0].node {
            return Err(GraphError::LeadingGate(self.steps[0].id));
        }
        let mut index = FxHashMap::default();
        for (position, step) in self.steps.iter().enumerate() {
            if index.insert(step.id, position).is_some() {
                return Err(GraphError::DuplicateStep(step.id));
            }
        }
        Ok(PipelineGraph {
            steps: self.steps,
            index,
        })
    }
}

impl Default for PipelineGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The compiled, immutable pipeline graph.
pub struct PipelineGraph {
    steps: Vec<PipelineStep>,
    index: FxHashMap<StepId, usize>,
}

impl PipelineGraph {
    /// The production graph, wired with the given collaborators.
    ///
    /// Infallible by construction: the standard order satisfies every check
    /// the builder performs.
    #[must_use]
    pub fn standard(collaborators: Collaborators, settings: Arc<Settings>) -> Self {
        let steps = vec![
            PipelineStep {
                id: StepId::FetchTrendingTopics,
                node: StepNode::Work(Arc::new(stages::FetchTrendingTopics::new(
                    collaborators.trends,
                ))),
            },
            PipelineStep {
                id: StepId::FetchAndConsolidateNews,
                node: StepNode::Work(Arc::new(stages::FetchAndConsolidateNews::new(
                    collaborators.news,
                ))),
            },
            PipelineStep {
                id: StepId::NewsGate,
                node: StepNode::Gate(Gate::new(Checkpoint::News)),
            },
            PipelineStep {
                id: StepId::GenerateScriptAndPrompts,
                node: StepNode::Work(Arc::new(stages::GenerateScriptAndPrompts::new(
                    collaborators.script,
                ))),
            },
            PipelineStep {
                id: StepId::ScriptGate,
                node: StepNode::Gate(Gate::new(Checkpoint::Script)),
            },
            PipelineStep {
                id: StepId::GenerateAudio,
                node: StepNode::Work(Arc::new(stages::GenerateAudio::new(collaborators.speech))),
            },
            PipelineStep {
                id: StepId::GenerateImages,
                node: StepNode::Work(Arc::new(stages::GenerateImages::new(
                    collaborators.images,
                    Arc::clone(&settings),
                ))),
            },
            PipelineStep {
                id: StepId::MediaGate,
                node: StepNode::Gate(Gate::new(Checkpoint::Media)),
            },
            PipelineStep {
                id: StepId::AssembleVideo,
                node: StepNode::Work(Arc::new(stages::AssembleVideo::new(collaborators.video))),
            },
            PipelineStep {
                id: StepId::VideoGate,
                node: StepNode::Gate(Gate::new(Checkpoint::Video)),
            },
            PipelineStep {
                id: StepId::UploadVideo,
                node: StepNode::Work(Arc::new(stages::UploadVideo::new(
                    collaborators.publisher,
                    settings,
                ))),
            },
            PipelineStep {
                id: StepId::Finish,
                node: StepNode::Work(Arc::new(stages::Finish)),
            },
        ];
        let index = steps
            .iter()
            .enumerate()
            .map(|(position, step)| (step.id, position))
            .collect();
        Self { steps, index }
    }

    /// The entry step.
    #[must_use]
    pub fn entry(&self) -> StepId {
        self.steps[0].id
    }

    /// The terminal step.
    #[must_use]
    pub fn terminal(&self) -> StepId {
        self.steps[self.steps.len() - 1].id
    }

    /// Number of steps in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step at the given position, if in range.
    #[must_use]
    pub fn step_at(&self, position: usize) -> Option<&PipelineStep> {
        self.steps.get(position)
    }

    /// Position of the given step in execution order.
    #[must_use]
    pub fn position_of(&self, id: StepId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    /// Position of the gate for the given checkpoint.
    #[must_use]
    pub fn gate_position(&self, checkpoint: Checkpoint) -> Option<usize> {
        self.position_of(checkpoint.gate_step())
    }

    /// Step ids in execution order.
    pub fn order(&self) -> impl Iterator<Item = StepId> + '_ {
        self.steps.iter().map(|step| step.id)
    }
}
