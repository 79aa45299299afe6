//! The production stages of the pipeline.
//!
//! Each stage wraps one collaborator call, guards its predecessors
//! defensively, and converts failures into state-carried errors at its
//! boundary. Side effects live here and nowhere else.

pub mod media;
pub mod news;
pub mod script;
pub mod trend;
pub mod upload;
pub mod video;

pub use media::{GenerateAudio, GenerateImages};
pub use news::FetchAndConsolidateNews;
pub use script::GenerateScriptAndPrompts;
pub use trend::FetchTrendingTopics;
pub use upload::UploadVideo;
pub use video::AssembleVideo;

use async_trait::async_trait;

use crate::stage::{Stage, StageContext};
use crate::state::PipelineState;

/// Explicit terminal step. Doing nothing but stamping the final status gives
/// the runner a completion condition distinct from "suspended".
#[derive(Clone, Copy, Debug, Default)]
pub struct Finish;

#[async_trait]
impl Stage for Finish {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        ctx.emit("stage", "workflow completed");
        state.with_status("Workflow completed")
    }
}
