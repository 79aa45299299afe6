//! Video stage: compose audio and images into the final short.

use async_trait::async_trait;
use std::sync::Arc;

use crate::providers::VideoAssembler;
use crate::stage::{Stage, StageContext};
use crate::state::PipelineState;

/// Hands the narration audio and image set to the assembler.
pub struct AssembleVideo {
    assembler: Arc<dyn VideoAssembler>,
}

impl AssembleVideo {
    pub fn new(assembler: Arc<dyn VideoAssembler>) -> Self {
        Self { assembler }
    }
}

#[async_trait]
impl Stage for AssembleVideo {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        let Some(audio) = state.audio_path.clone() else {
            return state.with_error(
                "Cannot assemble video: narration audio is not available yet",
                "Error assembling video",
            );
        };
        if state.image_paths.is_empty() {
            return state.with_error(
                "Cannot assemble video: no images are available yet",
                "Error assembling video",
            );
        }

        tracing::info!(images = state.image_paths.len(), "assembling video");
        ctx.emit("stage", "assembling video");

        match self.assembler.compose(&audio, &state.image_paths).await {
            Ok(path) => {
                let mut next = state;
                next.video_path = Some(path);
                next.with_status("Video assembled successfully")
            }
            Err(e) => {
                tracing::error!(error = %e, "video assembly failed");
                state.with_error(
                    format!("Failed to assemble video: {e}"),
                    "Error assembling video",
                )
            }
        }
    }
}
