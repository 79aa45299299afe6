//! Script stage: draft the script, image prompts, and upload metadata.

use async_trait::async_trait;
use std::sync::Arc;

use crate::draft;
use crate::providers::ScriptModel;
use crate::stage::{Stage, StageContext};
use crate::state::PipelineState;

/// Asks the script model for a draft and runs the raw text through the
/// layered fallback parser. A reachable model therefore never fails this
/// stage on formatting grounds; only the call itself can error.
pub struct GenerateScriptAndPrompts {
    model: Arc<dyn ScriptModel>,
}

impl GenerateScriptAndPrompts {
    pub fn new(model: Arc<dyn ScriptModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl Stage for GenerateScriptAndPrompts {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        if state.news_summary.is_empty() {
            return state.with_error(
                "Cannot generate a script: the news summary is not available yet",
                "Error generating script",
            );
        }

        tracing::info!("generating script and image prompts");
        ctx.emit("stage", "generating script and image prompts");

        match self.model.draft(&state.news_summary).await {
            Ok(raw) => {
                let parsed = draft::parse_draft(&raw);
                tracing::info!(
                    script_chars = parsed.script.len(),
                    prompts = parsed.image_prompts.len(),
                    emotion = %parsed.emotion,
                    "script draft parsed"
                );
                let mut next = state;
                next.script = parsed.script;
                next.narration = parsed.narration;
                next.image_prompts = parsed.image_prompts;
                next.emotion = parsed.emotion;
                next.title = parsed.title;
                next.description = parsed.description;
                next.with_status("Script and image prompts generated successfully")
            }
            Err(e) => {
                tracing::error!(error = %e, "script generation failed");
                state.with_error(
                    format!("Failed to generate script: {e}"),
                    "Error generating script",
                )
            }
        }
    }
}
