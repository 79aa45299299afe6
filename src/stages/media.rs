//! Media stages: narration audio and one image per prompt.

use async_trait::async_trait;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Settings;
use crate::providers::{ImageSource, SpeechSynthesizer};
use crate::stage::{Stage, StageContext};
use crate::state::PipelineState;

/// Synthesizes narration audio from the script stage's output.
pub struct GenerateAudio {
    speech: Arc<dyn SpeechSynthesizer>,
}

impl GenerateAudio {
    pub fn new(speech: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { speech }
    }
}

#[async_trait]
impl Stage for GenerateAudio {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        if state.narration.is_empty() {
            return state.with_error(
                "Cannot generate audio: no narration text is available yet",
                "Error generating audio",
            );
        }

        tracing::info!(chars = state.narration.len(), "generating narration audio");
        ctx.emit("stage", "generating audio from script");

        match self
            .speech
            .synthesize(&state.narration, &state.emotion)
            .await
        {
            Ok(path) => {
                let mut next = state;
                next.audio_path = Some(path);
                next.with_status("Audio generated successfully")
            }
            Err(e) => {
                tracing::error!(error = %e, "audio synthesis failed");
                state.with_error(
                    format!("Failed to generate audio: {e}"),
                    "Error generating audio",
                )
            }
        }
    }
}

/// Fetches one image per prompt.
///
/// Retrieval failures are strictly per-item: each prompt gets a bounded
/// number of attempts with backoff, and a prompt that keeps failing is
/// backfilled with the configured placeholder. The stage always yields
/// exactly one path per prompt and never fails as a whole.
pub struct GenerateImages {
    images: Arc<dyn ImageSource>,
    settings: Arc<Settings>,
}

impl GenerateImages {
    pub fn new(images: Arc<dyn ImageSource>, settings: Arc<Settings>) -> Self {
        Self { images, settings }
    }

    async fn fetch_with_retry(&self, prompt: &str, ctx: &StageContext) -> Option<PathBuf> {
        let attempts = self.settings.image_fetch_attempts.max(1);
        for attempt in 1..=attempts {
            match self.images.fetch(prompt).await {
                Ok(path) => return Some(path),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, %prompt, "image fetch failed");
                    if attempt < attempts {
                        ctx.emit("retry", format!("image fetch attempt {attempt} failed"));
                        let jitter = rand::rng().random_range(0..=250);
                        tokio::time::sleep(
                            self.settings.image_retry_backoff
                                + std::time::Duration::from_millis(jitter),
                        )
                        .await;
                    }
                }
            }
        }
        None
    }
}

#[async_trait]
impl Stage for GenerateImages {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        tracing::info!(prompts = state.image_prompts.len(), "generating images");
        ctx.emit(
            "stage",
            format!("generating {} images from prompts", state.image_prompts.len()),
        );

        let mut paths = Vec::with_capacity(state.image_prompts.len());
        for (index, prompt) in state.image_prompts.iter().enumerate() {
            let path = match self.fetch_with_retry(prompt, &ctx).await {
                Some(path) => path,
                None => {
                    tracing::warn!(index, %prompt, "all attempts failed; using placeholder image");
                    self.settings.placeholder_image.clone()
                }
            };
            paths.push(path);
        }

        let mut next = state;
        next.image_paths = paths;
        next.with_status("Images generated successfully")
    }
}
