//! Upload stage: publish the video and record the outcome.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::providers::Publisher;
use crate::stage::{Stage, StageContext};
use crate::state::PipelineState;

/// Publishes the assembled video.
///
/// A publish failure is reported through `publish_result["error"]` and the
/// status message, not through `has_error`: the run still flows to the
/// terminal step so the driver can show how far it got and offer a retry.
pub struct UploadVideo {
    publisher: Arc<dyn Publisher>,
    settings: Arc<Settings>,
}

impl UploadVideo {
    pub fn new(publisher: Arc<dyn Publisher>, settings: Arc<Settings>) -> Self {
        Self {
            publisher,
            settings,
        }
    }

    /// Upload metadata, falling back to generated defaults when the script
    /// stage produced none.
    fn metadata(state: &PipelineState) -> (String, String) {
        let title = if state.title.is_empty() {
            format!("News Update: {}", state.topic)
        } else {
            state.title.clone()
        };
        let description = if state.description.is_empty() {
            let summary: String = state.news_summary.chars().take(500).collect();
            format!(
                "Auto-generated news video about {}.\n\nSummary:\n{summary}...\n\n\
                 This video was automatically generated.",
                state.topic
            )
        } else {
            state.description.clone()
        };
        (title, description)
    }

    /// Best-effort removal of intermediate artifacts after a successful
    /// publish. Failures are logged and never affect the run.
    async fn cleanup_artifacts(state: &PipelineState) {
        let mut targets: Vec<&Path> = Vec::new();
        if let Some(audio) = &state.audio_path {
            targets.push(audio);
        }
        for image in &state.image_paths {
            targets.push(image);
        }
        if let Some(video) = &state.video_path {
            targets.push(video);
        }
        for path in targets {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove artifact");
            }
        }
    }
}

#[async_trait]
impl Stage for UploadVideo {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        let Some(video) = state.video_path.clone() else {
            return state.with_error(
                "Cannot upload: no video has been assembled yet",
                "Error uploading video",
            );
        };

        let (title, description) = Self::metadata(&state);
        tracing::info!(title = %title, "uploading video");
        ctx.emit("stage", "uploading video");

        let mut next = state;
        match self.publisher.publish(&video, &title, &description).await {
            Ok(receipt) => {
                let status = format!("Video uploaded successfully: {}", receipt.video_url);
                next.publish_result
                    .insert("video_id".to_string(), receipt.video_id);
                next.publish_result
                    .insert("video_url".to_string(), receipt.video_url);
                if self.settings.cleanup_after_upload {
                    Self::cleanup_artifacts(&next).await;
                }
                next.with_status(status)
            }
            Err(e) => {
                tracing::error!(error = %e, "video upload failed");
                let message = e.to_string();
                next.publish_result
                    .insert("error".to_string(), message.clone());
                next.with_status(format!("Video upload failed: {message}"))
            }
        }
    }
}
