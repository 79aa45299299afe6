//! Collaborator contracts consumed by pipeline stages.
//!
//! Everything that talks to the outside world (trend scraping, news APIs,
//! the language model, speech synthesis, image generation, video rendering,
//! publishing) sits behind one of these narrow traits. Concrete providers
//! live outside this crate; stages hold `Arc<dyn …>` handles and convert any
//! [`ProviderError`] into state-carried error fields at their boundary.

use async_trait::async_trait;
use miette::Diagnostic;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Failure surfaced by a collaborator call.
///
/// Stages never let these escape; they become `error_message`/`has_error`
/// (or, for images, a placeholder artifact) on the returned state.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    /// The provider could not be reached or is not configured.
    #[error("{provider} unavailable: {message}")]
    #[diagnostic(code(newsreel::provider::unavailable))]
    Unavailable {
        provider: &'static str,
        message: String,
    },

    /// The provider was reached but the request failed.
    #[error("{provider} request failed: {message}")]
    #[diagnostic(code(newsreel::provider::request))]
    Request {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn unavailable(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Unavailable {
            provider,
            message: message.into(),
        }
    }

    pub fn request(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Request {
            provider,
            message: message.into(),
        }
    }
}

/// Source of trending topic candidates.
///
/// Infallible by contract: a failed scrape yields an empty list, never an
/// error the trend stage would have to translate.
#[async_trait]
pub trait TrendSource: Send + Sync {
    async fn list_trending(&self) -> Vec<String>;
}

/// Fetches articles for a topic and consolidates them into one narrative.
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn fetch_and_summarize(&self, topic: &str) -> Result<String, ProviderError>;
}

/// Drafts the raw script/prompts/metadata text from a news summary.
///
/// Returns the model's raw output; the script stage runs it through the
/// layered parser in [`crate::draft`], so malformed output degrades into
/// placeholders rather than errors.
#[async_trait]
pub trait ScriptModel: Send + Sync {
    async fn draft(&self, summary: &str) -> Result<String, ProviderError>;
}

/// Synthesizes narration audio with an emotional tone.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, narration: &str, emotion: &str) -> Result<PathBuf, ProviderError>;
}

/// Fetches or generates a single image for one prompt.
///
/// Retry, backoff, and placeholder substitution are the images stage's job,
/// not the provider's; implementations should fail fast.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, prompt: &str) -> Result<PathBuf, ProviderError>;
}

/// Composes narration audio and images into the final video.
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    async fn compose(&self, audio: &Path, images: &[PathBuf]) -> Result<PathBuf, ProviderError>;
}

/// Proof of a successful publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishReceipt {
    pub video_id: String,
    pub video_url: String,
}

/// Publishes the assembled video with its metadata.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(
        &self,
        video: &Path,
        title: &str,
        description: &str,
    ) -> Result<PublishReceipt, ProviderError>;
}

/// The full bundle of collaborators a pipeline graph is wired with.
#[derive(Clone)]
pub struct Collaborators {
    pub trends: Arc<dyn TrendSource>,
    pub news: Arc<dyn NewsSource>,
    pub script: Arc<dyn ScriptModel>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub images: Arc<dyn ImageSource>,
    pub video: Arc<dyn VideoAssembler>,
    pub publisher: Arc<dyn Publisher>,
}
