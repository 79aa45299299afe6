#![allow(dead_code)]

//! Scripted collaborators and fixtures shared by the integration tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use newsreel::config::{ReviewPolicy, Settings};
use newsreel::graph::PipelineGraph;
use newsreel::providers::{
    Collaborators, ImageSource, NewsSource, ProviderError, PublishReceipt, Publisher, ScriptModel,
    SpeechSynthesizer, TrendSource, VideoAssembler,
};
use newsreel::runtimes::{CheckpointerKind, PipelineRunner};

/// Trend source with a fixed candidate list.
pub struct StaticTrends {
    pub topics: Vec<String>,
}

impl StaticTrends {
    pub fn of(topics: &[&str]) -> Self {
        Self {
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl TrendSource for StaticTrends {
    async fn list_trending(&self) -> Vec<String> {
        self.topics.clone()
    }
}

/// News source answering with a canned summary, counting invocations so
/// tests can prove completed stages are never re-run.
pub struct CannedNews {
    pub summary: String,
    pub calls: Mutex<u32>,
}

impl CannedNews {
    pub fn of(summary: &str) -> Self {
        Self {
            summary: summary.to_string(),
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl NewsSource for CannedNews {
    async fn fetch_and_summarize(&self, _topic: &str) -> Result<String, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.summary.clone())
    }
}

/// Script model that embeds the summary it was given into a well-formed
/// marker response, so tests can see exactly which summary the stage
/// consumed.
pub struct EchoScriptModel;

#[async_trait]
impl ScriptModel for EchoScriptModel {
    async fn draft(&self, summary: &str) -> Result<String, ProviderError> {
        Ok(format!(
            "<<EMOTION_START>>calm<<EMOTION_END>>\n\
             <<VIDEO_SCRIPT_START>>\n\
             [INTRO]\n\
             Narrator: \"{summary}\"\n\
             <<VIDEO_SCRIPT_END>>\n\
             <<IMAGE_PROMPTS_START>>\n\
             A newsroom desk with monitors\n\
             A city skyline at dawn\n\
             <<IMAGE_PROMPTS_END>>\n\
             <<TITLE_START>>Today's Story, Explained<<TITLE_END>>\n\
             <<DESCRIPTION_START>>The short version of a big story. #news<<DESCRIPTION_END>>"
        ))
    }
}

/// Script model that always fails at the network boundary.
pub struct FailingScriptModel;

#[async_trait]
impl ScriptModel for FailingScriptModel {
    async fn draft(&self, _summary: &str) -> Result<String, ProviderError> {
        Err(ProviderError::request("script model", "connection reset"))
    }
}

pub struct StubSpeech;

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    async fn synthesize(&self, _narration: &str, _emotion: &str) -> Result<PathBuf, ProviderError> {
        Ok(PathBuf::from("out/audio/narration.mp3"))
    }
}

/// Image source that fails any prompt containing `FAIL`, counting attempts
/// per prompt so retry bounds are observable.
pub struct FlakyImages {
    pub attempts: Mutex<Vec<String>>,
}

impl FlakyImages {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts_for(&self, prompt: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == prompt)
            .count()
    }
}

#[async_trait]
impl ImageSource for FlakyImages {
    async fn fetch(&self, prompt: &str) -> Result<PathBuf, ProviderError> {
        self.attempts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("FAIL") {
            Err(ProviderError::request("image source", "503 from provider"))
        } else {
            Ok(PathBuf::from(format!("out/images/{}.jpg", prompt.len())))
        }
    }
}

pub struct StubAssembler;

#[async_trait]
impl VideoAssembler for StubAssembler {
    async fn compose(&self, _audio: &Path, images: &[PathBuf]) -> Result<PathBuf, ProviderError> {
        assert!(!images.is_empty());
        Ok(PathBuf::from("out/videos/final.mp4"))
    }
}

pub struct StubPublisher;

#[async_trait]
impl Publisher for StubPublisher {
    async fn publish(
        &self,
        _video: &Path,
        _title: &str,
        _description: &str,
    ) -> Result<PublishReceipt, ProviderError> {
        Ok(PublishReceipt {
            video_id: "vid123".to_string(),
            video_url: "https://example.test/v/vid123".to_string(),
        })
    }
}

pub struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(
        &self,
        _video: &Path,
        _title: &str,
        _description: &str,
    ) -> Result<PublishReceipt, ProviderError> {
        Err(ProviderError::request("publisher", "quota exceeded"))
    }
}

/// Happy-path collaborator bundle.
pub fn collaborators() -> Collaborators {
    Collaborators {
        trends: Arc::new(StaticTrends::of(&["ai regulation", "transit strike"])),
        news: Arc::new(CannedNews::of("Consolidated coverage of the story.")),
        script: Arc::new(EchoScriptModel),
        speech: Arc::new(StubSpeech),
        images: Arc::new(FlakyImages::new()),
        video: Arc::new(StubAssembler),
        publisher: Arc::new(StubPublisher),
    }
}

/// Settings tuned for tests: fast retries, no artifact cleanup.
pub fn test_settings(review: ReviewPolicy) -> Arc<Settings> {
    Arc::new(Settings {
        image_fetch_attempts: 3,
        image_retry_backoff: Duration::from_millis(1),
        cleanup_after_upload: false,
        review,
        ..Settings::default()
    })
}

/// A runner over the standard graph with in-memory checkpointing.
pub async fn runner_with(
    collaborators: Collaborators,
    review: ReviewPolicy,
) -> PipelineRunner {
    let settings = test_settings(review);
    let graph = PipelineGraph::standard(collaborators, Arc::clone(&settings));
    PipelineRunner::new(graph, settings, CheckpointerKind::InMemory).await
}
