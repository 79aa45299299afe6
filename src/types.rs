//! Core identifiers for the newsreel pipeline.
//!
//! This module defines the fixed vocabulary of pipeline steps and review
//! checkpoints. These are the domain concepts the graph, the runner, and the
//! persistence layer all agree on.
//!
//! # Key Types
//!
//! - [`StepId`]: Identifies one node of the pipeline graph
//! - [`Checkpoint`]: Identifies one of the four human-review pause points
//!
//! # Examples
//!
//! ```rust
//! use newsreel::types::{Checkpoint, StepId};
//!
//! let step = StepId::GenerateAudio;
//! assert_eq!(step.encode(), "generate_audio");
//! assert_eq!(StepId::decode("generate_audio"), Some(step));
//!
//! // Gates are steps too, derived from their checkpoint.
//! assert_eq!(Checkpoint::Media.gate_step(), StepId::MediaGate);
//! assert!(Checkpoint::Media.gate_step().is_gate());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one node of the pipeline graph.
///
/// The pipeline has a fixed, acyclic order of steps (see
/// [`PipelineGraph::standard`](crate::graph::PipelineGraph::standard)); every
/// node carries one of these identifiers. The encoded string form is what the
/// persistence layer stores, so it must stay stable across releases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepId {
    /// Fetch trending candidates and auto-select a topic if none was given.
    FetchTrendingTopics,
    /// Fetch articles for the topic and consolidate them into one summary.
    FetchAndConsolidateNews,
    /// Review pause point after news consolidation.
    NewsGate,
    /// Draft the video script, image prompts, and upload metadata.
    GenerateScriptAndPrompts,
    /// Review pause point after script generation.
    ScriptGate,
    /// Synthesize narration audio.
    GenerateAudio,
    /// Fetch one image per prompt, with per-item retry and placeholders.
    GenerateImages,
    /// Review pause point after audio and images exist.
    MediaGate,
    /// Compose audio and images into the final video.
    AssembleVideo,
    /// Review pause point after the video is assembled.
    VideoGate,
    /// Publish the video and record the outcome.
    UploadVideo,
    /// Explicit terminal step; marks the run completed.
    Finish,
}

impl StepId {
    /// Every step in canonical graph order.
    pub const ALL: [StepId; 12] = [
        StepId::FetchTrendingTopics,
        StepId::FetchAndConsolidateNews,
        StepId::NewsGate,
        StepId::GenerateScriptAndPrompts,
        StepId::ScriptGate,
        StepId::GenerateAudio,
        StepId::GenerateImages,
        StepId::MediaGate,
        StepId::AssembleVideo,
        StepId::VideoGate,
        StepId::UploadVideo,
        StepId::Finish,
    ];

    /// Stable string form used by checkpoint persistence.
    #[must_use]
    pub fn encode(&self) -> &'static str {
        match self {
            StepId::FetchTrendingTopics => "fetch_trending_topics",
            StepId::FetchAndConsolidateNews => "fetch_and_consolidate_news",
            StepId::NewsGate => "news_gate",
            StepId::GenerateScriptAndPrompts => "generate_script_and_prompts",
            StepId::ScriptGate => "script_gate",
            StepId::GenerateAudio => "generate_audio",
            StepId::GenerateImages => "generate_images",
            StepId::MediaGate => "media_gate",
            StepId::AssembleVideo => "assemble_video",
            StepId::VideoGate => "video_gate",
            StepId::UploadVideo => "upload_video",
            StepId::Finish => "finish",
        }
    }

    /// Decode a persisted string form back into a `StepId`.
    ///
    /// Returns `None` for unknown encodings so callers can surface a
    /// persistence error instead of guessing.
    #[must_use]
    pub fn decode(s: &str) -> Option<Self> {
        StepId::ALL.into_iter().find(|id| id.encode() == s)
    }

    /// Returns `true` if this step is a review gate.
    #[must_use]
    pub fn is_gate(&self) -> bool {
        self.checkpoint().is_some()
    }

    /// The checkpoint guarded by this step, if it is a gate.
    #[must_use]
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        match self {
            StepId::NewsGate => Some(Checkpoint::News),
            StepId::ScriptGate => Some(Checkpoint::Script),
            StepId::MediaGate => Some(Checkpoint::Media),
            StepId::VideoGate => Some(Checkpoint::Video),
            _ => None,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encode())
    }
}

/// Identifies one of the four human-review pause points.
///
/// Each checkpoint corresponds to exactly one gate in the graph and one
/// `AwaitingXReview` suspend reason on the state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Checkpoint {
    /// After news consolidation; the summary may be edited.
    News,
    /// After script generation; script, narration, and prompts may be edited.
    Script,
    /// After audio and image generation; media artifacts may be swapped.
    Media,
    /// After video assembly; the video artifact may be swapped.
    Video,
}

impl Checkpoint {
    /// All checkpoints in graph order.
    pub const ALL: [Checkpoint; 4] = [
        Checkpoint::News,
        Checkpoint::Script,
        Checkpoint::Media,
        Checkpoint::Video,
    ];

    /// The graph step implementing this checkpoint's gate.
    #[must_use]
    pub fn gate_step(&self) -> StepId {
        match self {
            Checkpoint::News => StepId::NewsGate,
            Checkpoint::Script => StepId::ScriptGate,
            Checkpoint::Media => StepId::MediaGate,
            Checkpoint::Video => StepId::VideoGate,
        }
    }
}

impl fmt::Display for Checkpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Checkpoint::News => "news",
            Checkpoint::Script => "script",
            Checkpoint::Media => "media",
            Checkpoint::Video => "video",
        };
        f.write_str(label)
    }
}
