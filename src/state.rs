//! Pipeline state for the newsreel workflow.
//!
//! A single [`PipelineState`] record is threaded through every step of a run.
//! It is immutable-by-replacement: stages consume the incoming value and
//! return a new one, which makes snapshotting, checkpointing, and resumption
//! safe by construction.
//!
//! Two invariants hold at every step boundary and are preserved by every
//! transform in this module:
//!
//! - `has_error` is true exactly when `error_message` is non-empty
//! - `is_suspended` is true exactly when `suspend_reason` is not [`SuspendReason::None`]
//!
//! The record is flat and serde-friendly so a host can persist it across a
//! suspend/resume boundary that spans process restarts.
//!
//! # Examples
//!
//! ```rust
//! use newsreel::state::{PipelineState, SuspendReason};
//! use newsreel::types::Checkpoint;
//!
//! let state = PipelineState::for_topic("local election results");
//! assert!(!state.is_suspended);
//!
//! let paused = state.suspended_at(Checkpoint::News);
//! assert_eq!(paused.suspend_reason, SuspendReason::AwaitingNewsReview);
//!
//! let resumed = paused.resumed();
//! assert!(!resumed.is_suspended);
//! assert!(resumed.is_reviewed(Checkpoint::News));
//! ```

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::types::Checkpoint;

/// Enumerated tag identifying which checkpoint currently holds the run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SuspendReason {
    /// The run is flowing; no gate holds it.
    #[default]
    None,
    /// Suspended at the news gate.
    AwaitingNewsReview,
    /// Suspended at the script gate.
    AwaitingScriptReview,
    /// Suspended at the media gate.
    AwaitingMediaReview,
    /// Suspended at the video gate.
    AwaitingVideoReview,
}

impl SuspendReason {
    /// The checkpoint this reason belongs to, if any.
    #[must_use]
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        match self {
            SuspendReason::None => None,
            SuspendReason::AwaitingNewsReview => Some(Checkpoint::News),
            SuspendReason::AwaitingScriptReview => Some(Checkpoint::Script),
            SuspendReason::AwaitingMediaReview => Some(Checkpoint::Media),
            SuspendReason::AwaitingVideoReview => Some(Checkpoint::Video),
        }
    }
}

impl From<Checkpoint> for SuspendReason {
    fn from(cp: Checkpoint) -> Self {
        match cp {
            Checkpoint::News => SuspendReason::AwaitingNewsReview,
            Checkpoint::Script => SuspendReason::AwaitingScriptReview,
            Checkpoint::Media => SuspendReason::AwaitingMediaReview,
            Checkpoint::Video => SuspendReason::AwaitingVideoReview,
        }
    }
}

/// The single mutable record threaded through every pipeline step.
///
/// Fields are grouped by producing stage. A downstream field is empty until
/// its producing stage has run; stages treat empty predecessor fields as
/// "not yet available" and record an error state instead of panicking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    /// User- or auto-selected subject. Must be non-empty before the news
    /// stage runs; the trend stage fills it in when the driver left it blank.
    pub topic: String,
    /// Trending candidates surfaced for selection; may be empty.
    #[serde(default)]
    pub candidate_topics: Vec<String>,

    /// Consolidated narrative produced by the news stage.
    #[serde(default)]
    pub news_summary: String,

    /// Full script text, including section headers and direction notes.
    #[serde(default)]
    pub script: String,
    /// Continuous narration extracted from the script's `Narrator: "…"` lines.
    #[serde(default)]
    pub narration: String,
    /// One prompt per image, in presentation order.
    #[serde(default)]
    pub image_prompts: Vec<String>,
    /// Emotional tone tag for speech synthesis.
    #[serde(default)]
    pub emotion: String,
    /// Upload title drafted by the script stage.
    #[serde(default)]
    pub title: String,
    /// Upload description drafted by the script stage.
    #[serde(default)]
    pub description: String,

    /// Narration audio artifact, once synthesized.
    #[serde(default)]
    pub audio_path: Option<PathBuf>,
    /// Image artifacts, exactly one per prompt (placeholders included).
    #[serde(default)]
    pub image_paths: Vec<PathBuf>,
    /// Assembled video artifact.
    #[serde(default)]
    pub video_path: Option<PathBuf>,

    /// Publish outcome: `video_url`/`video_id` on success, `error` on failure.
    #[serde(default)]
    pub publish_result: FxHashMap<String, String>,

    /// Human-readable description of the last action, overwritten by every
    /// stage whether it succeeds or fails.
    pub status_message: String,
    /// True while a gate holds the run.
    #[serde(default)]
    pub is_suspended: bool,
    /// Which checkpoint holds the run, when suspended.
    #[serde(default)]
    pub suspend_reason: SuspendReason,
    /// Checkpoints already approved in this run. A gate never re-suspends for
    /// a reviewed checkpoint, which is what lets graph-position resumption
    /// re-enter the suspending gate and flow through it.
    #[serde(default)]
    pub reviewed: Vec<Checkpoint>,

    /// Sticky error description; set once, cleared only by an explicit
    /// [`clear_error`](Self::clear_error) after human correction.
    #[serde(default)]
    pub error_message: String,
    /// True exactly when `error_message` is non-empty.
    #[serde(default)]
    pub has_error: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            topic: String::new(),
            candidate_topics: Vec::new(),
            news_summary: String::new(),
            script: String::new(),
            narration: String::new(),
            image_prompts: Vec::new(),
            emotion: String::new(),
            title: String::new(),
            description: String::new(),
            audio_path: None,
            image_paths: Vec::new(),
            video_path: None,
            publish_result: FxHashMap::default(),
            status_message: "Ready to start".to_string(),
            is_suspended: false,
            suspend_reason: SuspendReason::None,
            reviewed: Vec::new(),
            error_message: String::new(),
            has_error: false,
        }
    }
}

impl PipelineState {
    /// Create the initial state for a run.
    ///
    /// An empty topic is allowed: the trend stage will adopt the best
    /// trending candidate before the news stage needs one.
    pub fn for_topic(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Replace the status message.
    #[must_use]
    pub fn with_status(mut self, message: impl Into<String>) -> Self {
        self.status_message = message.into();
        self
    }

    /// Record a stage-boundary failure.
    ///
    /// Sets `error_message`, `has_error`, and the status message together so
    /// the error invariant cannot be half-applied. All other fields are left
    /// exactly as they were, keeping partial progress inspectable.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>, status: impl Into<String>) -> Self {
        self.error_message = error.into();
        self.has_error = !self.error_message.is_empty();
        self.status_message = status.into();
        self
    }

    /// Explicit error reset, used when resuming after a human correction.
    #[must_use]
    pub fn clear_error(mut self) -> Self {
        self.error_message.clear();
        self.has_error = false;
        self
    }

    /// Suspend the run at the given checkpoint with a pause notice.
    #[must_use]
    pub fn suspended_at(mut self, checkpoint: Checkpoint) -> Self {
        self.is_suspended = true;
        self.suspend_reason = SuspendReason::from(checkpoint);
        self.status_message = format!("Paused for {checkpoint} review. Resume when ready.");
        self
    }

    /// Clear suspension, recording the held checkpoint as reviewed.
    ///
    /// No-op on a state that is not suspended.
    #[must_use]
    pub fn resumed(mut self) -> Self {
        if let Some(cp) = self.suspend_reason.checkpoint() {
            if !self.reviewed.contains(&cp) {
                self.reviewed.push(cp);
            }
        }
        self.is_suspended = false;
        self.suspend_reason = SuspendReason::None;
        self
    }

    /// Whether the given checkpoint was already approved in this run.
    #[must_use]
    pub fn is_reviewed(&self, checkpoint: Checkpoint) -> bool {
        self.reviewed.contains(&checkpoint)
    }

    /// The checkpoint currently holding the run, if suspended.
    #[must_use]
    pub fn active_review(&self) -> Option<Checkpoint> {
        if self.is_suspended {
            self.suspend_reason.checkpoint()
        } else {
            None
        }
    }

    fn require_review(&self, checkpoint: Checkpoint) -> Result<(), ReviewEditError> {
        match self.active_review() {
            Some(active) if active == checkpoint => Ok(()),
            active => Err(ReviewEditError {
                required: checkpoint,
                active,
            }),
        }
    }

    /// Replace the news summary; only accepted during the news review.
    pub fn edit_news_summary(&mut self, text: impl Into<String>) -> Result<(), ReviewEditError> {
        self.require_review(Checkpoint::News)?;
        self.news_summary = text.into();
        Ok(())
    }

    /// Replace the script and re-derive narration; only accepted during the
    /// script review.
    pub fn edit_script(&mut self, script: impl Into<String>) -> Result<(), ReviewEditError> {
        self.require_review(Checkpoint::Script)?;
        self.script = script.into();
        self.narration = crate::draft::extract_narration(&self.script);
        Ok(())
    }

    /// Replace the image prompts; only accepted during the script review.
    pub fn edit_image_prompts(&mut self, prompts: Vec<String>) -> Result<(), ReviewEditError> {
        self.require_review(Checkpoint::Script)?;
        self.image_prompts = prompts;
        Ok(())
    }

    /// Swap the audio artifact; only accepted during the media review.
    pub fn edit_audio_path(&mut self, path: PathBuf) -> Result<(), ReviewEditError> {
        self.require_review(Checkpoint::Media)?;
        self.audio_path = Some(path);
        Ok(())
    }

    /// Swap the image artifacts; only accepted during the media review.
    pub fn edit_image_paths(&mut self, paths: Vec<PathBuf>) -> Result<(), ReviewEditError> {
        self.require_review(Checkpoint::Media)?;
        self.image_paths = paths;
        Ok(())
    }

    /// Swap the video artifact; only accepted during the video review.
    pub fn edit_video_path(&mut self, path: PathBuf) -> Result<(), ReviewEditError> {
        self.require_review(Checkpoint::Video)?;
        self.video_path = Some(path);
        Ok(())
    }
}

/// A review edit was attempted outside its checkpoint's window.
///
/// The state is left untouched when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("edit requires the {required} review to be active")]
#[diagnostic(
    code(newsreel::state::edit_outside_review),
    help("Only the fields guarded by the currently suspended checkpoint may be edited.")
)]
pub struct ReviewEditError {
    /// The checkpoint whose review window the edit belongs to.
    pub required: Checkpoint,
    /// The checkpoint actually holding the run, if any.
    pub active: Option<Checkpoint>,
}
