//! Runtime configuration: output locations, retry knobs, and review policy.
//!
//! [`Settings`] mirrors the knobs a deployment actually tunes; everything has
//! an in-code default and can be overridden through the environment (a `.env`
//! file is honored via `dotenvy`). [`ReviewPolicy`] carries the four
//! `should_pause` flags the gates consult.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::Checkpoint;

/// Which checkpoints should pause the run for human review.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReviewPolicy {
    pub news: bool,
    pub script: bool,
    pub media: bool,
    pub video: bool,
}

impl ReviewPolicy {
    /// Pause at every checkpoint (human-in-the-loop production).
    #[must_use]
    pub fn all() -> Self {
        Self {
            news: true,
            script: true,
            media: true,
            video: true,
        }
    }

    /// Never pause (unattended runs, tests, batch jobs).
    #[must_use]
    pub fn unattended() -> Self {
        Self {
            news: false,
            script: false,
            media: false,
            video: false,
        }
    }

    /// The `should_pause` flag for one checkpoint.
    #[must_use]
    pub fn should_pause(&self, checkpoint: Checkpoint) -> bool {
        match checkpoint {
            Checkpoint::News => self.news,
            Checkpoint::Script => self.script,
            Checkpoint::Media => self.media,
            Checkpoint::Video => self.video,
        }
    }
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self::all()
    }
}

/// Crate-wide settings with environment overrides.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Root for all generated artifacts.
    pub output_dir: PathBuf,
    /// Where durable run checkpoints are written.
    pub checkpoint_dir: PathBuf,
    /// Substituted for any image whose retrieval keeps failing.
    pub placeholder_image: PathBuf,
    /// Background music mixed under the narration, when present.
    pub bg_music_path: PathBuf,
    /// Attempts per image prompt before falling back to the placeholder.
    pub image_fetch_attempts: u32,
    /// Base delay between image fetch attempts (a small jitter is added).
    pub image_retry_backoff: Duration,
    /// Delete audio/image/video temp files after a successful publish.
    pub cleanup_after_upload: bool,
    /// The four gate pause flags.
    pub review: ReviewPolicy,
}

impl Settings {
    /// Defaults plus `.env`/environment overrides.
    ///
    /// Recognized variables: `NEWSREEL_OUTPUT_DIR`, `NEWSREEL_PLACEHOLDER_IMAGE`,
    /// `NEWSREEL_BG_MUSIC`, `NEWSREEL_IMAGE_ATTEMPTS`,
    /// `NEWSREEL_IMAGE_BACKOFF_MS`, `NEWSREEL_CLEANUP_AFTER_UPLOAD`.
    #[must_use]
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut settings = Self::default();

        if let Ok(dir) = std::env::var("NEWSREEL_OUTPUT_DIR") {
            settings.output_dir = PathBuf::from(&dir);
            settings.checkpoint_dir = settings.output_dir.join("checkpoints");
        }
        if let Ok(path) = std::env::var("NEWSREEL_PLACEHOLDER_IMAGE") {
            settings.placeholder_image = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("NEWSREEL_BG_MUSIC") {
            settings.bg_music_path = PathBuf::from(path);
        }
        if let Ok(attempts) = std::env::var("NEWSREEL_IMAGE_ATTEMPTS") {
            match attempts.parse::<u32>() {
                Ok(n) if n > 0 => settings.image_fetch_attempts = n,
                _ => tracing::warn!(value = %attempts, "ignoring invalid NEWSREEL_IMAGE_ATTEMPTS"),
            }
        }
        if let Ok(ms) = std::env::var("NEWSREEL_IMAGE_BACKOFF_MS") {
            match ms.parse::<u64>() {
                Ok(n) => settings.image_retry_backoff = Duration::from_millis(n),
                Err(_) => {
                    tracing::warn!(value = %ms, "ignoring invalid NEWSREEL_IMAGE_BACKOFF_MS");
                }
            }
        }
        if let Ok(flag) = std::env::var("NEWSREEL_CLEANUP_AFTER_UPLOAD") {
            settings.cleanup_after_upload = flag != "0" && !flag.eq_ignore_ascii_case("false");
        }
        settings
    }

    /// Audio artifacts directory.
    #[must_use]
    pub fn audio_dir(&self) -> PathBuf {
        self.output_dir.join("audio")
    }

    /// Image artifacts directory.
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }

    /// Video artifacts directory.
    #[must_use]
    pub fn videos_dir(&self) -> PathBuf {
        self.output_dir.join("videos")
    }

    #[must_use]
    pub fn with_review(mut self, review: ReviewPolicy) -> Self {
        self.review = review;
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        let output_dir = PathBuf::from("output");
        Self {
            checkpoint_dir: output_dir.join("checkpoints"),
            output_dir,
            placeholder_image: PathBuf::from("assets/placeholder.jpg"),
            bg_music_path: PathBuf::from("assets/bg_music.mp3"),
            image_fetch_attempts: 3,
            image_retry_backoff: Duration::from_millis(500),
            cleanup_after_upload: true,
            review: ReviewPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn review_policy_flags_map_to_checkpoints() {
        let policy = ReviewPolicy {
            news: true,
            script: false,
            media: true,
            video: false,
        };
        assert!(policy.should_pause(Checkpoint::News));
        assert!(!policy.should_pause(Checkpoint::Script));
        assert!(policy.should_pause(Checkpoint::Media));
        assert!(!policy.should_pause(Checkpoint::Video));
    }

    #[test]
    fn derived_directories_follow_output_dir() {
        let settings = Settings {
            output_dir: PathBuf::from("/tmp/run"),
            ..Settings::default()
        };
        assert_eq!(settings.audio_dir(), PathBuf::from("/tmp/run/audio"));
        assert_eq!(settings.videos_dir(), PathBuf::from("/tmp/run/videos"));
    }
}
