//! Stage-level behavior, exercised directly: per-image retry and
//! placeholder backfill, defensive predecessor guards, and upload metadata.

use std::path::PathBuf;
use std::sync::Arc;

use newsreel::config::ReviewPolicy;
use newsreel::events::EventChannel;
use newsreel::stage::{Stage, StageContext};
use newsreel::stages::{AssembleVideo, FetchAndConsolidateNews, GenerateAudio, GenerateImages};
use newsreel::state::PipelineState;
use newsreel::types::StepId;

mod common;
use common::*;

fn ctx(step_id: StepId) -> (StageContext, EventChannel) {
    let channel = EventChannel::new();
    let ctx = StageContext::new(step_id, 1, channel.emitter());
    (ctx, channel)
}

#[tokio::test]
async fn images_stage_backfills_failures_with_placeholders() {
    // Ten prompts, two of which keep failing: still ten paths out.
    let images = Arc::new(FlakyImages::new());
    let settings = test_settings(ReviewPolicy::unattended());
    let stage = GenerateImages::new(images.clone(), Arc::clone(&settings));

    let mut state = PipelineState::for_topic("t");
    state.image_prompts = (0..10)
        .map(|i| {
            if i == 2 || i == 7 {
                format!("FAIL prompt {i}")
            } else {
                format!("prompt {i}")
            }
        })
        .collect();

    let (ctx, _channel) = ctx(StepId::GenerateImages);
    let out = stage.run(state, ctx).await;

    assert!(!out.has_error);
    assert_eq!(out.image_paths.len(), 10);
    let placeholders: Vec<usize> = out
        .image_paths
        .iter()
        .enumerate()
        .filter(|(_, p)| **p == settings.placeholder_image)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(placeholders, vec![2, 7]);

    // Failing prompts exhaust the attempt budget; successes take one call.
    assert_eq!(images.attempts_for("FAIL prompt 2"), 3);
    assert_eq!(images.attempts_for("FAIL prompt 7"), 3);
    assert_eq!(images.attempts_for("prompt 0"), 1);
}

#[tokio::test]
async fn images_stage_with_no_prompts_yields_no_paths() {
    let images = Arc::new(FlakyImages::new());
    let settings = test_settings(ReviewPolicy::unattended());
    let stage = GenerateImages::new(images.clone(), settings);

    let (ctx, _channel) = ctx(StepId::GenerateImages);
    let out = stage.run(PipelineState::for_topic("t"), ctx).await;

    assert!(out.image_paths.is_empty());
    assert!(!out.has_error);
}

#[tokio::test]
async fn news_stage_guards_against_a_missing_topic() {
    let stage = FetchAndConsolidateNews::new(Arc::new(CannedNews::of("unused")));
    let (ctx, _channel) = ctx(StepId::FetchAndConsolidateNews);

    let out = stage.run(PipelineState::for_topic(""), ctx).await;

    assert!(out.has_error);
    assert_eq!(out.status_message, "Error fetching news");
    assert!(out.news_summary.is_empty());
}

#[tokio::test]
async fn audio_stage_guards_against_missing_narration() {
    let stage = GenerateAudio::new(Arc::new(StubSpeech));
    let (ctx, _channel) = ctx(StepId::GenerateAudio);

    let out = stage.run(PipelineState::for_topic("t"), ctx).await;

    assert!(out.has_error);
    assert!(out.audio_path.is_none());
}

#[tokio::test]
async fn video_stage_requires_both_audio_and_images() {
    let stage = AssembleVideo::new(Arc::new(StubAssembler));

    let (c1, _e1) = ctx(StepId::AssembleVideo);
    let no_audio = stage.run(PipelineState::for_topic("t"), c1).await;
    assert!(no_audio.has_error);

    let mut with_audio = PipelineState::for_topic("t");
    with_audio.audio_path = Some(PathBuf::from("a.mp3"));
    let (c2, _e2) = ctx(StepId::AssembleVideo);
    let no_images = stage.run(with_audio.clone(), c2).await;
    assert!(no_images.has_error);

    with_audio.image_paths = vec![PathBuf::from("img.jpg")];
    let (c3, _e3) = ctx(StepId::AssembleVideo);
    let ok = stage.run(with_audio, c3).await;
    assert!(!ok.has_error);
    assert_eq!(ok.video_path, Some(PathBuf::from("out/videos/final.mp4")));
}

#[tokio::test]
async fn stage_progress_events_carry_node_identity() {
    let stage = GenerateAudio::new(Arc::new(StubSpeech));
    let channel = EventChannel::new();
    let rx = channel.subscribe();
    let ctx = StageContext::new(StepId::GenerateAudio, 6, channel.emitter());

    let mut state = PipelineState::for_topic("t");
    state.narration = "One line of narration.".to_string();
    state.emotion = "calm".to_string();
    let out = stage.run(state, ctx).await;
    assert_eq!(out.status_message, "Audio generated successfully");

    let event = rx.try_recv().unwrap();
    assert_eq!(event.node.as_deref(), Some("generate_audio"));
    assert_eq!(event.step, Some(6));
}
