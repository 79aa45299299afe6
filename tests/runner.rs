//! End-to-end runner behavior: sequencing, suspension, resumption, and
//! error halting over the standard graph.

use std::sync::Arc;

use newsreel::config::ReviewPolicy;
use newsreel::providers::Collaborators;
use newsreel::runtimes::{Halt, RunInit, StepResult};
use newsreel::state::PipelineState;
use newsreel::types::{Checkpoint, StepId};

mod common;
use common::*;

#[tokio::test]
async fn unattended_run_visits_every_step_once_in_order() {
    let mut runner = runner_with(collaborators(), ReviewPolicy::unattended()).await;
    runner
        .create_run("seq", PipelineState::for_topic("city budget vote"))
        .await
        .unwrap();

    let outcome = runner.run_until_settled("seq").await.unwrap();

    assert_eq!(outcome.halt, Halt::Completed);
    let visited: Vec<StepId> = outcome.visited.iter().map(|r| r.node).collect();
    assert_eq!(visited, StepId::ALL.to_vec());
    assert_eq!(outcome.state.status_message, "Workflow completed");
    assert!(!outcome.state.has_error);

    // The step counter is strictly monotonic across the run.
    let steps: Vec<u64> = outcome.visited.iter().map(|r| r.step).collect();
    assert!(steps.windows(2).all(|w| w[1] == w[0] + 1));
}

#[tokio::test]
async fn full_review_run_pauses_after_news_with_reason_and_artifacts() {
    // All four pause flags set: the first settle is the news review.
    let mut runner = runner_with(collaborators(), ReviewPolicy::all()).await;
    runner
        .create_run("scenario-a", PipelineState::for_topic("local election results"))
        .await
        .unwrap();

    let outcome = runner.run_until_settled("scenario-a").await.unwrap();

    assert_eq!(outcome.halt, Halt::Suspended(Checkpoint::News));
    let visited: Vec<StepId> = outcome.visited.iter().map(|r| r.node).collect();
    assert_eq!(
        visited,
        vec![
            StepId::FetchTrendingTopics,
            StepId::FetchAndConsolidateNews,
            StepId::NewsGate,
        ]
    );
    assert!(!outcome.state.news_summary.is_empty());
    assert!(outcome.state.script.is_empty());
    assert!(outcome.state.is_suspended);
}

#[tokio::test]
async fn suspended_gate_self_loop_yields_identical_states() {
    // Re-invoking the gate without clearing suspension changes nothing.
    let mut runner = runner_with(collaborators(), ReviewPolicy::all()).await;
    runner
        .create_run("self-loop", PipelineState::for_topic("transit strike"))
        .await
        .unwrap();
    runner.run_until_settled("self-loop").await.unwrap();

    let first = match runner.advance("self-loop").await.unwrap() {
        StepResult::Ran { report, settled } => {
            assert_eq!(settled, Some(Halt::Suspended(Checkpoint::News)));
            report
        }
        other => panic!("expected the gate to run again, got {other:?}"),
    };
    let second = match runner.advance("self-loop").await.unwrap() {
        StepResult::Ran { report, settled } => {
            assert_eq!(settled, Some(Halt::Suspended(Checkpoint::News)));
            report
        }
        other => panic!("expected the gate to run again, got {other:?}"),
    };

    assert_eq!(first.node, StepId::NewsGate);
    assert_eq!(second.node, StepId::NewsGate);
    // Equal except the cosmetic step counter.
    assert_eq!(first.state, second.state);
    assert_eq!(second.step, first.step + 1);
}

#[tokio::test]
async fn resume_feeds_edited_summary_downstream_and_preserves_it() {
    // The script stage consumes the edited text, and resuming never alters
    // fields produced before the gate.
    let news = Arc::new(CannedNews::of("Original consolidated coverage."));
    let collaborators = Collaborators {
        news: news.clone(),
        ..collaborators()
    };
    let mut runner = runner_with(collaborators, ReviewPolicy::all()).await;
    runner
        .create_run("scenario-b", PipelineState::for_topic("local election results"))
        .await
        .unwrap();
    runner.run_until_settled("scenario-b").await.unwrap();

    let edited = "EDITED: the three results that actually matter.";
    runner
        .state_mut("scenario-b")
        .unwrap()
        .edit_news_summary(edited)
        .unwrap();
    runner.resume("scenario-b").await.unwrap();

    let outcome = runner.run_until_settled("scenario-b").await.unwrap();
    assert_eq!(outcome.halt, Halt::Suspended(Checkpoint::Script));
    // EchoScriptModel narrates exactly the summary it was handed.
    assert_eq!(outcome.state.narration, edited);
    assert_eq!(outcome.state.news_summary, edited);
    // The news stage ran exactly once; resumption never re-executes it.
    assert_eq!(news.call_count(), 1);
}

#[tokio::test]
async fn reviewed_gates_rearm_only_later_checkpoints() {
    let mut runner = runner_with(collaborators(), ReviewPolicy::all()).await;
    runner
        .create_run("rearm", PipelineState::for_topic("heatwave forecast"))
        .await
        .unwrap();

    let mut halts = Vec::new();
    let mut outcome = runner.run_until_settled("rearm").await.unwrap();
    loop {
        match outcome.halt {
            Halt::Suspended(cp) => {
                halts.push(cp);
                runner.resume("rearm").await.unwrap();
                outcome = runner.run_until_settled("rearm").await.unwrap();
            }
            Halt::Completed => break,
            Halt::Faulted => panic!("unexpected fault: {}", outcome.state.error_message),
        }
    }

    assert_eq!(
        halts,
        vec![
            Checkpoint::News,
            Checkpoint::Script,
            Checkpoint::Media,
            Checkpoint::Video,
        ]
    );
    assert_eq!(outcome.state.reviewed, halts);
}

#[tokio::test]
async fn script_failure_halts_before_audio_and_stays_sticky() {
    let collaborators = Collaborators {
        script: Arc::new(FailingScriptModel),
        ..collaborators()
    };
    let mut runner = runner_with(collaborators, ReviewPolicy::unattended()).await;
    runner
        .create_run("scenario-d", PipelineState::for_topic("rate decision"))
        .await
        .unwrap();

    let outcome = runner.run_until_settled("scenario-d").await.unwrap();

    assert_eq!(outcome.halt, Halt::Faulted);
    assert!(outcome.state.has_error);
    assert!(outcome.state.error_message.contains("Failed to generate script"));
    assert_eq!(outcome.state.status_message, "Error generating script");
    assert!(outcome.state.script.is_empty());
    assert!(outcome.state.audio_path.is_none());
    assert_eq!(
        outcome.visited.last().map(|r| r.node),
        Some(StepId::GenerateScriptAndPrompts)
    );

    // The run does not advance past the failing node, and nothing clears
    // the error.
    match runner.advance("scenario-d").await.unwrap() {
        StepResult::Settled(Halt::Faulted) => {}
        other => panic!("expected a faulted settle, got {other:?}"),
    }
    let after = runner.latest_state("scenario-d").unwrap();
    assert_eq!(after, &outcome.state);
}

#[tokio::test]
async fn publish_failure_is_data_not_a_fault() {
    let collaborators = Collaborators {
        publisher: Arc::new(FailingPublisher),
        ..collaborators()
    };
    let mut runner = runner_with(collaborators, ReviewPolicy::unattended()).await;
    runner
        .create_run("bad-upload", PipelineState::for_topic("port congestion"))
        .await
        .unwrap();

    let outcome = runner.run_until_settled("bad-upload").await.unwrap();

    // Upload trouble lands in the result map; the run still reaches finish.
    assert_eq!(outcome.halt, Halt::Completed);
    assert!(!outcome.state.has_error);
    assert!(outcome.state.publish_result.contains_key("error"));
    let upload_report = outcome
        .visited
        .iter()
        .find(|r| r.node == StepId::UploadVideo)
        .unwrap();
    assert!(upload_report.state.status_message.starts_with("Video upload failed"));
}

#[tokio::test]
async fn blank_topic_adopts_best_trending_candidate() {
    let mut runner = runner_with(collaborators(), ReviewPolicy::unattended()).await;
    runner
        .create_run("auto-topic", PipelineState::for_topic(""))
        .await
        .unwrap();

    let outcome = runner.run_until_settled("auto-topic").await.unwrap();
    assert_eq!(outcome.halt, Halt::Completed);
    assert_eq!(outcome.state.topic, "ai regulation");
    assert_eq!(
        outcome.state.candidate_topics,
        vec!["ai regulation".to_string(), "transit strike".to_string()]
    );
}

#[tokio::test]
async fn blank_topic_without_candidates_faults_at_the_trend_stage() {
    let collaborators = Collaborators {
        trends: Arc::new(StaticTrends::of(&[])),
        ..collaborators()
    };
    let mut runner = runner_with(collaborators, ReviewPolicy::unattended()).await;
    runner
        .create_run("no-topic", PipelineState::for_topic("  "))
        .await
        .unwrap();

    let outcome = runner.run_until_settled("no-topic").await.unwrap();
    assert_eq!(outcome.halt, Halt::Faulted);
    assert_eq!(
        outcome.visited.last().map(|r| r.node),
        Some(StepId::FetchTrendingTopics)
    );
    assert!(outcome.state.news_summary.is_empty());
}

#[tokio::test]
async fn concurrent_runs_on_one_runner_stay_isolated() {
    let mut runner = runner_with(collaborators(), ReviewPolicy::all()).await;
    runner
        .create_run("a", PipelineState::for_topic("topic a"))
        .await
        .unwrap();
    runner
        .create_run("b", PipelineState::for_topic("topic b"))
        .await
        .unwrap();

    let a = runner.run_until_settled("a").await.unwrap();
    assert_eq!(a.halt, Halt::Suspended(Checkpoint::News));
    // Run b has not moved.
    assert_eq!(
        runner.latest_state("b").unwrap().status_message,
        "Ready to start"
    );

    runner.resume("a").await.unwrap();
    let b = runner.run_until_settled("b").await.unwrap();
    assert_eq!(b.halt, Halt::Suspended(Checkpoint::News));
    assert_eq!(b.state.topic, "topic b");

    let a_state = runner.latest_state("a").unwrap();
    assert_eq!(a_state.topic, "topic a");
    assert!(!a_state.is_suspended);
}

#[tokio::test]
async fn fresh_runs_are_fresh_and_resume_requires_suspension() {
    let mut runner = runner_with(collaborators(), ReviewPolicy::unattended()).await;
    let init = runner
        .create_run("fresh", PipelineState::for_topic("t"))
        .await
        .unwrap();
    assert_eq!(init, RunInit::Fresh);

    assert!(runner.resume("fresh").await.is_err());
    assert!(runner.latest_state("missing").is_err());
}
