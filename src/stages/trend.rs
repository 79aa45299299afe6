//! Trending-topic stage: fills in the topic when the driver left it blank.

use async_trait::async_trait;
use std::sync::Arc;

use crate::providers::TrendSource;
use crate::stage::{Stage, StageContext};
use crate::state::PipelineState;

/// First stage of every run. Fetches trending candidates; adopts the best
/// one as the topic when none was submitted, otherwise keeps the user's
/// topic and records the candidates for display.
pub struct FetchTrendingTopics {
    trends: Arc<dyn TrendSource>,
}

impl FetchTrendingTopics {
    pub fn new(trends: Arc<dyn TrendSource>) -> Self {
        Self { trends }
    }
}

#[async_trait]
impl Stage for FetchTrendingTopics {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        tracing::info!(topic = %state.topic, "fetching trending topics");
        ctx.emit("stage", "fetching trending topics");

        // TrendSource is infallible by contract: failure means an empty list.
        let candidates = self.trends.list_trending().await;

        let mut next = state;
        next.candidate_topics = candidates;

        if next.topic.trim().is_empty() {
            match next.candidate_topics.first().cloned() {
                Some(best) => {
                    tracing::info!(topic = %best, "no topic submitted; using best trending topic");
                    let status = format!("Automatically selected trending topic: {best}");
                    next.topic = best;
                    next.with_status(status)
                }
                None => next.with_error(
                    "No topic was provided and no trending topics are available",
                    "Error selecting a topic",
                ),
            }
        } else {
            let status = format!("Continuing with user-selected topic: {}", next.topic);
            next.with_status(status)
        }
    }
}
