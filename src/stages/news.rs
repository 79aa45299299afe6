//! News stage: fetch articles for the topic and consolidate them.

use async_trait::async_trait;
use std::sync::Arc;

use crate::providers::NewsSource;
use crate::stage::{Stage, StageContext};
use crate::state::PipelineState;

/// Fetches and consolidates news coverage for the selected topic.
pub struct FetchAndConsolidateNews {
    news: Arc<dyn NewsSource>,
}

impl FetchAndConsolidateNews {
    pub fn new(news: Arc<dyn NewsSource>) -> Self {
        Self { news }
    }
}

#[async_trait]
impl Stage for FetchAndConsolidateNews {
    async fn run(&self, state: PipelineState, ctx: StageContext) -> PipelineState {
        if state.topic.trim().is_empty() {
            return state.with_error(
                "Cannot fetch news: no topic has been selected",
                "Error fetching news",
            );
        }

        tracing::info!(topic = %state.topic, "fetching and consolidating news");
        ctx.emit("stage", format!("fetching news for: {}", state.topic));

        match self.news.fetch_and_summarize(&state.topic).await {
            Ok(summary) => {
                let mut next = state;
                next.news_summary = summary;
                next.with_status("News fetched and consolidated successfully")
            }
            Err(e) => {
                tracing::error!(error = %e, "news consolidation failed");
                state.with_error(format!("Failed to fetch news: {e}"), "Error fetching news")
            }
        }
    }
}
