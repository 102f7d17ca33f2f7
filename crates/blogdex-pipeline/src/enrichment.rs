//! One enrichment batch: summarize the oldest unsummarized posts under a
//! wall-clock budget.

use std::time::{Duration, Instant};

use serde::Serialize;
use sqlx::PgPool;

use blogdex_db::{count_unsummarized, list_unsummarized, record_summary, DbError};
use blogdex_feed::FeedFetcher;
use blogdex_llm::{LlmClient, LlmError};

use crate::discovery::elapsed_ms;
use crate::PipelineError;

/// A post that enrichment attempted but could not summarize.
#[derive(Debug, Clone, Serialize)]
pub struct PostError {
    pub post_id: i64,
    pub url: String,
    pub error: String,
}

/// What one enrichment batch accomplished.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentOutcome {
    /// Posts summarized and persisted this batch.
    pub enriched_count: usize,
    /// True when no unsummarized posts remain after this batch.
    pub all_caught_up: bool,
    pub errors: Vec<PostError>,
    pub elapsed_ms: u64,
}

/// Runs one enrichment batch over up to `batch` posts, oldest first.
///
/// Posts are processed sequentially: summarization is the expensive step and
/// hammering the completion endpoint in parallel mostly converts budget into
/// 429s. The batch stops early when `budget` elapses or the key pool runs
/// dry; whatever is left stays unsummarized and is picked up next run.
///
/// Per-post failures (unfetchable page, malformed completion) are recorded
/// and skipped, leaving the post eligible for a later retry.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] only for batch-level database failures.
pub async fn run_enrichment_batch(
    pool: &PgPool,
    fetcher: &FeedFetcher,
    llm: &LlmClient,
    batch: usize,
    budget: Duration,
) -> Result<EnrichmentOutcome, PipelineError> {
    let started = Instant::now();
    let deadline = started + budget;

    let posts = list_unsummarized(pool, i64::try_from(batch).unwrap_or(i64::MAX)).await?;

    tracing::info!(batch, candidates = posts.len(), "starting enrichment batch");

    let mut enriched_count = 0usize;
    let mut errors = Vec::new();

    for post in &posts {
        if Instant::now() >= deadline {
            tracing::info!(
                enriched_count,
                remaining_in_batch = posts.len() - enriched_count - errors.len(),
                "enrichment budget exhausted, stopping early"
            );
            break;
        }

        // A page that cannot be fetched still gets a title-only summary.
        let page_text = match fetcher.fetch_page_text(&post.url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(url = %post.url, error = %e, "page fetch failed, summarizing from title");
                String::new()
            }
        };

        let summary = match llm.summarize(&post.title, &page_text).await {
            Ok(summary) => summary,
            Err(e @ (LlmError::NoKeys | LlmError::KeysExhausted)) => {
                tracing::warn!(error = %e, "no usable API key, abandoning batch");
                errors.push(PostError {
                    post_id: post.id,
                    url: post.url.clone(),
                    error: e.to_string(),
                });
                break;
            }
            Err(e) => {
                tracing::warn!(url = %post.url, error = %e, "summarization failed");
                errors.push(PostError {
                    post_id: post.id,
                    url: post.url.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        match record_summary(pool, post.id, &summary, llm.model()).await {
            Ok(()) => enriched_count += 1,
            // Another worker got there first; not a failure.
            Err(DbError::AlreadySummarized) => {
                tracing::debug!(post_id = post.id, "post summarized concurrently, skipping");
            }
            Err(e) => {
                tracing::warn!(post_id = post.id, error = %e, "summary persist failed");
                errors.push(PostError {
                    post_id: post.id,
                    url: post.url.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let remaining = count_unsummarized(pool).await?;

    let outcome = EnrichmentOutcome {
        enriched_count,
        all_caught_up: remaining == 0,
        errors,
        elapsed_ms: elapsed_ms(started),
    };

    tracing::info!(
        enriched_count = outcome.enriched_count,
        all_caught_up = outcome.all_caught_up,
        remaining,
        error_count = outcome.errors.len(),
        elapsed_ms = outcome.elapsed_ms,
        "enrichment batch finished"
    );

    Ok(outcome)
}
