//! One discovery batch: walk a window of the roster, fetch each source, and
//! persist whatever is new.

use std::time::Instant;

use serde::Serialize;
use sqlx::PgPool;

use blogdex_db::{
    count_sources, insert_post_if_new, list_source_window, post_exists, touch_last_fetched,
};
use blogdex_feed::FeedFetcher;

use crate::{source_base_url, PipelineError};

/// A source that discovery visited but could not fully persist.
#[derive(Debug, Clone, Serialize)]
pub struct SourceError {
    pub domain: String,
    pub error: String,
}

/// What one discovery batch accomplished.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryOutcome {
    /// Posts inserted this batch (previously unseen URLs).
    pub new_posts: usize,
    /// Sources actually visited.
    pub sources_processed: usize,
    /// Offset the next batch should start from.
    pub next_offset: usize,
    /// Whether this batch reached the end of the roster; the next batch
    /// should wrap back to offset zero.
    pub roster_exhausted: bool,
    pub errors: Vec<SourceError>,
    pub elapsed_ms: u64,
}

/// Runs one discovery batch over `window` sources starting at `offset`.
///
/// All sources in the window are fetched concurrently; discovery itself
/// never fails, so a source that is down simply contributes zero posts and a
/// soft error. Persistence failures are likewise recorded per source and do
/// not abort the batch.
///
/// # Errors
///
/// Returns [`PipelineError::Db`] only for batch-level database failures
/// (listing the window, counting the roster).
pub async fn run_discovery_batch(
    pool: &PgPool,
    fetcher: &FeedFetcher,
    offset: usize,
    window: usize,
    posts_per_source: usize,
) -> Result<DiscoveryOutcome, PipelineError> {
    let started = Instant::now();

    let total = count_sources(pool).await?;
    let sources = list_source_window(pool, to_i64(offset), to_i64(window)).await?;

    tracing::info!(
        offset,
        window,
        total_sources = total,
        fetched = sources.len(),
        "starting discovery batch"
    );

    let discoveries = futures::future::join_all(sources.iter().map(|source| {
        let base_url = source_base_url(&source.domain);
        async move { fetcher.discover_posts(&base_url, posts_per_source).await }
    }))
    .await;

    let mut new_posts = 0usize;
    let mut errors = Vec::new();

    for (source, scan) in sources.iter().zip(discoveries) {
        if let Some(problem) = scan.soft_error {
            tracing::warn!(domain = %source.domain, problem, "source fetch degraded");
            errors.push(SourceError {
                domain: source.domain.clone(),
                error: problem,
            });
        }

        let mut inserted = 0i64;
        let mut failed = false;

        for post in &scan.posts {
            // Cheap pre-check; the URL unique constraint is the real guarantee.
            match post_exists(pool, &post.url).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(domain = %source.domain, error = %e, "post lookup failed");
                    errors.push(SourceError {
                        domain: source.domain.clone(),
                        error: e.to_string(),
                    });
                    failed = true;
                    break;
                }
            }

            match insert_post_if_new(pool, source.id, post).await {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(domain = %source.domain, error = %e, "post insert failed");
                    errors.push(SourceError {
                        domain: source.domain.clone(),
                        error: e.to_string(),
                    });
                    failed = true;
                    break;
                }
            }
        }

        if !failed {
            if let Err(e) = touch_last_fetched(pool, source.id, inserted).await {
                tracing::warn!(domain = %source.domain, error = %e, "source bookkeeping failed");
                errors.push(SourceError {
                    domain: source.domain.clone(),
                    error: e.to_string(),
                });
            }
        }

        tracing::debug!(
            domain = %source.domain,
            discovered = scan.posts.len(),
            inserted,
            "source processed"
        );

        new_posts += usize::try_from(inserted).unwrap_or(0);
    }

    let next_offset = offset + sources.len();
    let roster_exhausted = to_i64(next_offset) >= total;

    let outcome = DiscoveryOutcome {
        new_posts,
        sources_processed: sources.len(),
        next_offset,
        roster_exhausted,
        errors,
        elapsed_ms: elapsed_ms(started),
    };

    tracing::info!(
        new_posts = outcome.new_posts,
        sources_processed = outcome.sources_processed,
        next_offset = outcome.next_offset,
        roster_exhausted = outcome.roster_exhausted,
        error_count = outcome.errors.len(),
        elapsed_ms = outcome.elapsed_ms,
        "discovery batch finished"
    );

    Ok(outcome)
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

pub(crate) fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
