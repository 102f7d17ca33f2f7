//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the two
//! recurring pipeline jobs: discovery walks the roster window by window,
//! enrichment drains the unsummarized backlog in small batches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use blogdex_core::AppConfig;
use blogdex_feed::FeedFetcher;
use blogdex_llm::LlmClient;
use blogdex_pipeline::{run_discovery_batch, run_enrichment_batch};

/// Discovery visits the next roster window every 15 minutes.
const DISCOVERY_SCHEDULE: &str = "0 */15 * * * *";

/// Enrichment drains a batch every 5 minutes.
const ENRICHMENT_SCHEDULE: &str = "0 */5 * * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    fetcher: Arc<FeedFetcher>,
    llm: Arc<LlmClient>,
    config: Arc<AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_discovery_job(
        &scheduler,
        pool.clone(),
        Arc::clone(&fetcher),
        Arc::clone(&config),
    )
    .await?;
    register_enrichment_job(&scheduler, pool, fetcher, llm, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Registers the recurring discovery job.
///
/// Each run advances a shared offset by the window size, wrapping back to
/// zero once the roster is exhausted, so every source gets visited over a
/// full cycle.
async fn register_discovery_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    fetcher: Arc<FeedFetcher>,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let offset = Arc::new(AtomicUsize::new(0));

    let job = Job::new_async(DISCOVERY_SCHEDULE, move |_uuid, _lock| {
        let pool = pool.clone();
        let fetcher = Arc::clone(&fetcher);
        let config = Arc::clone(&config);
        let offset = Arc::clone(&offset);

        Box::pin(async move {
            let current = offset.load(Ordering::Relaxed);
            tracing::info!(offset = current, "scheduler: starting discovery batch");

            match run_discovery_batch(
                &pool,
                &fetcher,
                current,
                config.discover_window,
                config.posts_per_source,
            )
            .await
            {
                Ok(outcome) => {
                    let next = if outcome.roster_exhausted {
                        0
                    } else {
                        outcome.next_offset
                    };
                    offset.store(next, Ordering::Relaxed);
                    tracing::info!(
                        new_posts = outcome.new_posts,
                        next_offset = next,
                        "scheduler: discovery batch complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: discovery batch failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Registers the recurring enrichment job.
async fn register_enrichment_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    fetcher: Arc<FeedFetcher>,
    llm: Arc<LlmClient>,
    config: Arc<AppConfig>,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(ENRICHMENT_SCHEDULE, move |_uuid, _lock| {
        let pool = pool.clone();
        let fetcher = Arc::clone(&fetcher);
        let llm = Arc::clone(&llm);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting enrichment batch");

            let budget = Duration::from_secs(config.job_budget_secs);
            match run_enrichment_batch(&pool, &fetcher, &llm, config.enrich_batch, budget).await {
                Ok(outcome) => {
                    tracing::info!(
                        enriched_count = outcome.enriched_count,
                        all_caught_up = outcome.all_caught_up,
                        "scheduler: enrichment batch complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: enrichment batch failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
