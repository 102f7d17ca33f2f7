//! Database operations for the `summaries` table and the recent-posts read model.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use blogdex_core::PostSummary;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// One post joined with its source and (if present) its summary, for the
/// recent-posts listing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecentPostRow {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub is_summarized: bool,
    pub source_domain: String,
    pub source_author: Option<String>,
    pub summary_text: Option<String>,
    pub key_points: Option<serde_json::Value>,
    pub sentiment: Option<String>,
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Persists a summary and flips the post to summarized, atomically.
///
/// The `UPDATE` carries an `AND NOT is_summarized` guard so two enrichment
/// workers racing on the same post cannot both succeed; the loser observes
/// zero updated rows, the transaction rolls back, and
/// [`DbError::AlreadySummarized`] is returned.
///
/// # Errors
///
/// Returns [`DbError::AlreadySummarized`] if the post was already summarized,
/// or [`DbError::Sqlx`] if any statement fails.
pub async fn record_summary(
    pool: &PgPool,
    post_id: i64,
    summary: &PostSummary,
    model_used: &str,
) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        "UPDATE posts \
         SET is_summarized = TRUE, updated_at = NOW() \
         WHERE id = $1 AND NOT is_summarized",
    )
    .bind(post_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(DbError::AlreadySummarized);
    }

    let key_points = serde_json::json!(&summary.key_points);

    sqlx::query(
        "INSERT INTO summaries (post_id, summary_text, key_points, sentiment, model_used) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(post_id)
    .bind(&summary.summary)
    .bind(&key_points)
    .bind(summary.sentiment.as_str())
    .bind(model_used)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Returns the most recently published posts with their source and summary,
/// newest first.
///
/// Posts not yet enriched appear with `summary_text` and friends as `NULL`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_recent_posts(pool: &PgPool, limit: i64) -> Result<Vec<RecentPostRow>, DbError> {
    let rows = sqlx::query_as::<_, RecentPostRow>(
        "SELECT p.id, p.title, p.url, p.published_at, p.is_summarized, \
                s.domain AS source_domain, s.author AS source_author, \
                m.summary_text, m.key_points, m.sentiment \
         FROM posts p \
         JOIN sources s ON s.id = p.source_id \
         LEFT JOIN summaries m ON m.post_id = p.id \
         ORDER BY p.published_at DESC, p.id DESC \
         LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
