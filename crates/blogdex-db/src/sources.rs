//! Database operations for the `sources` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use blogdex_core::SourceConfig;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `sources` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SourceRow {
    pub id: i64,
    pub domain: String,
    pub author: Option<String>,
    pub topics: String,
    pub total_score: i32,
    pub stories_count: i32,
    pub rank: Option<i32>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const SOURCE_COLUMNS: &str = "id, domain, author, topics, total_score, stories_count, rank, \
                              last_fetched_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Upsert sources from the roster into the database.
///
/// Returns the number of sources processed. All upserts run inside a single
/// transaction; if any operation fails the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_sources(pool: &PgPool, sources: &[SourceConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for source in sources {
        let domain = source.domain.trim().to_lowercase();
        let topics = source.topics.join(",");

        sqlx::query(
            "INSERT INTO sources (domain, author, topics, rank) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (domain) DO UPDATE SET \
                 author = EXCLUDED.author, \
                 topics = EXCLUDED.topics, \
                 rank = EXCLUDED.rank, \
                 updated_at = NOW()",
        )
        .bind(&domain)
        .bind(&source.author)
        .bind(&topics)
        .bind(source.rank)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}

/// Returns a contiguous window of sources ordered by rank (nulls last), then id.
///
/// Discovery walks the roster in this order with a wrapping offset, so the
/// ordering must be stable across calls.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_source_window(
    pool: &PgPool,
    offset: i64,
    limit: i64,
) -> Result<Vec<SourceRow>, DbError> {
    let rows = sqlx::query_as::<_, SourceRow>(&format!(
        "SELECT {SOURCE_COLUMNS} \
         FROM sources \
         ORDER BY rank NULLS LAST, id \
         OFFSET $1 LIMIT $2"
    ))
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the total number of sources in the roster.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_sources(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sources")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Records that a source was just visited by discovery and rolls its
/// aggregate counters forward.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn touch_last_fetched(
    pool: &PgPool,
    source_id: i64,
    new_posts: i64,
) -> Result<(), DbError> {
    sqlx::query(
        "UPDATE sources \
         SET last_fetched_at = NOW(), \
             stories_count = stories_count + $2, \
             updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(source_id)
    .bind(i32::try_from(new_posts).unwrap_or(i32::MAX))
    .execute(pool)
    .await?;
    Ok(())
}
