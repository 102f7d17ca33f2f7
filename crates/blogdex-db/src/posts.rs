//! Database operations for the `posts` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use blogdex_core::DiscoveredPost;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `posts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub url: String,
    pub score: i32,
    pub comments: i32,
    pub published_at: DateTime<Utc>,
    pub is_summarized: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const POST_COLUMNS: &str = "id, source_id, title, url, score, comments, published_at, \
                            is_summarized, created_at, updated_at";

/// Titles longer than this are truncated before insert to fit the column.
const MAX_TITLE_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns whether a post with this URL already exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn post_exists(pool: &PgPool, url: &str) -> Result<bool, DbError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE url = $1)")
        .bind(url)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Inserts a discovered post unless its URL is already known.
///
/// The URL carries a unique constraint, so concurrent discovery runs racing on
/// the same post resolve to a single row; `ON CONFLICT DO NOTHING` makes the
/// loser a no-op. Returns `true` if a row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn insert_post_if_new(
    pool: &PgPool,
    source_id: i64,
    post: &DiscoveredPost,
) -> Result<bool, DbError> {
    let title: String = post.title.chars().take(MAX_TITLE_LEN).collect();

    let result = sqlx::query(
        "INSERT INTO posts (source_id, title, url, score, comments, published_at) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (url) DO NOTHING",
    )
    .bind(source_id)
    .bind(&title)
    .bind(&post.url)
    .bind(post.score)
    .bind(post.comments)
    .bind(post.published_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Returns the oldest unsummarized posts, up to `limit`.
///
/// Oldest-first keeps the enrichment backlog from starving early posts when
/// new ones keep arriving.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unsummarized(pool: &PgPool, limit: i64) -> Result<Vec<PostRow>, DbError> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        "SELECT {POST_COLUMNS} \
         FROM posts \
         WHERE is_summarized = FALSE \
         ORDER BY published_at ASC, id ASC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns the number of posts still awaiting enrichment.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_unsummarized(pool: &PgPool) -> Result<i64, DbError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE is_summarized = FALSE")
            .fetch_one(pool)
            .await?;
    Ok(count)
}
