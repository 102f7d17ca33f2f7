use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct RecentPostItem {
    post_id: i64,
    title: String,
    url: String,
    published_at: DateTime<Utc>,
    is_summarized: bool,
    source_domain: String,
    source_author: Option<String>,
    summary: Option<String>,
    key_points: Vec<String>,
    sentiment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecentQuery {
    pub limit: Option<i64>,
}

pub(super) async fn list_recent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<ApiResponse<Vec<RecentPostItem>>>, ApiError> {
    let rows = blogdex_db::list_recent_posts(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| RecentPostItem {
            post_id: row.id,
            title: row.title,
            url: row.url,
            published_at: row.published_at,
            is_summarized: row.is_summarized,
            source_domain: row.source_domain,
            source_author: row.source_author,
            summary: row.summary_text,
            key_points: row
                .key_points
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            sentiment: row.sentiment,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
