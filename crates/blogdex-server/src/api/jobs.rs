//! Manual batch triggers, mirroring what the scheduler runs on cron.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use blogdex_pipeline::{
    run_discovery_batch, run_enrichment_batch, DiscoveryOutcome, EnrichmentOutcome,
};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DiscoveryQuery {
    pub offset: Option<usize>,
    pub window: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EnrichmentQuery {
    pub batch: Option<usize>,
}

pub(super) async fn trigger_discovery(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DiscoveryQuery>,
) -> Result<Json<ApiResponse<DiscoveryOutcome>>, ApiError> {
    let offset = query.offset.unwrap_or(0);
    let window = query.window.unwrap_or(state.config.discover_window);

    let outcome = run_discovery_batch(
        &state.pool,
        &state.fetcher,
        offset,
        window,
        state.config.posts_per_source,
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "discovery batch failed");
        ApiError::new(req_id.0.clone(), "internal_error", "discovery batch failed")
    })?;

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn trigger_enrichment(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<EnrichmentQuery>,
) -> Result<Json<ApiResponse<EnrichmentOutcome>>, ApiError> {
    let batch = query.batch.unwrap_or(state.config.enrich_batch);
    let budget = Duration::from_secs(state.config.job_budget_secs);

    let outcome = run_enrichment_batch(&state.pool, &state.fetcher, &state.llm, batch, budget)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "enrichment batch failed");
            ApiError::new(req_id.0.clone(), "internal_error", "enrichment batch failed")
        })?;

    Ok(Json(ApiResponse {
        data: outcome,
        meta: ResponseMeta::new(req_id.0),
    }))
}
