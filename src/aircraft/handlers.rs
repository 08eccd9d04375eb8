use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AircraftFilter, SyncRequest, SyncResponse},
    repo,
    repo_types::Aircraft,
    services::{
        fetch_and_store, is_stale, parse_upstream, refresh_in_background, search_results,
        FetchError, RETRY_ATTEMPTS, RETRY_BASE_DELAY,
    },
};
use crate::{
    auth::extractors::AdminUser,
    aviapages::{retry_on_rate_limit, UpstreamError},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn aircraft_routes() -> Router<AppState> {
    Router::new()
        .route("/aircraft", get(list_aircraft))
        .route("/aircraft/sync", post(sync_aircraft))
        .route("/aircraft/:id", get(get_aircraft))
        .route("/aircraft/external/:external_id", get(get_by_external_id))
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::Upstream(UpstreamError::Status { status: 404, .. }) => {
                ApiError::not_found("Aircraft not found")
            }
            FetchError::Upstream(u) => ApiError::Upstream(u),
            FetchError::Malformed => {
                ApiError::Internal(anyhow::anyhow!("upstream aircraft payload has no id"))
            }
            FetchError::Db(inner) => ApiError::Internal(inner),
        }
    }
}

#[instrument(skip(state))]
pub async fn list_aircraft(
    State(state): State<AppState>,
    Query(filter): Query<AircraftFilter>,
) -> ApiResult<Json<Vec<Aircraft>>> {
    Ok(Json(repo::list(&state.db, &filter).await?))
}

#[instrument(skip(state))]
pub async fn get_aircraft(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Aircraft>> {
    let aircraft = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Aircraft not found"))?;

    if is_stale(&aircraft, state.config.aircraft_stale_hours, OffsetDateTime::now_utc()) {
        let spawned = refresh_in_background(
            state.db.clone(),
            state.aviapages.clone(),
            &state.aircraft_refreshes,
            aircraft.external_id,
        );
        if spawned {
            info!(external_id = aircraft.external_id, "aircraft stale; refreshing in background");
        }
    }
    Ok(Json(aircraft))
}

#[instrument(skip(state))]
pub async fn get_by_external_id(
    State(state): State<AppState>,
    Path(external_id): Path<i64>,
) -> ApiResult<Json<Aircraft>> {
    if let Some(cached) = repo::find_by_external_id(&state.db, external_id).await? {
        return Ok(Json(cached));
    }
    let aircraft = fetch_and_store(&state.db, &state.aviapages, external_id).await?;
    info!(external_id, id = %aircraft.id, "aircraft cached from upstream");
    Ok(Json(aircraft))
}

#[instrument(skip(state, payload))]
pub async fn sync_aircraft(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<SyncRequest>,
) -> ApiResult<Json<SyncResponse>> {
    let query = payload.search.trim();
    if query.len() < 2 {
        return Err(ApiError::bad_request("Search must be at least 2 characters"));
    }

    let client = &state.aviapages;
    let response = retry_on_rate_limit(RETRY_ATTEMPTS, RETRY_BASE_DELAY, || {
        client.search_aircraft(query)
    })
    .await?;

    let results = search_results(&response);
    let mut synced = 0;
    for item in results {
        let Some(record) = parse_upstream(item) else {
            warn!("skipping upstream aircraft without id");
            continue;
        };
        repo::upsert(&state.db, &record).await?;
        synced += 1;
    }

    info!(%admin_id, query, found = results.len(), synced, "aircraft sync finished");
    Ok(Json(SyncResponse {
        found: results.len(),
        synced,
    }))
}
