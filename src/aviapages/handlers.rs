use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::dto::{validate_legs, CharterPriceRequest, CreateQuoteRequest, SearchQuery};
use crate::{
    auth::{extractors::AuthUser, services::is_valid_email},
    bookings,
    error::{ApiError, ApiResult},
    state::AppState,
    throttle::ThrottleStatus,
};

pub fn aviapages_routes() -> Router<AppState> {
    Router::new()
        .route("/aviapages/charter-prices", post(charter_prices))
        .route("/aviapages/aircraft", get(search_aircraft))
        .route("/aviapages/aircraft/:id", get(aircraft_details))
        .route("/aviapages/airports", get(search_airports))
        .route("/aviapages/quotes", post(create_quote))
        .route("/aviapages/status", get(status))
}

#[instrument(skip(state, payload))]
pub async fn charter_prices(
    State(state): State<AppState>,
    Json(payload): Json<CharterPriceRequest>,
) -> ApiResult<Json<Value>> {
    validate_legs(&payload.legs)?;
    let prices = state.aviapages.charter_prices(&payload.to_upstream()).await?;
    Ok(Json(prices))
}

#[instrument(skip(state))]
pub async fn search_aircraft(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let query = q.search.trim();
    if query.len() < 2 {
        return Err(ApiError::bad_request("Search must be at least 2 characters"));
    }
    Ok(Json(state.aviapages.search_aircraft(query).await?))
}

#[instrument(skip(state))]
pub async fn aircraft_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.aviapages.aircraft_details(id).await?))
}

#[instrument(skip(state))]
pub async fn search_airports(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    let query = q.search.trim();
    if query.len() < 2 {
        return Err(ApiError::bad_request("Search must be at least 2 characters"));
    }
    Ok(Json(state.aviapages.search_airports(query).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_quote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateQuoteRequest>,
) -> ApiResult<Json<Value>> {
    validate_legs(&payload.legs)?;
    if payload.contact_name.trim().is_empty() || !is_valid_email(&payload.contact_email) {
        return Err(ApiError::bad_request("Valid contact name and email are required"));
    }
    let quote = state.aviapages.create_quote(&payload.to_upstream()).await?;
    if let Some(booking_id) = payload.booking_id {
        if bookings::repo::attach_quote(&state.db, booking_id, user_id, &quote).await? {
            info!(%booking_id, "quote stored on booking");
        } else {
            warn!(%booking_id, %user_id, "quote not stored: booking not found for caller");
        }
    }
    info!(%user_id, "charter quote requested");
    Ok(Json(quote))
}

pub async fn status(State(state): State<AppState>) -> Json<ThrottleStatus> {
    Json(state.aviapages.throttler().status())
}

#[cfg(test)]
mod tests {
    use crate::{app::build_app, state::AppState};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(req: Request<Body>) -> (StatusCode, Value) {
        let res = build_app(AppState::fake()).oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn status_exposes_throttler_window() {
        let (status, body) = call(Request::get("/api/aviapages/status").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["max_requests"], 10);
        assert_eq!(body["window_secs"], 60);
        assert_eq!(body["in_window"], 0);
    }

    #[tokio::test]
    async fn short_search_is_rejected() {
        let (status, _) = call(
            Request::get("/api/aviapages/airports?search=E")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unconfigured_upstream_is_a_friendly_500() {
        let (status, body) = call(
            Request::post("/api/aviapages/charter-prices")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"legs":[{"departure_airport":"EGLF","arrival_airport":"LFPB","departure_datetime":"2026-11-02T09:30"}]}"#,
                ))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Aviation data provider request failed");
    }
}
