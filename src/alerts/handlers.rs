use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::CreateAlertRequest, repo, repo::FlightAlert};
use crate::{
    auth::{dto::MessageResponse, extractors::AuthUser},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn alert_routes() -> Router<AppState> {
    Router::new()
        .route("/users/alerts", get(list_alerts).post(create_alert))
        .route("/users/alerts/:id", delete(delete_alert))
}

#[instrument(skip(state))]
pub async fn list_alerts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<FlightAlert>>> {
    Ok(Json(repo::list_active(&state.db, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_alert(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateAlertRequest>,
) -> ApiResult<(StatusCode, Json<FlightAlert>)> {
    payload.validate()?;
    let alert = repo::create(&state.db, user_id, &payload).await?;
    info!(%user_id, alert_id = %alert.id, "flight alert created");
    Ok((StatusCode::CREATED, Json(alert)))
}

#[instrument(skip(state))]
pub async fn delete_alert(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !repo::deactivate(&state.db, user_id, id).await? {
        return Err(ApiError::not_found("Alert not found"));
    }
    Ok(Json(MessageResponse::new("Alert removed")))
}
