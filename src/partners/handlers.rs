use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreatePartnerRequest, PartnerQuery, UpdatePartnerRequest},
    repo,
    repo::Partner,
};
use crate::{
    auth::{dto::MessageResponse, extractors::AdminUser},
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn partner_routes() -> Router<AppState> {
    Router::new()
        .route("/partners", get(list_partners).post(create_partner))
        .route(
            "/partners/:id",
            get(get_partner).put(update_partner).delete(delete_partner),
        )
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[instrument(skip(state))]
pub async fn list_partners(
    State(state): State<AppState>,
    Query(q): Query<PartnerQuery>,
) -> ApiResult<Json<Vec<Partner>>> {
    let rows = repo::list_active(&state.db, non_blank(&q.search), non_blank(&q.category)).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_partner(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Partner>> {
    repo::find_active(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Partner not found"))
}

#[instrument(skip(state, payload))]
pub async fn create_partner(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreatePartnerRequest>,
) -> ApiResult<(StatusCode, Json<Partner>)> {
    payload.validate()?;
    let partner = repo::create(&state.db, &payload).await?;
    info!(%admin_id, partner_id = %partner.id, "partner created");
    Ok((StatusCode::CREATED, Json(partner)))
}

#[instrument(skip(state, payload))]
pub async fn update_partner(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePartnerRequest>,
) -> ApiResult<Json<Partner>> {
    payload.validate()?;
    let partner = repo::update(&state.db, id, &payload)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner not found"))?;
    info!(%admin_id, partner_id = %id, "partner updated");
    Ok(Json(partner))
}

#[instrument(skip(state))]
pub async fn delete_partner(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !repo::deactivate(&state.db, id).await? {
        return Err(ApiError::not_found("Partner not found"));
    }
    info!(%admin_id, partner_id = %id, "partner deactivated");
    Ok(Json(MessageResponse::new("Partner removed")))
}

#[cfg(test)]
mod tests {
    use crate::{app::build_app, state::AppState};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn create_requires_token() {
        let res = build_app(AppState::fake())
            .oneshot(
                Request::post("/api/partners")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"Signature","category":"FBO"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
