use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};
use serde_json::{Map, Value};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AddPaymentMethodRequest, ChangePasswordRequest, UpdateProfileRequest},
    repo,
    services::{add_method, build_payment_method, merge_preferences, remove_method, set_default_method},
};
use crate::{
    auth::{
        dto::{MessageResponse, PublicUser},
        extractors::AuthUser,
        password::{hash_password, verify_password, validate_new_password},
        repo_types::{PaymentMethod, User},
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .route("/users/password", put(change_password))
        .route(
            "/users/payment-methods",
            get(list_payment_methods).post(add_payment_method),
        )
        .route("/users/payment-methods/:id", delete(delete_payment_method))
        .route("/users/payment-methods/:id/default", put(make_default_payment_method))
        .route("/users/preferences", get(get_preferences).put(update_preferences))
}

async fn load_user(state: &AppState, user_id: Uuid) -> ApiResult<User> {
    User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<PublicUser>> {
    let user = load_user(&state, user_id).await?;
    Ok(Json(PublicUser::from(&user)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<PublicUser>> {
    let first = payload.first_name.as_deref().map(str::trim);
    let last = payload.last_name.as_deref().map(str::trim);
    if first == Some("") || last == Some("") {
        return Err(ApiError::bad_request("Name cannot be empty"));
    }
    let user = repo::update_profile(
        &state.db,
        user_id,
        first,
        last,
        payload.phone.as_deref().map(str::trim),
    )
    .await?
    .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!(%user_id, "profile updated");
    Ok(Json(PublicUser::from(&user)))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    validate_new_password(&payload.new_password)?;
    let user = load_user(&state, user_id).await?;
    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!(%user_id, "password change with wrong current password");
        return Err(ApiError::bad_request("Current password is incorrect"));
    }
    let hash = hash_password(&payload.new_password)?;
    repo::update_password(&state.db, user_id, &hash).await?;
    info!(%user_id, "password changed");
    Ok(Json(MessageResponse::new("Password updated")))
}

#[instrument(skip(state))]
pub async fn list_payment_methods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<PaymentMethod>>> {
    let user = load_user(&state, user_id).await?;
    Ok(Json(user.payment_methods.0))
}

#[instrument(skip(state, payload))]
pub async fn add_payment_method(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddPaymentMethodRequest>,
) -> ApiResult<(StatusCode, Json<Vec<PaymentMethod>>)> {
    let year = OffsetDateTime::now_utc().year() as u16;
    let method = build_payment_method(&payload, year)?;
    let mut methods = load_user(&state, user_id).await?.payment_methods.0;
    add_method(&mut methods, method);
    repo::set_payment_methods(&state.db, user_id, &methods).await?;
    Ok((StatusCode::CREATED, Json(methods)))
}

#[instrument(skip(state))]
pub async fn delete_payment_method(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PaymentMethod>>> {
    let mut methods = load_user(&state, user_id).await?.payment_methods.0;
    if !remove_method(&mut methods, id) {
        return Err(ApiError::not_found("Payment method not found"));
    }
    repo::set_payment_methods(&state.db, user_id, &methods).await?;
    Ok(Json(methods))
}

#[instrument(skip(state))]
pub async fn make_default_payment_method(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PaymentMethod>>> {
    let mut methods = load_user(&state, user_id).await?.payment_methods.0;
    if !set_default_method(&mut methods, id) {
        return Err(ApiError::not_found("Payment method not found"));
    }
    repo::set_payment_methods(&state.db, user_id, &methods).await?;
    Ok(Json(methods))
}

#[instrument(skip(state))]
pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Value>> {
    Ok(Json(load_user(&state, user_id).await?.preferences.0))
}

#[instrument(skip(state, patch))]
pub async fn update_preferences(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(patch): Json<Map<String, Value>>,
) -> ApiResult<Json<Value>> {
    let user = load_user(&state, user_id).await?;
    let merged = merge_preferences(&user.preferences.0, patch);
    repo::set_preferences(&state.db, user_id, &merged).await?;
    Ok(Json(merged))
}
