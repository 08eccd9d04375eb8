use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rand::thread_rng;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{BookLegRequest, CreateLegRequest, LegFilter, UpdateLegRequest},
    repo,
    repo_types::EmptyLeg,
    services::{booking_for_leg, check_bookable, leg_confirmation_email, resolve_savings},
};
use crate::{
    auth::{
        dto::MessageResponse,
        extractors::{AdminUser, AuthUser},
        services::is_valid_email,
    },
    bookings::{self, repo_types::Booking, services::generate_reference},
    error::{ApiError, ApiResult},
    mailer::send_detached,
    state::AppState,
};

pub fn empty_leg_routes() -> Router<AppState> {
    Router::new()
        .route("/empty-legs", get(list_legs).post(create_leg))
        .route(
            "/empty-legs/:id",
            get(get_leg).put(update_leg).delete(delete_leg),
        )
        .route("/empty-legs/:id/book", post(book_leg))
}

#[instrument(skip(state))]
pub async fn list_legs(
    State(state): State<AppState>,
    Query(filter): Query<LegFilter>,
) -> ApiResult<Json<Vec<EmptyLeg>>> {
    let resolved = filter.resolve(OffsetDateTime::now_utc())?;
    Ok(Json(repo::list_available(&state.db, &resolved).await?))
}

#[instrument(skip(state))]
pub async fn get_leg(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<EmptyLeg>> {
    repo::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Empty leg not found"))
}

#[instrument(skip(state, payload))]
pub async fn book_leg(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookLegRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    if payload.contact.name.trim().is_empty() || !is_valid_email(payload.contact.email.trim()) {
        return Err(ApiError::bad_request("Valid contact name and email are required"));
    }

    let mut tx = state.db.begin().await?;
    let leg = repo::lock_for_booking(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Empty leg not found"))?;
    check_bookable(&leg, payload.passengers, OffsetDateTime::now_utc())?;

    let reference = generate_reference(&mut thread_rng());
    let new = booking_for_leg(
        &leg,
        user_id,
        reference,
        payload.passengers,
        payload.contact,
        payload.special_requests,
    );
    let booking = bookings::repo::insert_tx(&mut tx, &new).await?;
    if !repo::mark_booked(&mut tx, leg.id, user_id, booking.id).await? {
        // dropping the transaction rolls the booking back
        return Err(ApiError::bad_request("Empty leg is no longer available"));
    }
    tx.commit().await?;

    info!(%user_id, leg_id = %leg.id, booking_id = %booking.id, "empty leg booked");
    send_detached(state.mailer.clone(), leg_confirmation_email(&leg, &booking));
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(state, payload))]
pub async fn create_leg(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Json(payload): Json<CreateLegRequest>,
) -> ApiResult<(StatusCode, Json<EmptyLeg>)> {
    payload.validate()?;
    let savings = resolve_savings(payload.savings_percentage, payload.regular_price, payload.price);
    let leg = repo::create_manual(&state.db, &payload, savings).await?;
    info!(%admin_id, leg_id = %leg.id, "manual empty leg created");
    Ok((StatusCode::CREATED, Json(leg)))
}

#[instrument(skip(state, payload))]
pub async fn update_leg(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLegRequest>,
) -> ApiResult<Json<EmptyLeg>> {
    if matches!(payload.seats, Some(s) if s < 1) {
        return Err(ApiError::bad_request("Seats must be at least 1"));
    }
    if matches!(payload.price, Some(p) if p < 0.0) || matches!(payload.regular_price, Some(p) if p < 0.0) {
        return Err(ApiError::bad_request("Prices cannot be negative"));
    }
    let current = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Empty leg not found"))?;

    // re-derive savings when a price moves and none was supplied
    let savings = match payload.savings_percentage {
        Some(s) => Some(s),
        None if payload.price.is_some() || payload.regular_price.is_some() => Some(resolve_savings(
            None,
            payload.regular_price.unwrap_or(current.regular_price),
            payload.price.unwrap_or(current.price),
        )),
        None => None,
    };

    let leg = repo::update(&state.db, id, &payload, savings)
        .await?
        .ok_or_else(|| ApiError::not_found("Empty leg not found"))?;
    info!(%admin_id, leg_id = %id, "empty leg updated");
    Ok(Json(leg))
}

#[instrument(skip(state))]
pub async fn delete_leg(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !repo::deactivate(&state.db, id).await? {
        return Err(ApiError::not_found("Empty leg not found"));
    }
    info!(%admin_id, leg_id = %id, "empty leg deactivated");
    Ok(Json(MessageResponse::new("Empty leg removed")))
}

#[cfg(test)]
mod tests {
    use crate::{app::build_app, auth::claims::Role, auth::jwt::JwtKeys, state::AppState};
    use axum::{
        body::Body,
        extract::FromRef,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;
    use uuid::Uuid;

    fn bearer(state: &AppState, role: Role) -> String {
        let keys = JwtKeys::from_ref(state);
        format!("Bearer {}", keys.sign_access(Uuid::new_v4(), role).unwrap())
    }

    #[tokio::test]
    async fn booking_requires_auth() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::post(format!("/api/empty-legs/{}/book", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"passengers":1,"contact":{"name":"A","email":"a@b.co"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn far_future_date_to_is_a_bad_request() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::get("/api/empty-legs?date_to=9999-12-31")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn booking_validates_contact_before_db() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let res = app
            .oneshot(
                Request::post(format!("/api/empty-legs/{}/book", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .header("authorization", auth)
                    .body(Body::from(r#"{"passengers":1,"contact":{"name":"Ada","email":"nope"}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn manual_legs_are_admin_only() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let res = app
            .oneshot(
                Request::delete(format!("/api/empty-legs/{}", Uuid::new_v4()))
                    .header("authorization", auth)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn list_rejects_malformed_dates() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::get("/api/empty-legs?date_from=tomorrow")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
