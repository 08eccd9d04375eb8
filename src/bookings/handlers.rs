use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use rand::thread_rng;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CreateBookingRequest, Pagination, UpdateStatusRequest},
    repo,
    repo_types::{Booking, NewBooking},
    services::{
        check_status_change, confirmation_email, generate_reference, plan_cancel, price_request,
        validate_create, CancelOutcome,
    },
};
use crate::{
    auth::extractors::{AdminUser, AuthUser, Caller},
    error::{ApiError, ApiResult},
    mailer::send_detached,
    state::AppState,
};

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/cancel", put(cancel_booking))
        .route("/bookings/:id/status", put(update_status))
        .route("/bookings/reference/:reference", get(get_by_reference))
}

#[instrument(skip(state, payload))]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateBookingRequest>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    validate_create(&payload)?;

    let upstream_price = if payload.request_quote {
        let request = price_request(&payload).to_upstream();
        match state.aviapages.charter_prices(&request).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, %user_id, "charter price lookup failed; booking without quote");
                None
            }
        }
    } else {
        None
    };

    let new = NewBooking {
        user_id: Some(user_id),
        booking_reference: generate_reference(&mut thread_rng()),
        trip_type: payload.trip_type,
        legs: payload.legs,
        aircraft: payload.aircraft,
        passengers: payload.passengers,
        contact: payload.contact,
        special_requests: payload.special_requests,
        total_price: payload.total_price,
        currency: payload.currency.unwrap_or_else(|| "USD".into()),
        empty_leg_id: None,
        upstream_price,
    };
    let booking = repo::insert(&state.db, &new).await?;

    info!(%user_id, booking_id = %booking.id, reference = %booking.booking_reference, "booking created");
    send_detached(state.mailer.clone(), confirmation_email(&booking));
    Ok((StatusCode::CREATED, Json(booking)))
}

#[instrument(skip(state))]
pub async fn list_bookings(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> ApiResult<Json<Vec<Booking>>> {
    let (limit, offset) = p.clamped();
    Ok(Json(repo::list_by_user(&state.db, user_id, limit, offset).await?))
}

async fn load_visible(state: &AppState, caller: Caller, id: Uuid) -> ApiResult<Booking> {
    match repo::find_by_id(&state.db, id).await? {
        Some(b) if caller.can_access(b.user_id) => Ok(b),
        // other users' bookings look missing
        _ => Err(ApiError::not_found("Booking not found")),
    }
}

#[instrument(skip(state))]
pub async fn get_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Booking>> {
    Ok(Json(load_visible(&state, caller, id).await?))
}

#[instrument(skip(state))]
pub async fn get_by_reference(
    State(state): State<AppState>,
    caller: Caller,
    Path(reference): Path<String>,
) -> ApiResult<Json<Booking>> {
    match repo::find_by_reference(&state.db, reference.trim()).await? {
        Some(b) if caller.can_access(b.user_id) => Ok(Json(b)),
        _ => Err(ApiError::not_found("Booking not found")),
    }
}

#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Booking>> {
    let booking = load_visible(&state, caller, id).await?;
    match plan_cancel(booking.status()?)? {
        CancelOutcome::AlreadyCancelled => Ok(Json(booking)),
        CancelOutcome::Cancel => match repo::cancel(&state.db, id).await? {
            Some(cancelled) => {
                info!(booking_id = %id, by = %caller.id, "booking cancelled");
                Ok(Json(cancelled))
            }
            // status changed underneath us; re-evaluate against the fresh row
            None => {
                let fresh = load_visible(&state, caller, id).await?;
                plan_cancel(fresh.status()?)?;
                Ok(Json(fresh))
            }
        },
    }
}

#[instrument(skip(state, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<Booking>> {
    let booking = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Booking not found"))?;
    check_status_change(booking.status()?, payload.status)?;
    let updated = repo::set_status(&state.db, id, payload.status)
        .await?
        .ok_or_else(|| ApiError::bad_request("Booking is cancelled"))?;
    info!(booking_id = %id, %admin_id, status = %payload.status, "booking status updated");
    Ok(Json(updated))
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
    async fn create_requires_auth() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(
                Request::post("/api/bookings")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn invalid_booking_is_rejected_before_db() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let body = r#"{
            "trip_type": "round-trip",
            "legs": [{"from": "KTEB", "to": "KPBI", "departure_date": "2026-12-01"}],
            "passengers": 2,
            "contact": {"name": "Ada", "email": "ada@example.com"}
        }"#;
        let res = app
            .oneshot(
                Request::post("/api/bookings")
                    .header("content-type", "application/json")
                    .header("authorization", auth)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn status_update_is_admin_only() {
        let state = AppState::fake();
        let auth = bearer(&state, Role::User);
        let app = build_app(state);
        let res = app
            .oneshot(
                Request::put(format!("/api/bookings/{}/status", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .header("authorization", auth)
                    .body(Body::from(r#"{"status":"confirmed"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }
}
