use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::scheduler::SchedulerStatus;
use crate::{
    auth::extractors::AdminUser,
    empty_legs::{
        pricing::{airport, estimate, haversine_km, Airport, PriceEstimate, ROUTES},
        services::RefreshSummary,
    },
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn price_routes() -> Router<AppState> {
    Router::new()
        .route("/prices/status", get(status))
        .route("/prices/refresh", post(refresh))
        .route("/prices/routes", get(routes))
        .route("/prices/estimate", get(estimate_price))
}

pub async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.scheduler.status())
}

#[instrument(skip(state))]
pub async fn refresh(
    State(state): State<AppState>,
    AdminUser(admin_id): AdminUser,
) -> ApiResult<Json<RefreshSummary>> {
    info!(%admin_id, "manual price refresh requested");
    Ok(Json(state.scheduler.run_now().await?))
}

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub from: &'static Airport,
    pub to: &'static Airport,
    pub distance_km: f64,
}

pub async fn routes() -> Json<Vec<RouteInfo>> {
    let list = ROUTES
        .iter()
        .filter_map(|r| {
            let (from, to) = (airport(r.from)?, airport(r.to)?);
            Some(RouteInfo {
                from,
                to,
                distance_km: haversine_km(from, to).round(),
            })
        })
        .collect();
    Json(list)
}

#[derive(Debug, Deserialize)]
pub struct EstimateQuery {
    pub from: String,
    pub to: String,
    pub category: Option<String>,
}

pub async fn estimate_price(Query(q): Query<EstimateQuery>) -> ApiResult<Json<PriceEstimate>> {
    let category = q.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    estimate(q.from.trim(), q.to.trim(), category)
        .map(Json)
        .map_err(|e| ApiError::bad_request(e.to_string()))
}
