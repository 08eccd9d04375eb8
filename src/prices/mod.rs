use crate::state::AppState;
use axum::Router;

mod handlers;
pub mod scheduler;

pub fn router() -> Router<AppState> {
    handlers::price_routes()
}
