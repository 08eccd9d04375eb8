use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
mod repo;

pub fn router() -> Router<AppState> {
    handlers::partner_routes()
}
