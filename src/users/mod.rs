use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
mod repo;
mod services;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
