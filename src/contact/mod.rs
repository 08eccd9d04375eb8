use crate::state::AppState;
use axum::Router;

mod dto;
mod handlers;
mod services;

pub fn router() -> Router<AppState> {
    handlers::contact_routes()
}
