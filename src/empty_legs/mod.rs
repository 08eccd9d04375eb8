use crate::state::AppState;
use axum::Router;

pub mod dto;
mod handlers;
pub mod pricing;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod store;

pub fn router() -> Router<AppState> {
    handlers::empty_leg_routes()
}
