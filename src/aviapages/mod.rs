use crate::state::AppState;
use axum::Router;

mod client;
pub mod dto;
mod handlers;

pub use client::{retry_on_rate_limit, AviapagesClient, UpstreamError};

pub fn router() -> Router<AppState> {
    handlers::aviapages_routes()
}
