use crate::state::AppState;
use axum::Router;

pub mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod repo;
pub mod validators;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
