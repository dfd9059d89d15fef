mod dto;
pub mod guard;
pub mod handlers;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::article_routes()
}
