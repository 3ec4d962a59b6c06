mod dto;
pub mod handlers;
pub mod repo;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::checkout_routes())
        .merge(handlers::read_routes())
        .merge(handlers::admin_routes())
}
