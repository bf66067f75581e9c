//! REST API layer: route handlers, DTOs, session cookies, and router
//! composition.
//!
//! All endpoints are mounted at the root to match the public frontends.

pub mod dto;
pub mod handlers;
pub mod session;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes())
}
