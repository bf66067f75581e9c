//! REST endpoint handlers organized by resource.

pub mod admin;
pub mod contact;
pub mod leaderboard;
pub mod system;
pub mod task;
pub mod user;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(user::routes())
        .merge(task::routes())
        .merge(admin::routes())
        .merge(leaderboard::routes())
        .merge(contact::routes())
}
