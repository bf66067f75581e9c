//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::api::session::SessionKeys;
use crate::notify::TelegramNotifier;
use crate::service::{LeaderboardReconciler, TaskService, UserService};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// User registration and login.
    pub user_service: Arc<UserService>,
    /// Task submission and verification.
    pub task_service: Arc<TaskService>,
    /// Published leaderboard boards.
    pub leaderboard: Arc<LeaderboardReconciler>,
    /// Outbound Telegram client for the contact relay.
    pub notifier: Arc<TelegramNotifier>,
    /// Session cookie signing keys.
    pub sessions: SessionKeys,
    /// Shared secret guarding the `/admin` review endpoints.
    pub admin_token: Option<String>,
}
