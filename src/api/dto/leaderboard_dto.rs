//! DTOs for the merchant leaderboard endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::LeaderboardEntry;
use crate::service::LeaderboardSort;

/// Query parameters for `GET /leaderboard/merchants`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaderboardQuery {
    /// Sort dimension; defaults to `points`.
    pub sort: Option<LeaderboardSort>,
}

/// Leaderboard response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Ranked entries, best first.
    pub entries: Vec<LeaderboardEntry>,
    /// When the board was last published.
    pub last_refreshed_at: Option<DateTime<Utc>>,
}
