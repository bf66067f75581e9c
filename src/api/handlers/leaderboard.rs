//! Leaderboard handler: the published merchant board.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{LeaderboardQuery, LeaderboardResponse};
use crate::app_state::AppState;
use crate::error::GatewayError;
use crate::service::LeaderboardSort;

/// `GET /leaderboard/merchants`: The published merchant leaderboard.
///
/// # Errors
///
/// Returns [`GatewayError`] only on internal failures; an empty system
/// still serves a full synthetic board.
#[utoipa::path(
    get,
    path = "/leaderboard/merchants",
    tag = "Leaderboard",
    summary = "Merchant leaderboard",
    description = "Returns the last published board for the requested sort dimension. Boards are refreshed on a fixed interval; reads never trigger recomputation once a board exists.",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Ranked board", body = LeaderboardResponse),
    )
)]
pub async fn merchants(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let sort = query.sort.unwrap_or(LeaderboardSort::Points);
    let entries = state.leaderboard.board(sort).await;
    let last_refreshed_at = state.leaderboard.last_refreshed_at().await;

    Ok(Json(LeaderboardResponse {
        entries,
        last_refreshed_at,
    }))
}

/// Leaderboard routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/leaderboard/merchants", get(merchants))
}
