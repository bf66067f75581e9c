//! Admin review handlers guarded by a shared token.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::TaskDto;
use crate::app_state::AppState;
use crate::domain::TaskId;
use crate::error::{ErrorResponse, GatewayError};

/// Name of the admin credential header.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Checks the admin credential header against the configured token. An
/// unset token disables the admin surface entirely.
fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), GatewayError> {
    let Some(expected) = &state.admin_token else {
        return Err(GatewayError::Unauthorized);
    };
    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(GatewayError::Unauthorized)?;
    if provided != expected {
        return Err(GatewayError::Unauthorized);
    }
    Ok(())
}

/// `POST /admin/tasks/:id/verify`: Approve a task.
///
/// # Errors
///
/// Returns [`GatewayError`] on bad credentials, unknown ids, or an
/// already completed task.
#[utoipa::path(
    post,
    path = "/admin/tasks/{id}/verify",
    tag = "Admin",
    summary = "Verify a task",
    description = "Marks the task completed, awards its points exactly once, and advances the matching referral checklist action. Requires the admin token header.",
    params(
        ("id" = uuid::Uuid, Path, description = "Task UUID"),
    ),
    responses(
        (status = 200, description = "Task verified", body = TaskDto),
        (status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task already verified", body = ErrorResponse),
    )
)]
pub async fn verify_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    require_admin(&state, &headers)?;
    let task = state.task_service.verify(TaskId::from_uuid(id)).await?;
    Ok(Json(TaskDto::from(task)))
}

/// `POST /admin/tasks/:id/reject`: Reject a task.
///
/// # Errors
///
/// Returns [`GatewayError`] on bad credentials, unknown ids, or an
/// already completed task.
#[utoipa::path(
    post,
    path = "/admin/tasks/{id}/reject",
    tag = "Admin",
    summary = "Reject a task",
    description = "Marks the task rejected. The proof stays attached so the user can resubmit. A completed task cannot be rejected.",
    params(
        ("id" = uuid::Uuid, Path, description = "Task UUID"),
    ),
    responses(
        (status = 200, description = "Task rejected", body = TaskDto),
        (status = 401, description = "Missing or invalid admin token", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task already verified", body = ErrorResponse),
    )
)]
pub async fn reject_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    require_admin(&state, &headers)?;
    let task = state.task_service.reject(TaskId::from_uuid(id)).await?;
    Ok(Json(TaskDto::from(task)))
}

/// Admin routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/tasks/{id}/verify", post(verify_task))
        .route("/admin/tasks/{id}/reject", post(reject_task))
}
