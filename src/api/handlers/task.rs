//! Task handlers: submission, resubmission, quiz grading, and Telegram
//! membership verification.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    QuizResultResponse, QuizSubmitRequest, ResubmitTaskRequest, SubmitTaskRequest, TaskDto,
    TaskListResponse, TelegramVerifyRequest, TelegramVerifyResponse,
};
use crate::api::session::authenticate;
use crate::app_state::AppState;
use crate::domain::{TaskId, TaskType, UserId};
use crate::error::{ErrorResponse, GatewayError};

/// Loads a task and checks it belongs to the session user.
async fn owned_task(
    state: &AppState,
    user_id: UserId,
    task_id: TaskId,
) -> Result<crate::domain::Task, GatewayError> {
    let task = state.task_service.get(task_id).await?;
    if task.user_id != user_id {
        return Err(GatewayError::Unauthorized);
    }
    Ok(task)
}

/// `POST /tasks`: Submit a task of a given type.
///
/// # Errors
///
/// Returns [`GatewayError`] for unknown types or an existing task of the
/// same type.
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "Tasks",
    summary = "Submit a task",
    description = "Creates the authenticated user's task of the given type. At most one task per type exists per user; resubmitting proof goes through the task's own submit endpoint.",
    request_body = SubmitTaskRequest,
    responses(
        (status = 201, description = "Task submitted", body = TaskDto),
        (status = 400, description = "Unknown task type", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 409, description = "Task of this type already exists", body = ErrorResponse),
    )
)]
pub async fn submit_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SubmitTaskRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let task_type = TaskType::parse(&req.task_type)?;
    let proof = req.proof.map(Into::into).unwrap_or_default();

    let task = state.task_service.submit(user_id, task_type, proof).await?;
    Ok((StatusCode::CREATED, Json(TaskDto::from(task))))
}

/// `GET /tasks`: The authenticated user's tasks.
///
/// # Errors
///
/// Returns [`GatewayError::Unauthorized`] without a valid session.
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "Tasks",
    summary = "List own tasks",
    description = "Returns the authenticated user's tasks, oldest submission first.",
    responses(
        (status = 200, description = "Task list", body = TaskListResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
    )
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let tasks = state.task_service.list_for_user(user_id).await;

    Ok(Json(TaskListResponse {
        tasks: tasks.into_iter().map(TaskDto::from).collect(),
    }))
}

/// `POST /tasks/:id/submit`: Replace the proof on an existing task.
///
/// # Errors
///
/// Returns [`GatewayError`] for unknown ids, foreign tasks, or completed
/// tasks.
#[utoipa::path(
    post,
    path = "/tasks/{id}/submit",
    tag = "Tasks",
    summary = "Resubmit proof",
    description = "Attaches new proof to the task. A rejected task returns to pending.",
    params(
        ("id" = uuid::Uuid, Path, description = "Task UUID"),
    ),
    request_body = ResubmitTaskRequest,
    responses(
        (status = 200, description = "Proof replaced", body = TaskDto),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task already completed", body = ErrorResponse),
    )
)]
pub async fn resubmit_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<ResubmitTaskRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let task_id = TaskId::from_uuid(id);
    owned_task(&state, user_id, task_id).await?;

    let proof = req.proof.map(Into::into).unwrap_or_default();
    let task = state.task_service.resubmit(task_id, proof).await?;
    Ok(Json(TaskDto::from(task)))
}

/// `POST /tasks/:id/quiz`: Grade a quiz attempt.
///
/// # Errors
///
/// Returns [`GatewayError`] for unknown ids, non-quiz tasks, or an
/// already passed quiz.
#[utoipa::path(
    post,
    path = "/tasks/{id}/quiz",
    tag = "Tasks",
    summary = "Submit quiz answers",
    description = "Grades the answers against the configured key. A perfect score completes the task and awards its points; anything less leaves it pending for another attempt.",
    params(
        ("id" = uuid::Uuid, Path, description = "Task UUID"),
    ),
    request_body = QuizSubmitRequest,
    responses(
        (status = 200, description = "Graded attempt", body = QuizResultResponse),
        (status = 400, description = "Not a quiz task", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Quiz already passed", body = ErrorResponse),
    )
)]
pub async fn submit_quiz(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<QuizSubmitRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let task_id = TaskId::from_uuid(id);
    owned_task(&state, user_id, task_id).await?;

    let outcome = state.task_service.submit_quiz(task_id, &req.answers).await?;
    Ok(Json(QuizResultResponse {
        passed: outcome.passed,
        correct: outcome.correct,
        total: outcome.total,
        task: TaskDto::from(outcome.task),
    }))
}

/// `POST /tasks/:id/verify-telegram`: Verify channel membership.
///
/// # Errors
///
/// Returns [`GatewayError`] for unknown ids, non-verification tasks, or
/// upstream failures.
#[utoipa::path(
    post,
    path = "/tasks/{id}/verify-telegram",
    tag = "Tasks",
    summary = "Verify Telegram membership",
    description = "Checks channel membership for the given Telegram account id. Confirmed membership completes the task and awards its points; otherwise it stays pending.",
    params(
        ("id" = uuid::Uuid, Path, description = "Task UUID"),
    ),
    request_body = TelegramVerifyRequest,
    responses(
        (status = 200, description = "Membership check result", body = TelegramVerifyResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task already completed", body = ErrorResponse),
        (status = 500, description = "Upstream check failed", body = ErrorResponse),
    )
)]
pub async fn verify_telegram(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<TelegramVerifyRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let user_id = authenticate(&state.sessions, &headers)?;
    let task_id = TaskId::from_uuid(id);
    owned_task(&state, user_id, task_id).await?;

    let outcome = state
        .task_service
        .verify_membership(task_id, req.chat_member_id)
        .await?;
    Ok(Json(TelegramVerifyResponse {
        verified: outcome.verified,
        task: TaskDto::from(outcome.task),
    }))
}

/// Task routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", post(submit_task).get(list_tasks))
        .route("/tasks/{id}/submit", post(resubmit_task))
        .route("/tasks/{id}/quiz", post(submit_quiz))
        .route("/tasks/{id}/verify-telegram", post(verify_telegram))
}
