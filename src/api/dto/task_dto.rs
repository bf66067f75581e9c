//! DTOs for task submission, quiz grading, and membership verification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Task, TaskProof};

/// Proof payload attached to a submission.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct TaskProofDto {
    /// Link to the social post.
    pub post_url: Option<String>,
    /// Link to a screenshot.
    pub screenshot_url: Option<String>,
    /// Free-text proof.
    pub text: Option<String>,
}

impl From<TaskProofDto> for TaskProof {
    fn from(dto: TaskProofDto) -> Self {
        Self {
            post_url: dto.post_url,
            screenshot_url: dto.screenshot_url,
            text: dto.text,
        }
    }
}

impl From<TaskProof> for TaskProofDto {
    fn from(proof: TaskProof) -> Self {
        Self {
            post_url: proof.post_url,
            screenshot_url: proof.screenshot_url,
            text: proof.text,
        }
    }
}

/// Request body for `POST /tasks`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitTaskRequest {
    /// Task type name; canonical names and legacy aliases are accepted.
    pub task_type: String,
    /// Optional proof payload.
    pub proof: Option<TaskProofDto>,
}

/// Request body for `POST /tasks/{id}/submit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResubmitTaskRequest {
    /// Replacement proof payload.
    pub proof: Option<TaskProofDto>,
}

/// Request body for `POST /tasks/{id}/quiz`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct QuizSubmitRequest {
    /// Chosen answer index per question, in question order.
    pub answers: Vec<u8>,
}

/// Request body for `POST /tasks/{id}/verify-telegram`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TelegramVerifyRequest {
    /// The user's Telegram account id.
    pub chat_member_id: i64,
}

/// Public task representation.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskDto {
    /// Task id.
    pub id: uuid::Uuid,
    /// Canonical task type name.
    pub task_type: String,
    /// Review state (`pending`, `completed`, `rejected`).
    pub status: String,
    /// Proof from the most recent submission.
    pub proof: TaskProofDto,
    /// First submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Most recent review decision timestamp.
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl From<Task> for TaskDto {
    fn from(task: Task) -> Self {
        Self {
            id: *task.id.as_uuid(),
            task_type: task.task_type.as_str().to_string(),
            status: task.status.as_str().to_string(),
            proof: task.proof.into(),
            submitted_at: task.submitted_at,
            reviewed_at: task.reviewed_at,
        }
    }
}

/// Task list response for `GET /tasks`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskListResponse {
    /// The authenticated user's tasks, oldest submission first.
    pub tasks: Vec<TaskDto>,
}

/// Quiz grading response.
#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResultResponse {
    /// Whether every answer matched the key.
    pub passed: bool,
    /// Number of correct answers.
    pub correct: usize,
    /// Number of questions.
    pub total: usize,
    /// Task snapshot after grading.
    pub task: TaskDto,
}

/// Membership verification response.
#[derive(Debug, Serialize, ToSchema)]
pub struct TelegramVerifyResponse {
    /// Whether membership was confirmed.
    pub verified: bool,
    /// Task snapshot after the check.
    pub task: TaskDto,
}
