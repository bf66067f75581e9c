//! Task records: per-user, per-type proof submissions under review.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::points::EventKind;
use super::referral::ReferralAction;
use super::user::UserId;
use crate::error::GatewayError;

/// Unique identifier for a task record (UUID v4 newtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(uuid::Uuid);

impl TaskId {
    /// Creates a new random `TaskId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `TaskId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical task type vocabulary.
///
/// Two vocabularies existed across service layers; this enum is the
/// canonical one, and [`TaskType::parse`] maps the richer set onto it:
/// `twitter` → `follow`, `whitepaper`/`custom` → `post`,
/// `telegram` → `verification`. At most one task per (user, type) pair
/// exists at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Social follow (Twitter/X).
    Follow,
    /// Community content: a post, or whitepaper feedback.
    Post,
    /// Product quiz.
    Quiz,
    /// Third-party membership verification (Telegram).
    Verification,
}

impl TaskType {
    /// All canonical task types.
    pub const ALL: [Self; 4] = [Self::Follow, Self::Post, Self::Quiz, Self::Verification];

    /// Returns the canonical name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Post => "post",
            Self::Quiz => "quiz",
            Self::Verification => "verification",
        }
    }

    /// Parses a task type, accepting canonical names and the aliases from
    /// the richer legacy vocabulary (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownTaskType`] for any other string.
    pub fn parse(s: &str) -> Result<Self, GatewayError> {
        match s.to_ascii_lowercase().as_str() {
            "follow" | "twitter" => Ok(Self::Follow),
            "post" | "whitepaper" | "custom" => Ok(Self::Post),
            "quiz" => Ok(Self::Quiz),
            "verification" | "telegram" => Ok(Self::Verification),
            other => Err(GatewayError::UnknownTaskType(other.to_string())),
        }
    }

    /// The points-history event kind appended when a task of this type
    /// completes.
    #[must_use]
    pub const fn event_kind(&self) -> EventKind {
        match self {
            Self::Follow => EventKind::TwitterFollow,
            Self::Post => EventKind::CommunityPost,
            Self::Quiz => EventKind::QuizCompleted,
            Self::Verification => EventKind::TelegramJoin,
        }
    }

    /// Points awarded on completion.
    #[must_use]
    pub const fn points(&self) -> i64 {
        match self {
            Self::Follow => 50,
            Self::Post => 30,
            Self::Quiz => 80,
            Self::Verification => 60,
        }
    }

    /// The referral checklist action this task type advances, if any.
    #[must_use]
    pub const fn referral_action(&self) -> Option<ReferralAction> {
        match self {
            Self::Follow => Some(ReferralAction::TwitterFollow),
            Self::Verification => Some(ReferralAction::TelegramJoin),
            Self::Post => Some(ReferralAction::WhitepaperRead),
            Self::Quiz => None,
        }
    }
}

/// Review state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Submitted, awaiting review or automated verification.
    Pending,
    /// Verified. Terminal; never reverts to pending.
    Completed,
    /// Reviewed and rejected. Resubmitting proof returns it to pending.
    Rejected,
}

impl TaskStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }
}

/// Optional proof payload attached to a submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskProof {
    /// Link to the social post.
    pub post_url: Option<String>,
    /// Link to a screenshot.
    pub screenshot_url: Option<String>,
    /// Free-text proof.
    pub text: Option<String>,
}

impl TaskProof {
    /// Whether any proof field is populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.post_url.is_none() && self.screenshot_url.is_none() && self.text.is_none()
    }
}

/// A per-user, per-type task submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: TaskId,
    /// Owning user.
    pub user_id: UserId,
    /// Canonical task type.
    pub task_type: TaskType,
    /// Review state.
    pub status: TaskStatus,
    /// Proof payload from the most recent submission.
    pub proof: TaskProof,
    /// First submission timestamp.
    pub submitted_at: DateTime<Utc>,
    /// Timestamp of the most recent review decision.
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new pending task.
    #[must_use]
    pub fn new(user_id: UserId, task_type: TaskType, proof: TaskProof) -> Self {
        Self {
            id: TaskId::new(),
            user_id,
            task_type,
            status: TaskStatus::Pending,
            proof,
            submitted_at: Utc::now(),
            reviewed_at: None,
        }
    }

    /// Marks the task completed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyVerified`] when already completed.
    /// Rejected tasks may be verified directly (admin overrule).
    pub fn verify(&mut self) -> Result<(), GatewayError> {
        if self.status == TaskStatus::Completed {
            return Err(GatewayError::AlreadyVerified(*self.id.as_uuid()));
        }
        self.status = TaskStatus::Completed;
        self.reviewed_at = Some(Utc::now());
        Ok(())
    }

    /// Marks the task rejected. Rejecting an already rejected task is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyVerified`] when the task is already
    /// completed; completion never reverts.
    pub fn reject(&mut self) -> Result<(), GatewayError> {
        if self.status == TaskStatus::Completed {
            return Err(GatewayError::AlreadyVerified(*self.id.as_uuid()));
        }
        self.status = TaskStatus::Rejected;
        self.reviewed_at = Some(Utc::now());
        Ok(())
    }

    /// Attaches new proof. A rejected task returns to pending.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyVerified`] when the task is already
    /// completed.
    pub fn resubmit(&mut self, proof: TaskProof) -> Result<(), GatewayError> {
        if self.status == TaskStatus::Completed {
            return Err(GatewayError::AlreadyVerified(*self.id.as_uuid()));
        }
        self.proof = proof;
        self.status = TaskStatus::Pending;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_task(task_type: TaskType) -> Task {
        Task::new(UserId::new(), task_type, TaskProof::default())
    }

    #[test]
    fn new_task_is_pending() {
        let task = make_task(TaskType::Follow);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.reviewed_at.is_none());
        assert!(task.proof.is_empty());
    }

    #[test]
    fn verify_is_terminal() {
        let mut task = make_task(TaskType::Quiz);
        assert!(task.verify().is_ok());
        assert_eq!(task.status, TaskStatus::Completed);

        assert!(matches!(
            task.verify(),
            Err(GatewayError::AlreadyVerified(_))
        ));
        assert!(matches!(
            task.reject(),
            Err(GatewayError::AlreadyVerified(_))
        ));
        assert!(matches!(
            task.resubmit(TaskProof::default()),
            Err(GatewayError::AlreadyVerified(_))
        ));
    }

    #[test]
    fn reject_then_resubmit_returns_to_pending() {
        let mut task = make_task(TaskType::Post);
        assert!(task.reject().is_ok());
        assert_eq!(task.status, TaskStatus::Rejected);

        let proof = TaskProof {
            post_url: Some("https://x.com/post/1".to_string()),
            ..TaskProof::default()
        };
        assert!(task.resubmit(proof).is_ok());
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.proof.post_url.is_some());
    }

    #[test]
    fn rejected_task_can_be_verified_directly() {
        let mut task = make_task(TaskType::Follow);
        assert!(task.reject().is_ok());
        assert!(task.verify().is_ok());
        assert_eq!(task.status, TaskStatus::Completed);
    }

    #[test]
    fn parse_maps_both_vocabularies() {
        assert!(matches!(TaskType::parse("follow"), Ok(TaskType::Follow)));
        assert!(matches!(TaskType::parse("TWITTER"), Ok(TaskType::Follow)));
        assert!(matches!(
            TaskType::parse("telegram"),
            Ok(TaskType::Verification)
        ));
        assert!(matches!(TaskType::parse("whitepaper"), Ok(TaskType::Post)));
        assert!(matches!(TaskType::parse("custom"), Ok(TaskType::Post)));
        assert!(matches!(TaskType::parse("quiz"), Ok(TaskType::Quiz)));
        assert!(TaskType::parse("tiktok").is_err());
    }

    #[test]
    fn quiz_does_not_advance_referral_checklist() {
        assert!(TaskType::Quiz.referral_action().is_none());
        assert!(TaskType::Follow.referral_action().is_some());
    }
}
