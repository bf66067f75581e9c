//! Task verification orchestration: submission, review, quiz grading,
//! and third-party membership checks.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{PointsLog, Task, TaskId, TaskProof, TaskStatus, TaskStore, TaskType, UserId};
use crate::error::GatewayError;
use crate::persistence::PostgresPersistence;
use crate::service::ReferralService;

/// Checks whether a chat member id belongs to the product channel.
///
/// Implemented against the Telegram Bot API in production and stubbed in
/// tests.
#[async_trait]
pub trait MembershipVerifier: Send + Sync + fmt::Debug {
    /// Returns `true` when the member id is currently in the channel.
    ///
    /// # Errors
    ///
    /// Returns an error when the upstream check cannot be performed.
    async fn is_member(&self, chat_member_id: i64) -> anyhow::Result<bool>;
}

/// Result of grading a quiz submission.
#[derive(Debug, Clone)]
pub struct QuizOutcome {
    /// Task snapshot after grading.
    pub task: Task,
    /// Whether every answer matched the key.
    pub passed: bool,
    /// Number of correct answers.
    pub correct: usize,
    /// Number of questions in the key.
    pub total: usize,
}

/// Result of a membership verification attempt.
#[derive(Debug, Clone)]
pub struct MembershipOutcome {
    /// Task snapshot after the check.
    pub task: Task,
    /// Whether membership was confirmed and the task completed.
    pub verified: bool,
}

/// Orchestration layer for the task verification store.
///
/// Completion is the single money moment: exactly one points entry is
/// appended per completed task, and the matching referral checklist
/// action advances without a second award.
#[derive(Debug, Clone)]
pub struct TaskService {
    tasks: Arc<TaskStore>,
    points: Arc<PointsLog>,
    referrals: ReferralService,
    verifier: Arc<dyn MembershipVerifier>,
    quiz_answer_key: Vec<u8>,
    mirror: Option<PostgresPersistence>,
}

impl TaskService {
    /// Creates a new `TaskService`.
    #[must_use]
    pub fn new(
        tasks: Arc<TaskStore>,
        points: Arc<PointsLog>,
        referrals: ReferralService,
        verifier: Arc<dyn MembershipVerifier>,
        quiz_answer_key: Vec<u8>,
        mirror: Option<PostgresPersistence>,
    ) -> Self {
        Self {
            tasks,
            points,
            referrals,
            verifier,
            quiz_answer_key,
            mirror,
        }
    }

    /// Submits a new task of the given type.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateTask`] when the user already has a
    /// task of this type; nothing is created.
    pub async fn submit(
        &self,
        user_id: UserId,
        task_type: TaskType,
        proof: TaskProof,
    ) -> Result<Task, GatewayError> {
        let task = Task::new(user_id, task_type, proof);
        let snapshot = task.clone();
        self.tasks.insert(task).await?;

        self.mirror_task(&snapshot).await;
        tracing::info!(task_id = %snapshot.id, %user_id, task_type = task_type.as_str(), "task submitted");
        Ok(snapshot)
    }

    /// Replaces the proof on an existing task. A rejected task returns to
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TaskNotFound`] for unknown ids and
    /// [`GatewayError::AlreadyVerified`] when already completed.
    pub async fn resubmit(&self, task_id: TaskId, proof: TaskProof) -> Result<Task, GatewayError> {
        let entry = self.tasks.get(task_id).await?;
        let mut task = entry.write().await;
        task.resubmit(proof)?;
        let snapshot = task.clone();
        drop(task);

        self.mirror_task(&snapshot).await;
        tracing::info!(%task_id, "task proof resubmitted");
        Ok(snapshot)
    }

    /// Marks a task verified, awards its points, and advances the
    /// matching referral checklist action.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TaskNotFound`] for unknown ids and
    /// [`GatewayError::AlreadyVerified`] when already completed, so the
    /// award can never double-apply.
    pub async fn verify(&self, task_id: TaskId) -> Result<Task, GatewayError> {
        let entry = self.tasks.get(task_id).await?;
        let mut task = entry.write().await;
        task.verify()?;
        let snapshot = task.clone();
        drop(task);

        self.settle_completion(&snapshot).await;
        Ok(snapshot)
    }

    /// Marks a task rejected. The proof stays attached so the user can
    /// resubmit.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TaskNotFound`] for unknown ids and
    /// [`GatewayError::AlreadyVerified`] when already completed.
    pub async fn reject(&self, task_id: TaskId) -> Result<Task, GatewayError> {
        let entry = self.tasks.get(task_id).await?;
        let mut task = entry.write().await;
        task.reject()?;
        let snapshot = task.clone();
        drop(task);

        self.mirror_task(&snapshot).await;
        tracing::info!(%task_id, "task rejected");
        Ok(snapshot)
    }

    /// Grades a quiz submission against the configured answer key. A
    /// perfect score completes the quiz task; anything less leaves it
    /// pending for another attempt.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TaskNotFound`] for unknown ids,
    /// [`GatewayError::InvalidRequest`] when the task is not a quiz, and
    /// [`GatewayError::AlreadyVerified`] for an already passed quiz.
    pub async fn submit_quiz(
        &self,
        task_id: TaskId,
        answers: &[u8],
    ) -> Result<QuizOutcome, GatewayError> {
        let entry = self.tasks.get(task_id).await?;
        let mut task = entry.write().await;
        if task.task_type != TaskType::Quiz {
            return Err(GatewayError::InvalidRequest(format!(
                "task {task_id} is not a quiz"
            )));
        }
        if task.status == TaskStatus::Completed {
            return Err(GatewayError::AlreadyVerified(*task_id.as_uuid()));
        }

        let total = self.quiz_answer_key.len();
        let correct = self
            .quiz_answer_key
            .iter()
            .zip(answers.iter())
            .filter(|(expected, given)| expected == given)
            .count();
        let passed = answers.len() == total && correct == total;

        if passed {
            task.verify()?;
        } else {
            task.status = TaskStatus::Pending;
        }
        let snapshot = task.clone();
        drop(task);

        if passed {
            self.settle_completion(&snapshot).await;
        } else {
            tracing::info!(%task_id, correct, total, "quiz attempt failed");
            self.mirror_task(&snapshot).await;
        }
        Ok(QuizOutcome {
            task: snapshot,
            passed,
            correct,
            total,
        })
    }

    /// Checks channel membership through the configured verifier and
    /// completes the verification task when confirmed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TaskNotFound`] for unknown ids,
    /// [`GatewayError::InvalidRequest`] when the task is not a
    /// verification task, [`GatewayError::AlreadyVerified`] when already
    /// completed, and [`GatewayError::Internal`] when the upstream check
    /// fails.
    pub async fn verify_membership(
        &self,
        task_id: TaskId,
        chat_member_id: i64,
    ) -> Result<MembershipOutcome, GatewayError> {
        let entry = self.tasks.get(task_id).await?;
        {
            let task = entry.read().await;
            if task.task_type != TaskType::Verification {
                return Err(GatewayError::InvalidRequest(format!(
                    "task {task_id} is not a membership verification"
                )));
            }
            if task.status == TaskStatus::Completed {
                return Err(GatewayError::AlreadyVerified(*task_id.as_uuid()));
            }
        }

        let member = self
            .verifier
            .is_member(chat_member_id)
            .await
            .map_err(|e| GatewayError::Internal(format!("membership check failed: {e}")))?;

        if !member {
            let snapshot = entry.read().await.clone();
            tracing::info!(%task_id, chat_member_id, "membership not confirmed");
            return Ok(MembershipOutcome {
                task: snapshot,
                verified: false,
            });
        }

        let mut task = entry.write().await;
        task.verify()?;
        let snapshot = task.clone();
        drop(task);

        self.settle_completion(&snapshot).await;
        Ok(MembershipOutcome {
            task: snapshot,
            verified: true,
        })
    }

    /// Returns a snapshot of a task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TaskNotFound`] for unknown ids.
    pub async fn get(&self, task_id: TaskId) -> Result<Task, GatewayError> {
        let entry = self.tasks.get(task_id).await?;
        let task = entry.read().await.clone();
        Ok(task)
    }

    /// All tasks owned by a user, oldest submission first.
    pub async fn list_for_user(&self, user_id: UserId) -> Vec<Task> {
        self.tasks.list_by_user(user_id).await
    }

    /// Post-completion side effects: the single points award, the referral
    /// checklist bridge, and the mirror write.
    async fn settle_completion(&self, task: &Task) {
        let entry = self
            .points
            .append(
                task.user_id,
                task.task_type.event_kind(),
                task.task_type.points(),
                task_label(task.task_type),
            )
            .await;
        self.mirror_points(&entry).await;

        // The checklist bridge never awards again; the entry above is the
        // only one for this completion.
        if let Some(action) = task.task_type.referral_action() {
            self.referrals.note_action_for_user(task.user_id, action).await;
        }

        self.mirror_task(task).await;
        tracing::info!(task_id = %task.id, task_type = task.task_type.as_str(), "task verified");
    }

    async fn mirror_task(&self, task: &Task) {
        if let Some(db) = &self.mirror
            && let Err(e) = db.upsert_task(task).await
        {
            tracing::warn!(task_id = %task.id, error = %e, "task mirror write failed");
        }
    }

    async fn mirror_points(&self, entry: &crate::domain::PointsEntry) {
        if let Some(db) = &self.mirror
            && let Err(e) = db.append_points_entry(entry).await
        {
            tracing::warn!(user_id = %entry.user_id, error = %e, "points mirror write failed");
        }
    }
}

/// Human-readable label for a task's points entry.
const fn task_label(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::Follow => "Followed on X",
        TaskType::Post => "Published a community post",
        TaskType::Quiz => "Passed the product quiz",
        TaskType::Verification => "Joined the Telegram channel",
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{ReferralBook, RewardTable};

    #[derive(Debug)]
    struct StaticVerifier(bool);

    #[async_trait]
    impl MembershipVerifier for StaticVerifier {
        async fn is_member(&self, _chat_member_id: i64) -> anyhow::Result<bool> {
            Ok(self.0)
        }
    }

    #[derive(Debug)]
    struct FailingVerifier;

    #[async_trait]
    impl MembershipVerifier for FailingVerifier {
        async fn is_member(&self, _chat_member_id: i64) -> anyhow::Result<bool> {
            anyhow::bail!("upstream unavailable")
        }
    }

    fn make_service(verifier: Arc<dyn MembershipVerifier>) -> (TaskService, Arc<PointsLog>) {
        let points = Arc::new(PointsLog::new());
        let referrals = ReferralService::new(
            Arc::new(ReferralBook::new()),
            Arc::clone(&points),
            RewardTable::default(),
            None,
        );
        let service = TaskService::new(
            Arc::new(TaskStore::new()),
            Arc::clone(&points),
            referrals,
            verifier,
            vec![1, 3, 0, 2],
            None,
        );
        (service, points)
    }

    #[tokio::test]
    async fn verify_awards_points_once() {
        let (service, points) = make_service(Arc::new(StaticVerifier(true)));
        let user = UserId::new();
        let Ok(task) = service
            .submit(user, TaskType::Follow, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };

        let verified = service.verify(task.id).await;
        assert!(verified.is_ok());
        assert_eq!(points.total(user).await, 50);

        let again = service.verify(task.id).await;
        assert!(matches!(again, Err(GatewayError::AlreadyVerified(_))));
        assert_eq!(points.total(user).await, 50);
    }

    #[tokio::test]
    async fn second_submission_of_same_type_conflicts() {
        let (service, _) = make_service(Arc::new(StaticVerifier(true)));
        let user = UserId::new();
        let first = service
            .submit(user, TaskType::Follow, TaskProof::default())
            .await;
        assert!(first.is_ok());

        let second = service
            .submit(user, TaskType::Follow, TaskProof::default())
            .await;
        assert!(matches!(second, Err(GatewayError::DuplicateTask(_))));
        assert_eq!(service.list_for_user(user).await.len(), 1);
    }

    #[tokio::test]
    async fn reject_then_resubmit_then_verify() {
        let (service, points) = make_service(Arc::new(StaticVerifier(true)));
        let user = UserId::new();
        let Ok(task) = service
            .submit(user, TaskType::Post, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };

        let Ok(rejected) = service.reject(task.id).await else {
            panic!("reject failed");
        };
        assert_eq!(rejected.status, TaskStatus::Rejected);
        assert_eq!(points.total(user).await, 0);

        let Ok(resubmitted) = service.resubmit(task.id, TaskProof::default()).await else {
            panic!("resubmit failed");
        };
        assert_eq!(resubmitted.id, task.id);
        assert_eq!(resubmitted.status, TaskStatus::Pending);

        let verified = service.verify(task.id).await;
        assert!(verified.is_ok());
        assert_eq!(points.total(user).await, 30);
    }

    #[tokio::test]
    async fn perfect_quiz_completes_and_awards() {
        let (service, points) = make_service(Arc::new(StaticVerifier(true)));
        let user = UserId::new();
        let Ok(task) = service
            .submit(user, TaskType::Quiz, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };

        let Ok(outcome) = service.submit_quiz(task.id, &[1, 3, 0, 2]).await else {
            panic!("quiz failed");
        };
        assert!(outcome.passed);
        assert_eq!(outcome.correct, 4);
        assert_eq!(outcome.task.status, TaskStatus::Completed);
        assert_eq!(points.total(user).await, 80);
    }

    #[tokio::test]
    async fn imperfect_quiz_stays_pending_and_can_retry() {
        let (service, points) = make_service(Arc::new(StaticVerifier(true)));
        let user = UserId::new();
        let Ok(task) = service
            .submit(user, TaskType::Quiz, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };

        let Ok(outcome) = service.submit_quiz(task.id, &[1, 3, 0, 0]).await else {
            panic!("quiz failed");
        };
        assert!(!outcome.passed);
        assert_eq!(outcome.correct, 3);
        assert_eq!(outcome.task.status, TaskStatus::Pending);
        assert_eq!(points.total(user).await, 0);

        let Ok(retry) = service.submit_quiz(task.id, &[1, 3, 0, 2]).await else {
            panic!("retry failed");
        };
        assert!(retry.passed);
        assert_eq!(points.total(user).await, 80);
    }

    #[tokio::test]
    async fn passed_quiz_rejects_further_attempts() {
        let (service, _) = make_service(Arc::new(StaticVerifier(true)));
        let user = UserId::new();
        let Ok(task) = service
            .submit(user, TaskType::Quiz, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };
        let _ = service.submit_quiz(task.id, &[1, 3, 0, 2]).await;

        let again = service.submit_quiz(task.id, &[1, 3, 0, 2]).await;
        assert!(matches!(again, Err(GatewayError::AlreadyVerified(_))));
    }

    #[tokio::test]
    async fn quiz_rejects_non_quiz_task() {
        let (service, _) = make_service(Arc::new(StaticVerifier(true)));
        let Ok(task) = service
            .submit(UserId::new(), TaskType::Follow, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };
        let result = service.submit_quiz(task.id, &[1, 3, 0, 2]).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn confirmed_membership_completes_task() {
        let (service, points) = make_service(Arc::new(StaticVerifier(true)));
        let user = UserId::new();
        let Ok(task) = service
            .submit(user, TaskType::Verification, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };

        let Ok(outcome) = service.verify_membership(task.id, 42).await else {
            panic!("membership check failed");
        };
        assert!(outcome.verified);
        assert_eq!(outcome.task.status, TaskStatus::Completed);
        assert_eq!(points.total(user).await, 60);
    }

    #[tokio::test]
    async fn unconfirmed_membership_leaves_task_pending() {
        let (service, points) = make_service(Arc::new(StaticVerifier(false)));
        let user = UserId::new();
        let Ok(task) = service
            .submit(user, TaskType::Verification, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };

        let Ok(outcome) = service.verify_membership(task.id, 42).await else {
            panic!("membership check failed");
        };
        assert!(!outcome.verified);
        assert_eq!(outcome.task.status, TaskStatus::Pending);
        assert_eq!(points.total(user).await, 0);
    }

    #[tokio::test]
    async fn verifier_failure_surfaces_as_internal() {
        let (service, _) = make_service(Arc::new(FailingVerifier));
        let Ok(task) = service
            .submit(UserId::new(), TaskType::Verification, TaskProof::default())
            .await
        else {
            panic!("submit failed");
        };
        let result = service.verify_membership(task.id, 42).await;
        assert!(matches!(result, Err(GatewayError::Internal(_))));
    }
}
