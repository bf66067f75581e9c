//! Concurrent task storage with the (user, type) uniqueness invariant.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::task::{Task, TaskId, TaskType};
use super::user::UserId;
use crate::error::GatewayError;

/// Central store for all task submissions.
///
/// Same shape as the other registries: outer `RwLock<HashMap>` with
/// per-record `Arc<RwLock<Task>>` entries. The `by_user_type` index
/// rejects duplicate submissions for the same (user, type) pair.
#[derive(Debug)]
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, Arc<RwLock<Task>>>>,
    by_user_type: RwLock<HashMap<(UserId, TaskType), TaskId>>,
}

impl TaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
            by_user_type: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new task.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateTask`] if a task of this type
    /// already exists for the user; no second record is created.
    pub async fn insert(&self, task: Task) -> Result<TaskId, GatewayError> {
        let key = (task.user_id, task.task_type);
        let mut index = self.by_user_type.write().await;
        if index.contains_key(&key) {
            return Err(GatewayError::DuplicateTask(
                task.task_type.as_str().to_string(),
            ));
        }

        let id = task.id;
        index.insert(key, id);
        self.tasks
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(task)));
        Ok(id)
    }

    /// Returns a shared reference to a task behind its per-record lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TaskNotFound`] for unknown ids.
    pub async fn get(&self, id: TaskId) -> Result<Arc<RwLock<Task>>, GatewayError> {
        let map = self.tasks.read().await;
        map.get(&id)
            .cloned()
            .ok_or(GatewayError::TaskNotFound(*id.as_uuid()))
    }

    /// Finds a user's task of the given type.
    pub async fn find_by_user_type(
        &self,
        user_id: UserId,
        task_type: TaskType,
    ) -> Option<Arc<RwLock<Task>>> {
        let id = *self.by_user_type.read().await.get(&(user_id, task_type))?;
        self.tasks.read().await.get(&id).cloned()
    }

    /// Returns snapshots of all tasks owned by a user.
    pub async fn list_by_user(&self, user_id: UserId) -> Vec<Task> {
        let map = self.tasks.read().await;
        let mut out = Vec::new();
        for entry in map.values() {
            let task = entry.read().await;
            if task.user_id == user_id {
                out.push(task.clone());
            }
        }
        out.sort_by_key(|task| task.submitted_at);
        out
    }

    /// Returns the number of stored tasks.
    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Returns `true` if the store contains no tasks.
    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::task::TaskProof;

    #[tokio::test]
    async fn insert_and_get() {
        let store = TaskStore::new();
        let task = Task::new(UserId::new(), TaskType::Follow, TaskProof::default());
        let id = task.id;

        assert!(store.insert(task).await.is_ok());
        assert!(store.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn duplicate_type_for_same_user_rejected() {
        let store = TaskStore::new();
        let user = UserId::new();

        let first = Task::new(user, TaskType::Follow, TaskProof::default());
        assert!(store.insert(first).await.is_ok());

        let second = Task::new(user, TaskType::Follow, TaskProof::default());
        let result = store.insert(second).await;
        assert!(matches!(result, Err(GatewayError::DuplicateTask(_))));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn same_type_for_different_users_allowed() {
        let store = TaskStore::new();
        let first = Task::new(UserId::new(), TaskType::Follow, TaskProof::default());
        let second = Task::new(UserId::new(), TaskType::Follow, TaskProof::default());

        assert!(store.insert(first).await.is_ok());
        assert!(store.insert(second).await.is_ok());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn list_by_user_returns_only_owned() {
        let store = TaskStore::new();
        let user = UserId::new();

        let _ = store
            .insert(Task::new(user, TaskType::Follow, TaskProof::default()))
            .await;
        let _ = store
            .insert(Task::new(user, TaskType::Quiz, TaskProof::default()))
            .await;
        let _ = store
            .insert(Task::new(
                UserId::new(),
                TaskType::Follow,
                TaskProof::default(),
            ))
            .await;

        assert_eq!(store.list_by_user(user).await.len(), 2);
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let store = TaskStore::new();
        let result = store.get(TaskId::new()).await;
        assert!(matches!(result, Err(GatewayError::TaskNotFound(_))));
    }
}
