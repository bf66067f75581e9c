//! PostgreSQL implementation of the persistence mirror.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::PointsEntryRow;
use crate::domain::{PointsEntry, Referral, Task, User, UserId};
use crate::error::GatewayError;

/// PostgreSQL-backed persistence layer using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    /// Creates a new persistence layer with the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts a user row keyed by id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn upsert_user(&self, user: &User) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO users (id, wallet_address, email, phone, referral_code, status, created_at, last_login_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET status = $6, last_login_at = $8",
        )
        .bind(user.id.as_uuid())
        .bind(&user.wallet_address)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.referral_code)
        .bind(user.status.as_str())
        .bind(user.created_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Upserts a referral row keyed by id, storing the completed action
    /// names as a comma-separated list.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn upsert_referral(&self, referral: &Referral) -> Result<(), GatewayError> {
        let completed: Vec<&str> = referral
            .actions
            .iter()
            .filter(|slot| slot.completed)
            .map(|slot| slot.action.as_str())
            .collect();

        sqlx::query(
            "INSERT INTO referrals (id, referrer_id, referred_user_id, code, reward_status, reward_amount, actions_completed, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (id) DO UPDATE SET reward_status = $5, reward_amount = $6, actions_completed = $7",
        )
        .bind(referral.id.as_uuid())
        .bind(referral.referrer_id.as_uuid())
        .bind(referral.referred_user_id.as_uuid())
        .bind(&referral.code)
        .bind(referral.reward_status.as_str())
        .bind(referral.reward_amount)
        .bind(completed.join(","))
        .bind(referral.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Upserts a task row keyed by id.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn upsert_task(&self, task: &Task) -> Result<(), GatewayError> {
        sqlx::query(
            "INSERT INTO tasks (id, user_id, task_type, status, submitted_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET status = $4",
        )
        .bind(task.id.as_uuid())
        .bind(task.user_id.as_uuid())
        .bind(task.task_type.as_str())
        .bind(task.status.as_str())
        .bind(task.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(())
    }

    /// Appends a points-history row.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn append_points_entry(&self, entry: &PointsEntry) -> Result<i64, GatewayError> {
        let row = sqlx::query_scalar::<_, i64>(
            "INSERT INTO points_history (user_id, delta, kind, label, created_at) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(entry.user_id.as_uuid())
        .bind(entry.delta)
        .bind(entry.kind.as_str())
        .bind(&entry.label)
        .bind(entry.timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(row)
    }

    /// Loads the full points history, oldest first. Used at startup to
    /// replay the log into the in-memory accumulator.
    ///
    /// # Errors
    ///
    /// Returns a [`GatewayError::PersistenceError`] on database failure.
    pub async fn load_points_history(&self) -> Result<Vec<PointsEntryRow>, GatewayError> {
        let rows = sqlx::query_as::<_, (i64, Uuid, i64, String, String, DateTime<Utc>)>(
            "SELECT id, user_id, delta, kind, label, created_at \
             FROM points_history ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GatewayError::PersistenceError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(id, user_id, delta, kind, label, created_at)| PointsEntryRow {
                id,
                user_id,
                delta,
                kind,
                label,
                created_at,
            })
            .collect())
    }

    /// Converts a stored row back into a domain entry, validating the kind
    /// string through the recognized-kind check.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownEventKind`] for rows written by a
    /// newer (or corrupted) schema.
    pub fn row_to_entry(row: &PointsEntryRow) -> Result<PointsEntry, GatewayError> {
        let kind = crate::domain::EventKind::parse(&row.kind)?;
        Ok(PointsEntry {
            user_id: UserId::from_uuid(row.user_id),
            delta: row.delta,
            kind,
            label: row.label.clone(),
            timestamp: row.created_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn row_to_entry_parses_known_kind() {
        let row = PointsEntryRow {
            id: 1,
            user_id: Uuid::new_v4(),
            delta: 100,
            kind: "REGISTER".to_string(),
            label: "Registered".to_string(),
            created_at: Utc::now(),
        };
        let entry = PostgresPersistence::row_to_entry(&row);
        let Ok(entry) = entry else {
            panic!("expected valid entry");
        };
        assert_eq!(entry.delta, 100);
    }

    #[test]
    fn row_to_entry_rejects_unknown_kind() {
        let row = PointsEntryRow {
            id: 1,
            user_id: Uuid::new_v4(),
            delta: 100,
            kind: "MYSTERY".to_string(),
            label: "???".to_string(),
            created_at: Utc::now(),
        };
        let entry = PostgresPersistence::row_to_entry(&row);
        assert!(matches!(entry, Err(GatewayError::UnknownEventKind(_))));
    }
}
