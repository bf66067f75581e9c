//! Database row models for the mirror tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A points-history row from the `points_history` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsEntryRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Owning user.
    pub user_id: Uuid,
    /// Signed point delta.
    pub delta: i64,
    /// Event kind string (parsed back through `EventKind::parse`).
    pub kind: String,
    /// Human-readable label.
    pub label: String,
    /// Original event timestamp.
    pub created_at: DateTime<Utc>,
}
