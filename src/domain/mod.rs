//! Domain layer: core records and concurrent stores.
//!
//! This module contains the server-side domain model: user identity and
//! the user registry, the referral ledger with its fixed action checklist,
//! the per-user task store, the append-only points log, and the
//! leaderboard entry types produced by reconciliation.

pub mod leaderboard;
pub mod points;
pub mod referral;
pub mod referral_book;
pub mod task;
pub mod task_store;
pub mod user;
pub mod user_registry;

pub use leaderboard::{LeaderboardEntry, MerchantStanding};
pub use points::{EventKind, PointsEntry, PointsLog};
pub use referral::{ActionOutcome, Referral, ReferralAction, ReferralId, RewardStatus, RewardTable};
pub use referral_book::ReferralBook;
pub use task::{Task, TaskId, TaskProof, TaskStatus, TaskType};
pub use task_store::TaskStore;
pub use user::{User, UserId, UserStatus};
pub use user_registry::UserRegistry;
