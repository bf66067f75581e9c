//! Service layer: business logic orchestration.
//!
//! Services coordinate the domain stores, append points-history entries
//! as side effects, and mirror every mutation to PostgreSQL best-effort.
//! [`LeaderboardReconciler`] additionally runs on a recurring interval.

pub mod leaderboard;
pub mod referral_service;
pub mod task_service;
pub mod user_service;

pub use leaderboard::{
    LeaderboardReconciler, LeaderboardSort, MerchantSource, RegistryMerchantSource,
};
pub use referral_service::ReferralService;
pub use task_service::{MembershipOutcome, MembershipVerifier, QuizOutcome, TaskService};
pub use user_service::{LoginOutcome, UserService};
