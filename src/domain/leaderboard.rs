//! Leaderboard entry types produced by reconciliation.

use serde::Serialize;
use utoipa::ToSchema;

/// A merchant standing before ranking: either a real merchant pulled from
/// the system of record or a synthetic filler candidate.
#[derive(Debug, Clone)]
pub struct MerchantStanding {
    /// Display name. Case-insensitively unique after reconciliation.
    pub name: String,
    /// Whether this is a real (verified) merchant rather than filler.
    pub verified: bool,
    /// Numeric score used for ranking.
    pub allocation: i64,
    /// Follower count, display-only.
    pub followers: u32,
}

/// A ranked leaderboard entry. Ephemeral reconciler output, recomputed on
/// every refresh; never the system of record.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    /// Dense 1-based rank in allocation order.
    pub rank: u32,
    /// Display name.
    pub name: String,
    /// Whether the entry is a real merchant.
    pub verified: bool,
    /// Ranking score.
    pub allocation: i64,
    /// Follower count.
    pub followers: u32,
}

impl LeaderboardEntry {
    /// Builds the ranked entry from a standing and its dense rank.
    #[must_use]
    pub fn from_standing(rank: u32, standing: MerchantStanding) -> Self {
        Self {
            rank,
            name: standing.name,
            verified: standing.verified,
            allocation: standing.allocation,
            followers: standing.followers,
        }
    }
}
