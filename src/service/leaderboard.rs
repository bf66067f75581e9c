//! Leaderboard reconciliation: merges real merchant standings with
//! synthetic filler and publishes ranked boards on a refresh interval.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tinyrand::{Rand, Seeded, StdRand};
use tinyrand_std::ClockSeed;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::domain::{LeaderboardEntry, MerchantStanding, PointsLog, ReferralBook, UserRegistry};

/// Sort dimension for the merchant leaderboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardSort {
    /// Ranked by derived points total.
    Points,
    /// Ranked by referral count.
    Referrals,
}

impl LeaderboardSort {
    /// Both sort dimensions, refreshed together.
    pub const ALL: [Self; 2] = [Self::Points, Self::Referrals];

    /// Returns the sort as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Referrals => "referrals",
        }
    }
}

/// Supplies real merchant standings for reconciliation.
///
/// The reconciler never fails when a source does: a fetch error degrades
/// to an all-synthetic board.
#[async_trait]
pub trait MerchantSource: Send + Sync + fmt::Debug {
    /// Fetches up to `limit` standings ordered by the sort dimension,
    /// best first.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying store cannot be read.
    async fn fetch_top(
        &self,
        sort: LeaderboardSort,
        limit: usize,
    ) -> anyhow::Result<Vec<MerchantStanding>>;
}

/// [`MerchantSource`] over the in-memory stores: registered users ranked
/// by derived points totals or referral counts.
#[derive(Debug, Clone)]
pub struct RegistryMerchantSource {
    users: Arc<UserRegistry>,
    points: Arc<PointsLog>,
    referrals: Arc<ReferralBook>,
}

impl RegistryMerchantSource {
    /// Creates a source over the given stores.
    #[must_use]
    pub fn new(
        users: Arc<UserRegistry>,
        points: Arc<PointsLog>,
        referrals: Arc<ReferralBook>,
    ) -> Self {
        Self {
            users,
            points,
            referrals,
        }
    }
}

#[async_trait]
impl MerchantSource for RegistryMerchantSource {
    async fn fetch_top(
        &self,
        sort: LeaderboardSort,
        limit: usize,
    ) -> anyhow::Result<Vec<MerchantStanding>> {
        let users = self.users.list().await;
        let totals = self.points.totals().await;

        let mut standings = Vec::with_capacity(users.len());
        for user in users {
            let allocation = match sort {
                LeaderboardSort::Points => totals.get(&user.id).copied().unwrap_or(0),
                LeaderboardSort::Referrals => {
                    i64::try_from(self.referrals.referral_count(user.id).await).unwrap_or(i64::MAX)
                }
            };
            let followers = u32::try_from(self.referrals.referral_count(user.id).await)
                .unwrap_or(u32::MAX)
                .saturating_mul(7);
            standings.push(MerchantStanding {
                name: user.display_name(),
                verified: true,
                allocation,
                followers,
            });
        }

        standings.sort_by(|a, b| b.allocation.cmp(&a.allocation).then(a.name.cmp(&b.name)));
        standings.truncate(limit);
        Ok(standings)
    }
}

/// Name pool for synthetic filler entries.
const NAME_POOL: [&str; 24] = [
    "Andes Trade Co",
    "Baltic Exchange Hub",
    "Caravan Remit",
    "Delta Freight Pay",
    "EastBridge Markets",
    "Fjord Settlements",
    "GoldLeaf Trading",
    "Harbor Line Imports",
    "Iris Global Pay",
    "Jade Route Commerce",
    "Kite Transfer",
    "Lighthouse Remittance",
    "Meridian Exports",
    "Nile Crossing Pay",
    "Orchid Trade House",
    "Pampas Logistics",
    "Quarry Stone Goods",
    "Redwood Wholesale",
    "Savanna Payments",
    "Tidewater Shipping",
    "Umber Textiles",
    "Vela Marine Supply",
    "Willow Crafts Export",
    "Zephyr Freight",
];

/// Merges real merchant standings with synthetic filler and publishes
/// ranked boards.
///
/// Refreshes are non-reentrant: a refresh that starts while another is
/// in flight is skipped. Readers always see the last fully published
/// board, never a partial one.
#[derive(Debug)]
pub struct LeaderboardReconciler {
    source: Arc<dyn MerchantSource>,
    boards: RwLock<HashMap<LeaderboardSort, Vec<LeaderboardEntry>>>,
    last_refreshed_at: RwLock<Option<DateTime<Utc>>>,
    in_flight: AtomicBool,
    target_count: usize,
    real_only: bool,
}

impl LeaderboardReconciler {
    /// Creates a reconciler over the given source.
    ///
    /// `target_count` is the published board size; `real_only` disables
    /// the synthetic filler.
    #[must_use]
    pub fn new(source: Arc<dyn MerchantSource>, target_count: usize, real_only: bool) -> Self {
        Self {
            source,
            boards: RwLock::new(HashMap::new()),
            last_refreshed_at: RwLock::new(None),
            in_flight: AtomicBool::new(false),
            target_count,
            real_only,
        }
    }

    /// Returns the published board for a sort dimension, refreshing first
    /// if nothing has been published yet.
    pub async fn board(&self, sort: LeaderboardSort) -> Vec<LeaderboardEntry> {
        if let Some(board) = self.boards.read().await.get(&sort) {
            return board.clone();
        }
        self.refresh().await;
        self.boards
            .read()
            .await
            .get(&sort)
            .cloned()
            .unwrap_or_default()
    }

    /// When the boards were last published.
    pub async fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        *self.last_refreshed_at.read().await
    }

    /// Rebuilds and publishes both boards. Returns `false` when skipped
    /// because another refresh was already in flight.
    pub async fn refresh(&self) -> bool {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("leaderboard refresh already in flight, skipping");
            return false;
        }

        let mut rng = StdRand::seed(ClockSeed::default().next_u64());
        for sort in LeaderboardSort::ALL {
            let real = match self.source.fetch_top(sort, self.target_count).await {
                Ok(standings) => standings,
                Err(e) => {
                    tracing::warn!(sort = sort.as_str(), error = %e, "merchant source failed, publishing synthetic board");
                    Vec::new()
                }
            };
            let board = reconcile(real, self.target_count, self.real_only, &mut rng);
            self.boards.write().await.insert(sort, board);
        }

        *self.last_refreshed_at.write().await = Some(Utc::now());
        self.in_flight.store(false, Ordering::Release);
        tracing::info!("leaderboard boards published");
        true
    }
}

/// Builds one ranked board from real standings plus synthetic filler.
///
/// Real standings are deduplicated case-insensitively (the higher
/// allocation wins) and clamped to `target_count`; filler tops the board
/// up when allowed. Filler names colliding case-insensitively with a
/// real name are skipped. The result is ordered by allocation descending
/// with name ascending as the tie-break, and carries dense 1-based
/// ranks.
fn reconcile(
    mut real: Vec<MerchantStanding>,
    target_count: usize,
    real_only: bool,
    rng: &mut StdRand,
) -> Vec<LeaderboardEntry> {
    real.sort_by(|a, b| b.allocation.cmp(&a.allocation).then(a.name.cmp(&b.name)));
    let mut standings: Vec<MerchantStanding> = Vec::with_capacity(real.len());
    let mut seen: HashSet<String> = HashSet::new();
    for standing in real {
        if seen.insert(standing.name.to_lowercase()) {
            standings.push(standing);
        }
    }
    standings.truncate(target_count);

    if !real_only && standings.len() < target_count {
        let taken: HashSet<String> = standings.iter().map(|s| s.name.to_lowercase()).collect();
        let missing = target_count - standings.len();
        let base = standings
            .iter()
            .map(|s| s.allocation)
            .max()
            .unwrap_or(0)
            .max(2_500);
        standings.extend(synthesize(missing, base, &taken, rng));
    }

    standings.sort_by(|a, b| b.allocation.cmp(&a.allocation).then(a.name.cmp(&b.name)));

    let mut entries: Vec<LeaderboardEntry> = Vec::with_capacity(standings.len());
    let mut rank = 0_u32;
    let mut previous: Option<i64> = None;
    for standing in standings {
        if previous != Some(standing.allocation) {
            rank += 1;
            previous = Some(standing.allocation);
        }
        entries.push(LeaderboardEntry::from_standing(rank, standing));
    }
    entries
}

/// Generates up to `count` synthetic standings with a decaying allocation
/// curve below `base`, skipping names already taken.
fn synthesize(
    count: usize,
    base: i64,
    taken: &HashSet<String>,
    rng: &mut StdRand,
) -> Vec<MerchantStanding> {
    let pool_len = NAME_POOL.len() as u64;
    let offset = (rng.next_u64() % pool_len) as usize;

    let mut out = Vec::with_capacity(count);
    let mut allocation = base;
    for step in 0..NAME_POOL.len() {
        if out.len() == count {
            break;
        }
        let Some(name) = NAME_POOL.get((offset + step) % NAME_POOL.len()) else {
            break;
        };
        if taken.contains(&name.to_lowercase()) {
            continue;
        }

        allocation = (allocation * 82) / 100 + (rng.next_u64() % 250) as i64;
        let followers = 500 + (rng.next_u64() % 20_000) as u32;
        out.push(MerchantStanding {
            name: (*name).to_string(),
            verified: false,
            allocation,
            followers,
        });
    }
    out
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    fn real(name: &str, allocation: i64) -> MerchantStanding {
        MerchantStanding {
            name: name.to_string(),
            verified: true,
            allocation,
            followers: 10,
        }
    }

    #[test]
    fn reconcile_fills_to_target() {
        let mut rng = StdRand::seed(7);
        let board = reconcile(vec![real("acme", 5_000)], 20, false, &mut rng);

        assert_eq!(board.len(), 20);
        let verified: Vec<_> = board.iter().filter(|e| e.verified).collect();
        assert_eq!(verified.len(), 1);
    }

    #[test]
    fn reconcile_real_only_never_pads() {
        let mut rng = StdRand::seed(7);
        let board = reconcile(vec![real("acme", 5_000), real("bravo", 100)], 20, true, &mut rng);

        assert_eq!(board.len(), 2);
        assert!(board.iter().all(|e| e.verified));
    }

    #[test]
    fn reconcile_orders_by_allocation_then_name() {
        let mut rng = StdRand::seed(7);
        let board = reconcile(
            vec![real("zeta", 100), real("alpha", 100), real("mid", 300)],
            3,
            true,
            &mut rng,
        );

        let names: Vec<&str> = board.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["mid", "alpha", "zeta"]);
    }

    #[test]
    fn ranks_are_dense_and_one_based() {
        let mut rng = StdRand::seed(7);
        let board = reconcile(
            vec![real("a", 300), real("b", 100), real("c", 100), real("d", 50)],
            4,
            true,
            &mut rng,
        );

        let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [1, 2, 2, 3]);
    }

    #[test]
    fn colliding_real_names_keep_the_higher_allocation() {
        let mut rng = StdRand::seed(7);
        let board = reconcile(
            vec![real("Jane", 200), real("jane", 100), real("acme", 400)],
            5,
            true,
            &mut rng,
        );

        assert_eq!(board.len(), 2);
        let unique: HashSet<String> = board.iter().map(|e| e.name.to_lowercase()).collect();
        assert_eq!(unique.len(), board.len());
        let Some(survivor) = board.iter().find(|e| e.name.eq_ignore_ascii_case("jane")) else {
            panic!("deduped name missing entirely");
        };
        assert_eq!(survivor.allocation, 200);
        assert_eq!(survivor.name, "Jane");
    }

    #[test]
    fn filler_skips_colliding_names() {
        let mut rng = StdRand::seed(7);
        let mut taken = HashSet::new();
        for name in NAME_POOL {
            taken.insert(name.to_lowercase());
        }

        let out = synthesize(5, 2_500, &taken, &mut rng);
        assert!(out.is_empty());
    }

    #[test]
    fn filler_allocations_stay_below_base() {
        let mut rng = StdRand::seed(42);
        let out = synthesize(10, 10_000, &HashSet::new(), &mut rng);

        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|s| s.allocation < 10_000));
        assert!(out.iter().all(|s| !s.verified));
        assert!(out.iter().all(|s| s.followers >= 500));
    }

    #[test]
    fn filler_names_are_unique() {
        let mut rng = StdRand::seed(3);
        let out = synthesize(19, 5_000, &HashSet::new(), &mut rng);

        let unique: HashSet<String> = out.iter().map(|s| s.name.to_lowercase()).collect();
        assert_eq!(unique.len(), out.len());
    }

    #[derive(Debug)]
    struct FailingSource;

    #[async_trait]
    impl MerchantSource for FailingSource {
        async fn fetch_top(
            &self,
            _sort: LeaderboardSort,
            _limit: usize,
        ) -> anyhow::Result<Vec<MerchantStanding>> {
            anyhow::bail!("store unavailable")
        }
    }

    #[tokio::test]
    async fn source_failure_degrades_to_synthetic_board() {
        let reconciler = LeaderboardReconciler::new(Arc::new(FailingSource), 10, false);

        assert!(reconciler.refresh().await);
        let board = reconciler.board(LeaderboardSort::Points).await;
        assert_eq!(board.len(), 10);
        assert!(board.iter().all(|e| !e.verified));
        assert!(reconciler.last_refreshed_at().await.is_some());
    }

    #[tokio::test]
    async fn board_refreshes_lazily_on_first_read() {
        let reconciler = LeaderboardReconciler::new(Arc::new(FailingSource), 5, false);

        let board = reconciler.board(LeaderboardSort::Referrals).await;
        assert_eq!(board.len(), 5);
    }

    #[tokio::test]
    async fn registry_source_ranks_by_points() {
        use crate::domain::{EventKind, User};

        let users = Arc::new(UserRegistry::new());
        let points = Arc::new(PointsLog::new());
        let referrals = Arc::new(ReferralBook::new());

        let Ok(low) = User::new("0xaaa".to_string(), Some("low@x.com".to_string()), None) else {
            panic!("valid user");
        };
        let Ok(high) = User::new("0xbbb".to_string(), Some("high@x.com".to_string()), None) else {
            panic!("valid user");
        };
        let (low_id, high_id) = (low.id, high.id);
        let _ = users.insert(low).await;
        let _ = users.insert(high).await;
        points.append(low_id, EventKind::Register, 100, "r").await;
        points.append(high_id, EventKind::Register, 100, "r").await;
        points
            .append(high_id, EventKind::CrossBorderSwap, 200, "swap")
            .await;

        let source = RegistryMerchantSource::new(users, points, referrals);
        let standings = tokio_test::assert_ok!(source.fetch_top(LeaderboardSort::Points, 10).await);

        assert_eq!(standings.len(), 2);
        let Some(first) = standings.first() else {
            panic!("empty standings");
        };
        assert_eq!(first.name, "high");
        assert_eq!(first.allocation, 300);
        assert!(first.verified);
    }
}
