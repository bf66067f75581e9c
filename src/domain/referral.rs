//! Referral records: the fixed action checklist and reward settlement.
//!
//! A [`Referral`] links a referring user to a newly registered user and
//! tracks a fixed, ordered checklist of bonus-qualifying actions. REGISTER
//! is always completed at creation; the reward status moves from pending
//! to a terminal state exactly once.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::points::EventKind;
use super::user::UserId;
use crate::error::GatewayError;

/// Unique identifier for a referral record (UUID v4 newtype).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralId(uuid::Uuid);

impl ReferralId {
    /// Creates a new random `ReferralId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `ReferralId` from an existing [`uuid::Uuid`].
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

impl Default for ReferralId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReferralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of bonus-qualifying referral actions.
///
/// Every referral record carries exactly one checklist slot per action;
/// there are no duplicate entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferralAction {
    /// Account registration. Completed at referral creation.
    Register,
    /// Followed the product account on Twitter/X.
    TwitterFollow,
    /// Joined the announcement channel on Telegram.
    TelegramJoin,
    /// Read the whitepaper.
    WhitepaperRead,
    /// Performed a cross-border swap through the product.
    CrossBorderSwap,
}

impl ReferralAction {
    /// All actions, in checklist order.
    pub const ALL: [Self; 5] = [
        Self::Register,
        Self::TwitterFollow,
        Self::TelegramJoin,
        Self::WhitepaperRead,
        Self::CrossBorderSwap,
    ];

    /// Returns the action name as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "REGISTER",
            Self::TwitterFollow => "TWITTER_FOLLOW",
            Self::TelegramJoin => "TELEGRAM_JOIN",
            Self::WhitepaperRead => "WHITEPAPER_READ",
            Self::CrossBorderSwap => "CROSS_BORDER_SWAP",
        }
    }

    /// Parses an action name, accepting the legacy `FOLLOW_TWITTER` /
    /// `JOIN_TELEGRAM` spellings alongside the canonical ones.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownAction`] for any other string.
    pub fn parse(s: &str) -> Result<Self, GatewayError> {
        match s {
            "REGISTER" => Ok(Self::Register),
            "TWITTER_FOLLOW" | "FOLLOW_TWITTER" => Ok(Self::TwitterFollow),
            "TELEGRAM_JOIN" | "JOIN_TELEGRAM" => Ok(Self::TelegramJoin),
            "WHITEPAPER_READ" => Ok(Self::WhitepaperRead),
            "CROSS_BORDER_SWAP" => Ok(Self::CrossBorderSwap),
            other => Err(GatewayError::UnknownAction(other.to_string())),
        }
    }

    /// The points-history event kind appended when this action completes.
    #[must_use]
    pub const fn event_kind(&self) -> EventKind {
        match self {
            Self::Register => EventKind::Register,
            Self::TwitterFollow => EventKind::TwitterFollow,
            Self::TelegramJoin => EventKind::TelegramJoin,
            Self::WhitepaperRead => EventKind::WhitepaperRead,
            Self::CrossBorderSwap => EventKind::CrossBorderSwap,
        }
    }
}

/// One checklist slot within a referral record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionProgress {
    /// Which action this slot tracks.
    pub action: ReferralAction,
    /// Whether the referred user has completed it.
    pub completed: bool,
    /// Completion timestamp, set exactly once.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Settlement status of the referral reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardStatus {
    /// Qualifying actions are still outstanding.
    Pending,
    /// Reward has been credited. Terminal.
    Credited,
    /// Reward was determined unreachable. Terminal.
    Failed,
}

impl RewardStatus {
    /// Returns `true` for the terminal states (`Credited`, `Failed`).
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Credited | Self::Failed)
    }

    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Credited => "credited",
            Self::Failed => "failed",
        }
    }
}

/// Result of attempting to complete a checklist action.
///
/// Repeat completions are a no-op success, not an error: callers use the
/// distinction to avoid double-applying side effects such as points
/// entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action transitioned from incomplete to complete.
    Completed,
    /// The action was already complete; state is unchanged.
    AlreadyComplete,
}

/// Point values for referral actions and settlement bonuses.
#[derive(Debug, Clone)]
pub struct RewardTable {
    /// Points for account registration.
    pub register: i64,
    /// Points for following on Twitter/X.
    pub twitter_follow: i64,
    /// Points for joining the Telegram channel.
    pub telegram_join: i64,
    /// Points for reading the whitepaper.
    pub whitepaper_read: i64,
    /// Points for a first cross-border swap.
    pub cross_border_swap: i64,
    /// Bonus credited to the referrer once the checklist completes.
    pub referral_bonus_earned: i64,
    /// Bonus credited to the referred user once the checklist completes.
    pub referral_bonus_received: i64,
}

impl RewardTable {
    /// Points awarded for completing a single checklist action.
    #[must_use]
    pub const fn action_points(&self, action: ReferralAction) -> i64 {
        match action {
            ReferralAction::Register => self.register,
            ReferralAction::TwitterFollow => self.twitter_follow,
            ReferralAction::TelegramJoin => self.telegram_join,
            ReferralAction::WhitepaperRead => self.whitepaper_read,
            ReferralAction::CrossBorderSwap => self.cross_border_swap,
        }
    }
}

impl Default for RewardTable {
    fn default() -> Self {
        Self {
            register: 100,
            twitter_follow: 50,
            telegram_join: 50,
            whitepaper_read: 75,
            cross_border_swap: 200,
            referral_bonus_earned: 250,
            referral_bonus_received: 100,
        }
    }
}

/// A referral record: referrer, referred user, and the action checklist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    /// Unique referral identifier.
    pub id: ReferralId,
    /// The user whose code was used.
    pub referrer_id: UserId,
    /// The newly registered user. Unique across all referrals.
    pub referred_user_id: UserId,
    /// The referral code that was entered at signup.
    pub code: String,
    /// Fixed checklist, one slot per [`ReferralAction`], in order.
    pub actions: Vec<ActionProgress>,
    /// Settlement status of the reward.
    pub reward_status: RewardStatus,
    /// Reward amount, set when the reward is credited.
    pub reward_amount: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Referral {
    /// Creates a new referral with REGISTER pre-completed and every other
    /// action pending.
    #[must_use]
    pub fn new(referrer_id: UserId, referred_user_id: UserId, code: String) -> Self {
        let now = Utc::now();
        let actions = ReferralAction::ALL
            .iter()
            .map(|&action| ActionProgress {
                action,
                completed: action == ReferralAction::Register,
                completed_at: (action == ReferralAction::Register).then_some(now),
            })
            .collect();
        Self {
            id: ReferralId::new(),
            referrer_id,
            referred_user_id,
            code,
            actions,
            reward_status: RewardStatus::Pending,
            reward_amount: 0,
            created_at: now,
        }
    }

    /// Returns the checklist slot for an action.
    #[must_use]
    pub fn action(&self, action: ReferralAction) -> Option<&ActionProgress> {
        self.actions.iter().find(|slot| slot.action == action)
    }

    /// Marks an action complete, stamping the completion time.
    ///
    /// Idempotent: a repeat call returns
    /// [`ActionOutcome::AlreadyComplete`] and leaves the record unchanged.
    pub fn complete_action(&mut self, action: ReferralAction) -> ActionOutcome {
        let Some(slot) = self.actions.iter_mut().find(|slot| slot.action == action) else {
            // The checklist always contains every variant; treat a missing
            // slot as already handled rather than growing the list.
            return ActionOutcome::AlreadyComplete;
        };
        if slot.completed {
            return ActionOutcome::AlreadyComplete;
        }
        slot.completed = true;
        slot.completed_at = Some(Utc::now());
        ActionOutcome::Completed
    }

    /// Whether every required action is complete. The required subset is
    /// the full checklist.
    #[must_use]
    pub fn all_required_complete(&self) -> bool {
        self.actions.iter().all(|slot| slot.completed)
    }

    /// Credits the reward if all required actions are complete and the
    /// status is still pending. Terminal statuses are never changed.
    ///
    /// Returns `true` when the status transitioned to credited.
    pub fn settle(&mut self, reward_amount: i64) -> bool {
        if self.reward_status.is_terminal() {
            return false;
        }
        if !self.all_required_complete() {
            return false;
        }
        self.reward_status = RewardStatus::Credited;
        self.reward_amount = reward_amount;
        true
    }

    /// Marks the reward unreachable. Terminal statuses are never changed.
    pub fn fail(&mut self) -> bool {
        if self.reward_status.is_terminal() {
            return false;
        }
        self.reward_status = RewardStatus::Failed;
        true
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_referral() -> Referral {
        Referral::new(UserId::new(), UserId::new(), "ref-code".to_string())
    }

    #[test]
    fn register_is_precompleted_and_rest_pending() {
        let referral = make_referral();
        assert_eq!(referral.actions.len(), ReferralAction::ALL.len());

        let Some(register) = referral.action(ReferralAction::Register) else {
            panic!("register slot missing");
        };
        assert!(register.completed);
        assert!(register.completed_at.is_some());

        let incomplete = referral
            .actions
            .iter()
            .filter(|slot| !slot.completed)
            .count();
        assert_eq!(incomplete, ReferralAction::ALL.len() - 1);
        assert_eq!(referral.reward_status, RewardStatus::Pending);
        assert_eq!(referral.reward_amount, 0);
    }

    #[test]
    fn action_names_are_unique() {
        let referral = make_referral();
        let mut names: Vec<&str> = referral
            .actions
            .iter()
            .map(|slot| slot.action.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), referral.actions.len());
    }

    #[test]
    fn complete_action_is_idempotent() {
        let mut referral = make_referral();
        let first = referral.complete_action(ReferralAction::WhitepaperRead);
        assert_eq!(first, ActionOutcome::Completed);

        let Some(slot) = referral.action(ReferralAction::WhitepaperRead) else {
            panic!("slot missing");
        };
        let stamped_at = slot.completed_at;

        let second = referral.complete_action(ReferralAction::WhitepaperRead);
        assert_eq!(second, ActionOutcome::AlreadyComplete);

        let Some(slot) = referral.action(ReferralAction::WhitepaperRead) else {
            panic!("slot missing");
        };
        assert_eq!(slot.completed_at, stamped_at);
    }

    #[test]
    fn settle_requires_full_checklist() {
        let mut referral = make_referral();
        assert!(!referral.settle(250));
        assert_eq!(referral.reward_status, RewardStatus::Pending);

        for action in ReferralAction::ALL {
            let _ = referral.complete_action(action);
        }
        assert!(referral.settle(250));
        assert_eq!(referral.reward_status, RewardStatus::Credited);
        assert_eq!(referral.reward_amount, 250);
    }

    #[test]
    fn terminal_status_never_transitions() {
        let mut referral = make_referral();
        for action in ReferralAction::ALL {
            let _ = referral.complete_action(action);
        }
        assert!(referral.settle(250));

        // Credited is terminal: neither settle nor fail changes it.
        assert!(!referral.settle(999));
        assert_eq!(referral.reward_amount, 250);
        assert!(!referral.fail());
        assert_eq!(referral.reward_status, RewardStatus::Credited);

        let mut failed = make_referral();
        assert!(failed.fail());
        assert!(!failed.settle(250));
        assert_eq!(failed.reward_status, RewardStatus::Failed);
    }

    #[test]
    fn parse_accepts_both_vocabularies() {
        let canonical = ReferralAction::parse("TWITTER_FOLLOW");
        let legacy = ReferralAction::parse("FOLLOW_TWITTER");
        assert!(matches!(canonical, Ok(ReferralAction::TwitterFollow)));
        assert!(matches!(legacy, Ok(ReferralAction::TwitterFollow)));
        assert!(matches!(
            ReferralAction::parse("JOIN_TELEGRAM"),
            Ok(ReferralAction::TelegramJoin)
        ));
        assert!(ReferralAction::parse("DANCE").is_err());
    }

    #[test]
    fn reward_table_defaults() {
        let table = RewardTable::default();
        assert_eq!(table.action_points(ReferralAction::Register), 100);
        assert_eq!(table.action_points(ReferralAction::CrossBorderSwap), 200);
    }
}
