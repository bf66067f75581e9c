//! Event-sourced points accounting.
//!
//! Every point-earning action appends one immutable [`PointsEntry`] to the
//! [`PointsLog`]; a user's balance is always the sum of their entries.
//! There is no separately writable counter anywhere in the system, which
//! removes the counter-out-of-sync class of bugs at the cost of an O(n)
//! summation per read, acceptable since n is bounded by the handful of
//! discrete reward-granting actions a user can take.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::user::UserId;
use crate::error::GatewayError;

/// Recognized point-earning event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Account registration.
    Register,
    /// Followed the product account on Twitter/X.
    TwitterFollow,
    /// Joined (and verified membership in) the Telegram channel.
    TelegramJoin,
    /// Read the whitepaper.
    WhitepaperRead,
    /// Performed a cross-border swap.
    CrossBorderSwap,
    /// Passed the product quiz.
    QuizCompleted,
    /// Published a community post.
    CommunityPost,
    /// Referrer's bonus when a referral checklist completes.
    ReferralBonusEarned,
    /// Referred user's bonus when their checklist completes.
    ReferralBonusReceived,
}

impl EventKind {
    /// Returns the kind as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Register => "REGISTER",
            Self::TwitterFollow => "TWITTER_FOLLOW",
            Self::TelegramJoin => "TELEGRAM_JOIN",
            Self::WhitepaperRead => "WHITEPAPER_READ",
            Self::CrossBorderSwap => "CROSS_BORDER_SWAP",
            Self::QuizCompleted => "QUIZ_COMPLETED",
            Self::CommunityPost => "COMMUNITY_POST",
            Self::ReferralBonusEarned => "REFERRAL_BONUS_EARNED",
            Self::ReferralBonusReceived => "REFERRAL_BONUS_RECEIVED",
        }
    }

    /// Parses an event kind from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnknownEventKind`] for unrecognized kinds.
    pub fn parse(s: &str) -> Result<Self, GatewayError> {
        match s {
            "REGISTER" => Ok(Self::Register),
            "TWITTER_FOLLOW" => Ok(Self::TwitterFollow),
            "TELEGRAM_JOIN" => Ok(Self::TelegramJoin),
            "WHITEPAPER_READ" => Ok(Self::WhitepaperRead),
            "CROSS_BORDER_SWAP" => Ok(Self::CrossBorderSwap),
            "QUIZ_COMPLETED" => Ok(Self::QuizCompleted),
            "COMMUNITY_POST" => Ok(Self::CommunityPost),
            "REFERRAL_BONUS_EARNED" => Ok(Self::ReferralBonusEarned),
            "REFERRAL_BONUS_RECEIVED" => Ok(Self::ReferralBonusReceived),
            other => Err(GatewayError::UnknownEventKind(other.to_string())),
        }
    }
}

/// A single, immutable point-earning event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsEntry {
    /// Owning user.
    pub user_id: UserId,
    /// Signed point delta.
    pub delta: i64,
    /// Event kind discriminator.
    pub kind: EventKind,
    /// Human-readable label for display.
    pub label: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

/// Append-only per-user points log.
///
/// Entries are never edited or deleted; totals are derived on every read.
#[derive(Debug)]
pub struct PointsLog {
    entries: RwLock<HashMap<UserId, Vec<PointsEntry>>>,
}

impl PointsLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Appends an event for a user and returns the stored entry. Always
    /// succeeds; the delta must be a finite integer by construction and
    /// the kind is typed.
    pub async fn append(
        &self,
        user_id: UserId,
        kind: EventKind,
        delta: i64,
        label: &str,
    ) -> PointsEntry {
        let entry = PointsEntry {
            user_id,
            delta,
            kind,
            label: label.to_string(),
            timestamp: Utc::now(),
        };
        self.entries
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(entry.clone());
        entry
    }

    /// Restores an entry loaded from durable storage, preserving its
    /// original timestamp. Used only during startup replay.
    pub async fn restore(&self, entry: PointsEntry) {
        self.entries
            .write()
            .await
            .entry(entry.user_id)
            .or_default()
            .push(entry);
    }

    /// Derived total: the sum of all deltas for the user. Pure function
    /// of the log.
    pub async fn total(&self, user_id: UserId) -> i64 {
        self.entries
            .read()
            .await
            .get(&user_id)
            .map_or(0, |entries| entries.iter().map(|e| e.delta).sum())
    }

    /// The user's event history, oldest first.
    pub async fn history(&self, user_id: UserId) -> Vec<PointsEntry> {
        self.entries
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Derived totals for every user with at least one entry. Used by the
    /// leaderboard source.
    pub async fn totals(&self) -> HashMap<UserId, i64> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(user_id, entries)| (*user_id, entries.iter().map(|e| e.delta).sum()))
            .collect()
    }
}

impl Default for PointsLog {
    fn default() -> Self {
        Self::new()
    }
}
