//! DTOs for login, profile, referrals, and points history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{PointsEntry, Referral, User};

/// Wallet login / registration request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Wallet address. Required; globally unique.
    pub wallet_address: String,
    /// Contact email. Required on first login unless `phone` is given.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Referral code from a share link, honored on first login only.
    pub referral_code: Option<String>,
}

/// Public user representation.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserDto {
    /// User id.
    pub id: uuid::Uuid,
    /// Wallet address.
    pub wallet_address: String,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone number.
    pub phone: Option<String>,
    /// The user's own shareable referral code.
    pub referral_code: String,
    /// Lifecycle status (`waitlisted` or `connected`).
    pub status: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Most recent login timestamp.
    pub last_login_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            wallet_address: user.wallet_address,
            email: user.email,
            phone: user.phone,
            referral_code: user.referral_code,
            status: user.status.as_str().to_string(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Login response.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// The logged-in user.
    pub user: UserDto,
    /// Whether this login registered a new user.
    pub created: bool,
}

/// Profile response for `GET /user/me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    /// The authenticated user.
    pub user: UserDto,
    /// Derived points total.
    pub points_total: i64,
}

/// One checklist action on a referral.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionProgressDto {
    /// Action name (`REGISTER`, `TWITTER_FOLLOW`, ...).
    pub action: String,
    /// Whether the referred user has completed it.
    pub completed: bool,
    /// Completion timestamp.
    pub completed_at: Option<DateTime<Utc>>,
}

/// One referral made by the authenticated user.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralDto {
    /// Referral id.
    pub id: uuid::Uuid,
    /// The referred user's id.
    pub referred_user_id: uuid::Uuid,
    /// Checklist progress.
    pub actions: Vec<ActionProgressDto>,
    /// Reward status (`pending`, `credited`, `failed`).
    pub reward_status: String,
    /// Credited reward amount; zero while pending.
    pub reward_amount: i64,
    /// When the referral was recorded.
    pub created_at: DateTime<Utc>,
}

impl From<Referral> for ReferralDto {
    fn from(referral: Referral) -> Self {
        Self {
            id: *referral.id.as_uuid(),
            referred_user_id: *referral.referred_user_id.as_uuid(),
            actions: referral
                .actions
                .into_iter()
                .map(|slot| ActionProgressDto {
                    action: slot.action.as_str().to_string(),
                    completed: slot.completed,
                    completed_at: slot.completed_at,
                })
                .collect(),
            reward_status: referral.reward_status.as_str().to_string(),
            reward_amount: referral.reward_amount,
            created_at: referral.created_at,
        }
    }
}

/// Referral list response for `GET /user/referrals`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralListResponse {
    /// Referrals made by the authenticated user, oldest first.
    pub referrals: Vec<ReferralDto>,
}

/// One points-history event.
#[derive(Debug, Serialize, ToSchema)]
pub struct PointsEntryDto {
    /// Event kind (`REGISTER`, `QUIZ_COMPLETED`, ...).
    pub kind: String,
    /// Signed point delta.
    pub delta: i64,
    /// Human-readable label.
    pub label: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
}

impl From<PointsEntry> for PointsEntryDto {
    fn from(entry: PointsEntry) -> Self {
        Self {
            kind: entry.kind.as_str().to_string(),
            delta: entry.delta,
            label: entry.label,
            timestamp: entry.timestamp,
        }
    }
}

/// Points history response for `GET /user/points-history`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PointsHistoryResponse {
    /// Derived total, always the sum of `entries`.
    pub total: i64,
    /// Event history, oldest first.
    pub entries: Vec<PointsEntryDto>,
}
