//! User identity: id newtype, lifecycle status, and the user record.
//!
//! [`UserId`] is a newtype wrapper around [`uuid::Uuid`] (v4) providing
//! type safety so that user identifiers cannot be confused with other
//! UUIDs (referral ids, task ids).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Unique identifier for a registered user.
///
/// Wraps a UUID v4. Generated once at registration time and immutable
/// thereafter. Used as the dictionary key in [`super::UserRegistry`] and
/// as the owner reference on referrals, tasks, and points entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(uuid::Uuid);

impl UserId {
    /// Creates a new random `UserId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `UserId` from an existing [`uuid::Uuid`].
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<uuid::Uuid> for UserId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<UserId> for uuid::Uuid {
    fn from(id: UserId) -> Self {
        id.0
    }
}

/// Lifecycle status of a user record.
///
/// Every user starts `Waitlisted`; a later login with the same wallet
/// promotes them to `Connected`. There is no transition back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// Registered but the wallet has not returned since signup.
    Waitlisted,
    /// Wallet has been linked through a subsequent login.
    Connected,
}

impl UserStatus {
    /// Returns the status as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Waitlisted => "waitlisted",
            Self::Connected => "connected",
        }
    }

    /// Parses a status from its snake_case string form.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for unknown strings.
    pub fn parse(s: &str) -> Result<Self, GatewayError> {
        match s {
            "waitlisted" => Ok(Self::Waitlisted),
            "connected" => Ok(Self::Connected),
            other => Err(GatewayError::InvalidRequest(format!(
                "unknown user status: {other}"
            ))),
        }
    }
}

/// A registered waitlist user.
///
/// The wallet address is the primary external identifier for wallet-based
/// flows and is globally unique; email is unique when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier (immutable after creation).
    pub id: UserId,

    /// Wallet address, globally unique (immutable after creation).
    pub wallet_address: String,

    /// Contact email; unique across users when present.
    pub email: Option<String>,

    /// Contact phone number.
    pub phone: Option<String>,

    /// This user's own referral code, shared with others at signup.
    pub referral_code: String,

    /// Lifecycle status.
    pub status: UserStatus,

    /// Registration timestamp (immutable after creation).
    pub created_at: DateTime<Utc>,

    /// Timestamp of the most recent login.
    pub last_login_at: DateTime<Utc>,
}

impl User {
    /// Creates a new waitlisted user.
    ///
    /// The user's own referral code is derived from the first segment of
    /// their id, which is unique enough for a share link.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] when the wallet address is
    /// empty or when neither email nor phone is provided.
    pub fn new(
        wallet_address: String,
        email: Option<String>,
        phone: Option<String>,
    ) -> Result<Self, GatewayError> {
        if wallet_address.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "wallet_address is required".to_string(),
            ));
        }
        if email.as_deref().is_none_or(str::is_empty) && phone.as_deref().is_none_or(str::is_empty)
        {
            return Err(GatewayError::InvalidRequest(
                "at least one of email or phone is required".to_string(),
            ));
        }

        let id = UserId::new();
        let referral_code = Self::derive_referral_code(&id);
        let now = Utc::now();
        Ok(Self {
            id,
            wallet_address,
            email: email.filter(|e| !e.is_empty()),
            phone: phone.filter(|p| !p.is_empty()),
            referral_code,
            status: UserStatus::Waitlisted,
            created_at: now,
            last_login_at: now,
        })
    }

    /// Derives the shareable referral code from a user id.
    #[must_use]
    pub fn derive_referral_code(id: &UserId) -> String {
        let full = id.as_uuid().simple().to_string();
        full.chars().take(8).collect()
    }

    /// Display name for leaderboard and notification purposes: the email
    /// local part when available, otherwise a shortened wallet address.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(email) = &self.email
            && let Some((local, _)) = email.split_once('@')
            && !local.is_empty()
        {
            return local.to_string();
        }
        let mut short: String = self.wallet_address.chars().take(6).collect();
        short.push('…');
        short.extend(
            self.wallet_address
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev(),
        );
        short
    }

    /// Records a successful login: stamps `last_login_at` and promotes
    /// waitlisted users to connected.
    pub fn record_login(&mut self) {
        self.last_login_at = Utc::now();
        self.status = UserStatus::Connected;
    }
}
