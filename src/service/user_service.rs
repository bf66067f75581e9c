//! User lifecycle orchestration: wallet login, registration, profile reads.

use std::sync::Arc;

use crate::domain::{PointsEntry, PointsLog, Referral, User, UserId, UserRegistry};
use crate::error::GatewayError;
use crate::persistence::PostgresPersistence;
use crate::service::ReferralService;

/// Outcome of a wallet login: the user snapshot plus whether the record
/// was created by this call.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Snapshot of the user after the login was applied.
    pub user: User,
    /// `true` when this login registered a new user.
    pub created: bool,
}

/// Orchestration layer for user registration and login.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<UserRegistry>,
    points: Arc<PointsLog>,
    referrals: ReferralService,
    mirror: Option<PostgresPersistence>,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(
        users: Arc<UserRegistry>,
        points: Arc<PointsLog>,
        referrals: ReferralService,
        mirror: Option<PostgresPersistence>,
    ) -> Self {
        Self {
            users,
            points,
            referrals,
            mirror,
        }
    }

    /// Returns a reference to the underlying [`UserRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<UserRegistry> {
        &self.users
    }

    /// Wallet login. Registers the wallet on first contact and replays a
    /// login on every later one.
    ///
    /// First contact creates a waitlisted user with an empty points
    /// history and attaches a referral when `referral_code` resolves to
    /// another user; the referral path appends the REGISTER entry, so an
    /// unreferred signup earns nothing. Unknown and self-referencing
    /// codes are skipped silently so a stale share link never blocks
    /// signup. Later logins stamp `last_login_at` and promote the user
    /// to connected.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for missing wallet or
    /// contact details, [`GatewayError::DuplicateEmail`] when the email
    /// belongs to another wallet.
    pub async fn login(
        &self,
        wallet_address: &str,
        email: Option<String>,
        phone: Option<String>,
        referral_code: Option<String>,
    ) -> Result<LoginOutcome, GatewayError> {
        if let Some(existing) = self.users.find_by_wallet(wallet_address).await {
            let mut user = existing.write().await;
            user.record_login();
            let snapshot = user.clone();
            drop(user);

            self.mirror_user(&snapshot).await;
            tracing::info!(user_id = %snapshot.id, "returning wallet logged in");
            return Ok(LoginOutcome {
                user: snapshot,
                created: false,
            });
        }

        let user = User::new(wallet_address.to_string(), email, phone)?;
        let snapshot = user.clone();
        self.users.insert(user).await?;
        self.mirror_user(&snapshot).await;

        if let Some(code) = referral_code.as_deref().filter(|c| !c.is_empty()) {
            self.attach_referral(&snapshot, code).await;
        }

        tracing::info!(user_id = %snapshot.id, "new wallet registered");
        Ok(LoginOutcome {
            user: snapshot,
            created: true,
        })
    }

    /// Resolves the signup referral code and creates the referral record.
    /// Unknown codes and self-referrals are dropped without failing the
    /// signup.
    async fn attach_referral(&self, user: &User, code: &str) {
        let Some(referrer_id) = self.users.find_by_referral_code(code).await else {
            tracing::debug!(user_id = %user.id, code, "signup referral code did not resolve");
            return;
        };
        if referrer_id == user.id {
            tracing::debug!(user_id = %user.id, "self-referral skipped");
            return;
        }
        if let Err(e) = self
            .referrals
            .create_referral(referrer_id, user.id, code)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "referral attach failed");
        }
    }

    /// Returns a snapshot of the user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] for unknown ids.
    pub async fn get(&self, id: UserId) -> Result<User, GatewayError> {
        let entry = self.users.get(id).await?;
        let user = entry.read().await.clone();
        Ok(user)
    }

    /// The user's derived points total.
    pub async fn points_total(&self, id: UserId) -> i64 {
        self.points.total(id).await
    }

    /// The user's points history, oldest first.
    pub async fn points_history(&self, id: UserId) -> Vec<PointsEntry> {
        self.points.history(id).await
    }

    /// All referrals where the user is the referrer.
    pub async fn referrals_of(&self, id: UserId) -> Vec<Referral> {
        self.referrals.list_by_referrer(id).await
    }

    async fn mirror_user(&self, user: &User) {
        if let Some(db) = &self.mirror
            && let Err(e) = db.upsert_user(user).await
        {
            tracing::warn!(user_id = %user.id, error = %e, "user mirror write failed");
        }
    }
}
