//! Concurrent user storage with per-user fine-grained locking.
//!
//! [`UserRegistry`] stores all users in a `HashMap` where each entry is
//! individually protected by a [`tokio::sync::RwLock`], with secondary
//! indexes enforcing wallet and email uniqueness.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::user::{User, UserId};
use crate::error::GatewayError;

/// Central store for all registered users.
///
/// Uses a `RwLock<HashMap<...>>` for the outer map and per-entry
/// `Arc<RwLock<User>>` for fine-grained per-user locking. Secondary
/// indexes map wallet address, email, and referral code back to ids.
///
/// # Concurrency
///
/// - Multiple threads may read the same user concurrently.
/// - Writes to different users are concurrent.
/// - Writes to the same user are serialized.
#[derive(Debug)]
pub struct UserRegistry {
    users: RwLock<HashMap<UserId, Arc<RwLock<User>>>>,
    by_wallet: RwLock<HashMap<String, UserId>>,
    by_email: RwLock<HashMap<String, UserId>>,
    by_referral_code: RwLock<HashMap<String, UserId>>,
}

impl UserRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            by_wallet: RwLock::new(HashMap::new()),
            by_email: RwLock::new(HashMap::new()),
            by_referral_code: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new user, enforcing wallet and email uniqueness.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateWallet`] if the wallet address is
    /// taken, or [`GatewayError::DuplicateEmail`] if the email is taken.
    pub async fn insert(&self, user: User) -> Result<UserId, GatewayError> {
        let mut wallets = self.by_wallet.write().await;
        if wallets.contains_key(&user.wallet_address) {
            return Err(GatewayError::DuplicateWallet(user.wallet_address.clone()));
        }

        let mut emails = self.by_email.write().await;
        if let Some(email) = &user.email
            && emails.contains_key(email)
        {
            return Err(GatewayError::DuplicateEmail(email.clone()));
        }

        let id = user.id;
        wallets.insert(user.wallet_address.clone(), id);
        if let Some(email) = &user.email {
            emails.insert(email.clone(), id);
        }
        self.by_referral_code
            .write()
            .await
            .insert(user.referral_code.clone(), id);
        self.users
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(user)));
        Ok(id)
    }

    /// Returns a shared reference to the user entry behind a per-user lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if no user with the given ID
    /// exists.
    pub async fn get(&self, id: UserId) -> Result<Arc<RwLock<User>>, GatewayError> {
        let map = self.users.read().await;
        map.get(&id)
            .cloned()
            .ok_or(GatewayError::UserNotFound(*id.as_uuid()))
    }

    /// Looks up a user by wallet address.
    pub async fn find_by_wallet(&self, wallet_address: &str) -> Option<Arc<RwLock<User>>> {
        let id = *self.by_wallet.read().await.get(wallet_address)?;
        self.users.read().await.get(&id).cloned()
    }

    /// Resolves a referral code to its owning user id.
    pub async fn find_by_referral_code(&self, code: &str) -> Option<UserId> {
        self.by_referral_code.read().await.get(code).copied()
    }

    /// Returns snapshots of all users. Used by the leaderboard source.
    pub async fn list(&self) -> Vec<User> {
        let map = self.users.read().await;
        let mut out = Vec::with_capacity(map.len());
        for entry in map.values() {
            out.push(entry.read().await.clone());
        }
        out
    }

    /// Returns the number of registered users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns `true` if no users are registered.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_user(wallet: &str, email: &str) -> User {
        let Ok(user) = User::new(wallet.to_string(), Some(email.to_string()), None) else {
            panic!("valid user");
        };
        user
    }

    #[tokio::test]
    async fn insert_and_get() {
        let registry = UserRegistry::new();
        let user = make_user("0xaaa", "a@x.com");
        let id = user.id;

        let result = registry.insert(user).await;
        assert!(result.is_ok());

        let fetched = registry.get(id).await;
        assert!(fetched.is_ok());
    }

    #[tokio::test]
    async fn duplicate_wallet_rejected() {
        let registry = UserRegistry::new();
        let _ = registry.insert(make_user("0xaaa", "a@x.com")).await;

        let result = registry.insert(make_user("0xaaa", "b@x.com")).await;
        assert!(matches!(result, Err(GatewayError::DuplicateWallet(_))));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let registry = UserRegistry::new();
        let _ = registry.insert(make_user("0xaaa", "a@x.com")).await;

        let result = registry.insert(make_user("0xbbb", "a@x.com")).await;
        assert!(matches!(result, Err(GatewayError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn find_by_wallet_and_code() {
        let registry = UserRegistry::new();
        let user = make_user("0xaaa", "a@x.com");
        let id = user.id;
        let code = user.referral_code.clone();
        let _ = registry.insert(user).await;

        assert!(registry.find_by_wallet("0xaaa").await.is_some());
        assert!(registry.find_by_wallet("0xzzz").await.is_none());
        assert_eq!(registry.find_by_referral_code(&code).await, Some(id));
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let registry = UserRegistry::new();
        let result = registry.get(UserId::new()).await;
        assert!(matches!(result, Err(GatewayError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn len_and_is_empty() {
        let registry = UserRegistry::new();
        assert!(registry.is_empty().await);

        let _ = registry.insert(make_user("0xaaa", "a@x.com")).await;
        assert!(!registry.is_empty().await);
        assert_eq!(registry.len().await, 1);
    }
}
