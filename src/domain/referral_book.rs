//! Concurrent referral storage with the unique-referred-user invariant.
//!
//! [`ReferralBook`] mirrors the registry pattern used for users: an outer
//! `RwLock<HashMap>` with per-record `Arc<RwLock<Referral>>` entries, plus
//! indexes by referred user (unique) and by referrer (one-to-many).

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::referral::{Referral, ReferralId};
use super::user::UserId;
use crate::error::GatewayError;

/// Central store for all referral records.
///
/// Each user can be the referred party of at most one referral; the
/// `by_referred` index enforces this at insert time.
#[derive(Debug)]
pub struct ReferralBook {
    referrals: RwLock<HashMap<ReferralId, Arc<RwLock<Referral>>>>,
    by_referred: RwLock<HashMap<UserId, ReferralId>>,
    by_referrer: RwLock<HashMap<UserId, Vec<ReferralId>>>,
}

impl ReferralBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self {
            referrals: RwLock::new(HashMap::new()),
            by_referred: RwLock::new(HashMap::new()),
            by_referrer: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new referral record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateReferral`] if the referred user
    /// already has a referral record.
    pub async fn insert(&self, referral: Referral) -> Result<ReferralId, GatewayError> {
        let mut referred_index = self.by_referred.write().await;
        if referred_index.contains_key(&referral.referred_user_id) {
            return Err(GatewayError::DuplicateReferral(
                *referral.referred_user_id.as_uuid(),
            ));
        }

        let id = referral.id;
        referred_index.insert(referral.referred_user_id, id);
        self.by_referrer
            .write()
            .await
            .entry(referral.referrer_id)
            .or_default()
            .push(id);
        self.referrals
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(referral)));
        Ok(id)
    }

    /// Returns a shared reference to a referral behind its per-record lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ReferralNotFound`] for unknown ids.
    pub async fn get(&self, id: ReferralId) -> Result<Arc<RwLock<Referral>>, GatewayError> {
        let map = self.referrals.read().await;
        map.get(&id)
            .cloned()
            .ok_or(GatewayError::ReferralNotFound(*id.as_uuid()))
    }

    /// Finds the referral where the given user is the referred party.
    pub async fn find_by_referred(&self, user_id: UserId) -> Option<Arc<RwLock<Referral>>> {
        let id = *self.by_referred.read().await.get(&user_id)?;
        self.referrals.read().await.get(&id).cloned()
    }

    /// Returns snapshots of all referrals where the given user is the
    /// referrer, oldest first.
    pub async fn list_by_referrer(&self, referrer_id: UserId) -> Vec<Referral> {
        let ids = self
            .by_referrer
            .read()
            .await
            .get(&referrer_id)
            .cloned()
            .unwrap_or_default();
        let map = self.referrals.read().await;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(entry) = map.get(&id) {
                out.push(entry.read().await.clone());
            }
        }
        out
    }

    /// Number of referrals where the given user is the referrer.
    pub async fn referral_count(&self, referrer_id: UserId) -> usize {
        self.by_referrer
            .read()
            .await
            .get(&referrer_id)
            .map_or(0, Vec::len)
    }

    /// Returns the number of referral records.
    pub async fn len(&self) -> usize {
        self.referrals.read().await.len()
    }

    /// Returns `true` if the book contains no referrals.
    pub async fn is_empty(&self) -> bool {
        self.referrals.read().await.is_empty()
    }
}

impl Default for ReferralBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_and_get() {
        let book = ReferralBook::new();
        let referral = Referral::new(UserId::new(), UserId::new(), "code".to_string());
        let id = referral.id;

        let result = book.insert(referral).await;
        assert!(result.is_ok());
        assert!(book.get(id).await.is_ok());
    }

    #[tokio::test]
    async fn referred_user_is_unique() {
        let book = ReferralBook::new();
        let referred = UserId::new();

        let first = Referral::new(UserId::new(), referred, "code-a".to_string());
        let result = book.insert(first).await;
        assert!(result.is_ok());

        // Same referred user, different referrer: still a conflict.
        let second = Referral::new(UserId::new(), referred, "code-b".to_string());
        let result = book.insert(second).await;
        assert!(matches!(result, Err(GatewayError::DuplicateReferral(_))));
        assert_eq!(book.len().await, 1);
    }

    #[tokio::test]
    async fn list_by_referrer_filters() {
        let book = ReferralBook::new();
        let referrer = UserId::new();

        let _ = book
            .insert(Referral::new(referrer, UserId::new(), "c".to_string()))
            .await;
        let _ = book
            .insert(Referral::new(referrer, UserId::new(), "c".to_string()))
            .await;
        let _ = book
            .insert(Referral::new(UserId::new(), UserId::new(), "d".to_string()))
            .await;

        assert_eq!(book.list_by_referrer(referrer).await.len(), 2);
        assert_eq!(book.referral_count(referrer).await, 2);
        assert_eq!(book.referral_count(UserId::new()).await, 0);
    }

    #[tokio::test]
    async fn find_by_referred() {
        let book = ReferralBook::new();
        let referred = UserId::new();
        let _ = book
            .insert(Referral::new(UserId::new(), referred, "c".to_string()))
            .await;

        assert!(book.find_by_referred(referred).await.is_some());
        assert!(book.find_by_referred(UserId::new()).await.is_none());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let book = ReferralBook::new();
        let result = book.get(ReferralId::new()).await;
        assert!(matches!(result, Err(GatewayError::ReferralNotFound(_))));
    }
}
