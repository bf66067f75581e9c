//! Referral ledger orchestration: creation, action progress, settlement.

use std::sync::Arc;

use crate::domain::{
    ActionOutcome, PointsLog, Referral, ReferralAction, ReferralBook, ReferralId, RewardTable,
    UserId,
};
use crate::error::GatewayError;
use crate::persistence::PostgresPersistence;

/// Orchestration layer for the referral ledger.
///
/// Every mutation follows the pattern: acquire the per-record lock →
/// mutate → snapshot → release → append points entries → mirror. Points
/// entries are appended only on actual state transitions, so repeat
/// calls never double-apply effects.
#[derive(Debug, Clone)]
pub struct ReferralService {
    referrals: Arc<ReferralBook>,
    points: Arc<PointsLog>,
    rewards: RewardTable,
    mirror: Option<PostgresPersistence>,
}

impl ReferralService {
    /// Creates a new `ReferralService`.
    #[must_use]
    pub fn new(
        referrals: Arc<ReferralBook>,
        points: Arc<PointsLog>,
        rewards: RewardTable,
        mirror: Option<PostgresPersistence>,
    ) -> Self {
        Self {
            referrals,
            points,
            rewards,
            mirror,
        }
    }

    /// Returns a reference to the underlying [`ReferralBook`].
    #[must_use]
    pub fn book(&self) -> &Arc<ReferralBook> {
        &self.referrals
    }

    /// Creates a referral record with REGISTER pre-completed and appends
    /// the referred user's REGISTER points entry. Signing up without a
    /// referral earns nothing; the entry belongs to this path alone.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::DuplicateReferral`] if the referred user
    /// already has a referral record.
    pub async fn create_referral(
        &self,
        referrer_id: UserId,
        referred_user_id: UserId,
        code: &str,
    ) -> Result<ReferralId, GatewayError> {
        let referral = Referral::new(referrer_id, referred_user_id, code.to_string());
        let snapshot = referral.clone();
        let id = self.referrals.insert(referral).await?;

        let entry = self
            .points
            .append(
                referred_user_id,
                ReferralAction::Register.event_kind(),
                self.rewards.action_points(ReferralAction::Register),
                action_label(ReferralAction::Register),
            )
            .await;
        self.mirror_points(&entry).await;
        self.mirror_referral(&snapshot).await;
        tracing::info!(%id, %referrer_id, %referred_user_id, "referral created");
        Ok(id)
    }

    /// Marks a checklist action complete and appends the action's points
    /// entry for the referred user. Repeat calls are a no-op success.
    ///
    /// The reward is evaluated automatically once the checklist fills up.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ReferralNotFound`] for unknown ids.
    pub async fn complete_action(
        &self,
        referral_id: ReferralId,
        action: ReferralAction,
    ) -> Result<ActionOutcome, GatewayError> {
        self.record_action(referral_id, action, true).await
    }

    /// Progresses the checklist for the referral where `user_id` is the
    /// referred party, without awarding the action's points (the caller
    /// already has). No-op when the user was not referred.
    pub async fn note_action_for_user(&self, user_id: UserId, action: ReferralAction) {
        let Some(entry) = self.referrals.find_by_referred(user_id).await else {
            return;
        };
        let referral_id = entry.read().await.id;
        if let Err(e) = self.record_action(referral_id, action, false).await {
            tracing::warn!(%user_id, error = %e, "referral checklist bridge failed");
        }
    }

    /// Core action-progress path shared by [`Self::complete_action`] and
    /// the task-verification bridge.
    async fn record_action(
        &self,
        referral_id: ReferralId,
        action: ReferralAction,
        award_points: bool,
    ) -> Result<ActionOutcome, GatewayError> {
        let entry = self.referrals.get(referral_id).await?;
        let mut referral = entry.write().await;

        let outcome = referral.complete_action(action);
        let mut credited = false;
        if outcome == ActionOutcome::Completed && referral.all_required_complete() {
            credited = referral.settle(self.rewards.referral_bonus_earned);
        }
        let snapshot = referral.clone();
        drop(referral);

        if outcome == ActionOutcome::Completed {
            if award_points {
                let points_entry = self
                    .points
                    .append(
                        snapshot.referred_user_id,
                        action.event_kind(),
                        self.rewards.action_points(action),
                        action_label(action),
                    )
                    .await;
                self.mirror_points(&points_entry).await;
            }
            tracing::info!(%referral_id, action = action.as_str(), "referral action completed");
        }

        if credited {
            self.credit_bonuses(&snapshot).await;
        }
        if outcome == ActionOutcome::Completed {
            self.mirror_referral(&snapshot).await;
        }
        Ok(outcome)
    }

    /// Evaluates the reward explicitly: credits it when the checklist is
    /// complete and the status is still pending. Terminal statuses are
    /// never transitioned.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ReferralNotFound`] for unknown ids.
    pub async fn evaluate_reward(&self, referral_id: ReferralId) -> Result<Referral, GatewayError> {
        let entry = self.referrals.get(referral_id).await?;
        let mut referral = entry.write().await;
        let credited = referral.settle(self.rewards.referral_bonus_earned);
        let snapshot = referral.clone();
        drop(referral);

        if credited {
            self.credit_bonuses(&snapshot).await;
            self.mirror_referral(&snapshot).await;
        }
        Ok(snapshot)
    }

    /// Returns all referrals where the given user is the referrer.
    pub async fn list_by_referrer(&self, referrer_id: UserId) -> Vec<Referral> {
        self.referrals.list_by_referrer(referrer_id).await
    }

    /// Appends the settlement bonus entries for both parties.
    async fn credit_bonuses(&self, referral: &Referral) {
        let earned = self
            .points
            .append(
                referral.referrer_id,
                crate::domain::EventKind::ReferralBonusEarned,
                self.rewards.referral_bonus_earned,
                "Referral bonus earned",
            )
            .await;
        self.mirror_points(&earned).await;

        let received = self
            .points
            .append(
                referral.referred_user_id,
                crate::domain::EventKind::ReferralBonusReceived,
                self.rewards.referral_bonus_received,
                "Referral bonus received",
            )
            .await;
        self.mirror_points(&received).await;

        tracing::info!(referral_id = %referral.id, "referral reward credited");
    }

    async fn mirror_referral(&self, referral: &Referral) {
        if let Some(db) = &self.mirror
            && let Err(e) = db.upsert_referral(referral).await
        {
            tracing::warn!(referral_id = %referral.id, error = %e, "referral mirror write failed");
        }
    }

    async fn mirror_points(&self, entry: &crate::domain::PointsEntry) {
        if let Some(db) = &self.mirror
            && let Err(e) = db.append_points_entry(entry).await
        {
            tracing::warn!(user_id = %entry.user_id, error = %e, "points mirror write failed");
        }
    }
}

/// Human-readable label for an action's points entry.
const fn action_label(action: ReferralAction) -> &'static str {
    match action {
        ReferralAction::Register => "Registered for the waitlist",
        ReferralAction::TwitterFollow => "Followed on X",
        ReferralAction::TelegramJoin => "Joined the Telegram channel",
        ReferralAction::WhitepaperRead => "Read the whitepaper",
        ReferralAction::CrossBorderSwap => "Completed a cross-border swap",
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::RewardStatus;
    use tokio_test::assert_ok;

    fn make_service() -> (ReferralService, Arc<PointsLog>) {
        let points = Arc::new(PointsLog::new());
        let service = ReferralService::new(
            Arc::new(ReferralBook::new()),
            Arc::clone(&points),
            RewardTable::default(),
            None,
        );
        (service, points)
    }

    #[tokio::test]
    async fn duplicate_referral_rejected() {
        let (service, _) = make_service();
        let referred = UserId::new();

        let first = service
            .create_referral(UserId::new(), referred, "code")
            .await;
        tokio_test::assert_ok!(first);

        let second = service
            .create_referral(UserId::new(), referred, "other")
            .await;
        assert!(matches!(second, Err(GatewayError::DuplicateReferral(_))));
    }

    #[tokio::test]
    async fn complete_action_appends_exactly_one_entry() {
        let (service, points) = make_service();
        let referred = UserId::new();
        let Ok(id) = service
            .create_referral(UserId::new(), referred, "code")
            .await
        else {
            panic!("referral creation failed");
        };

        // Creation already appended the REGISTER entry.
        assert_eq!(points.history(referred).await.len(), 1);

        let first = service
            .complete_action(id, ReferralAction::WhitepaperRead)
            .await;
        assert!(matches!(first, Ok(ActionOutcome::Completed)));
        assert_eq!(points.history(referred).await.len(), 2);
        assert_eq!(points.total(referred).await, 100 + 75);

        // Idempotence: the repeat call changes nothing.
        let second = service
            .complete_action(id, ReferralAction::WhitepaperRead)
            .await;
        assert!(matches!(second, Ok(ActionOutcome::AlreadyComplete)));
        assert_eq!(points.history(referred).await.len(), 2);
        assert_eq!(points.total(referred).await, 100 + 75);
    }

    #[tokio::test]
    async fn full_checklist_credits_both_parties() {
        let (service, points) = make_service();
        let referrer = UserId::new();
        let referred = UserId::new();
        let Ok(id) = service.create_referral(referrer, referred, "code").await else {
            panic!("referral creation failed");
        };

        for action in [
            ReferralAction::TwitterFollow,
            ReferralAction::TelegramJoin,
            ReferralAction::WhitepaperRead,
            ReferralAction::CrossBorderSwap,
        ] {
            let result = service.complete_action(id, action).await;
            assert!(result.is_ok());
        }

        let Ok(entry) = service.book().get(id).await else {
            panic!("referral missing");
        };
        let referral = entry.read().await.clone();
        assert_eq!(referral.reward_status, RewardStatus::Credited);
        assert_eq!(referral.reward_amount, 250);

        assert_eq!(points.total(referrer).await, 250);
        // Register, the four remaining actions, and the received bonus.
        assert_eq!(points.total(referred).await, 100 + 50 + 50 + 75 + 200 + 100);
    }

    #[tokio::test]
    async fn evaluate_reward_leaves_incomplete_pending() {
        let (service, _) = make_service();
        let Ok(id) = service
            .create_referral(UserId::new(), UserId::new(), "code")
            .await
        else {
            panic!("referral creation failed");
        };

        let Ok(snapshot) = service.evaluate_reward(id).await else {
            panic!("evaluate failed");
        };
        assert_eq!(snapshot.reward_status, RewardStatus::Pending);
    }

    #[tokio::test]
    async fn credited_referral_is_never_recredited() {
        let (service, points) = make_service();
        let referrer = UserId::new();
        let Ok(id) = service.create_referral(referrer, UserId::new(), "c").await else {
            panic!("referral creation failed");
        };
        for action in [
            ReferralAction::TwitterFollow,
            ReferralAction::TelegramJoin,
            ReferralAction::WhitepaperRead,
            ReferralAction::CrossBorderSwap,
        ] {
            let _ = service.complete_action(id, action).await;
        }
        let before = points.total(referrer).await;

        let Ok(snapshot) = service.evaluate_reward(id).await else {
            panic!("evaluate failed");
        };
        assert_eq!(snapshot.reward_status, RewardStatus::Credited);
        assert_eq!(points.total(referrer).await, before);
    }

    #[tokio::test]
    async fn note_action_skips_points_but_progresses() {
        let (service, points) = make_service();
        let referred = UserId::new();
        let Ok(id) = service
            .create_referral(UserId::new(), referred, "code")
            .await
        else {
            panic!("referral creation failed");
        };

        let before = points.total(referred).await;
        service
            .note_action_for_user(referred, ReferralAction::TwitterFollow)
            .await;

        let Ok(entry) = service.book().get(id).await else {
            panic!("referral missing");
        };
        let referral = entry.read().await.clone();
        let Some(slot) = referral.action(ReferralAction::TwitterFollow) else {
            panic!("slot missing");
        };
        assert!(slot.completed);
        assert_eq!(points.total(referred).await, before);
    }

    #[tokio::test]
    async fn note_action_for_unreferred_user_is_noop() {
        let (service, points) = make_service();
        let user = UserId::new();
        service
            .note_action_for_user(user, ReferralAction::TwitterFollow)
            .await;
        assert_eq!(points.total(user).await, 0);
    }
}
