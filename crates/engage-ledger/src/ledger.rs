use crate::metrics::MetricTable;
use crate::storage::LedgerStorage;
use chrono::Utc;
use engage_types::{
    Capability, CoreEvent, EngageError, EngagementId, EventBus, Result, RoleGate, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Whole tokens paid out per accumulated score unit (floor division).
pub const CONVERSION_RATE: u64 = 100;

/// One recorded interaction event. The score is fixed at record time;
/// `validated` transitions false to true exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engagement {
    pub id: EngagementId,
    pub user: UserId,
    pub platform: String,
    pub action: String,
    pub score: u64,
    pub validated: bool,
}

/// Outcome of a validation transition, consumed by the coordinator.
#[derive(Debug, Clone, Copy)]
pub struct Validation {
    pub user: UserId,
    pub payout: u64,
}

/// Append-only engagement store plus the per-user score accumulator.
pub struct EngagementLedger {
    storage: Arc<dyn LedgerStorage>,
    metrics: Arc<MetricTable>,
    gate: Arc<dyn RoleGate>,
    events: EventBus,
}

impl EngagementLedger {
    pub fn new(
        storage: Arc<dyn LedgerStorage>,
        metrics: Arc<MetricTable>,
        gate: Arc<dyn RoleGate>,
        events: EventBus,
    ) -> Self {
        Self {
            storage,
            metrics,
            gate,
            events,
        }
    }

    /// Record an engagement for `user`. Oracle-gated. Always succeeds for
    /// any (platform, action) pair; an unknown pair scores 0.
    pub async fn record(
        &self,
        caller: UserId,
        user: UserId,
        platform: &str,
        action: &str,
    ) -> Result<EngagementId> {
        self.gate.require(caller, Capability::Oracle).await?;

        let weight = self.metrics.weight(platform, action).await;
        let id = self.storage.allocate_engagement_id().await?;

        self.storage
            .put_engagement(Engagement {
                id,
                user,
                platform: platform.to_string(),
                action: action.to_string(),
                score: weight,
                validated: false,
            })
            .await?;

        let score_before = self.storage.score(user).await?;
        let score_after = score_before.saturating_add(weight);
        self.storage.set_score(user, score_after).await?;

        self.events.emit(CoreEvent::EngagementRecorded {
            id,
            user,
            platform: platform.to_string(),
            action: action.to_string(),
            score: weight,
            timestamp: Utc::now(),
        });

        info!(
            engagement_id = %id,
            user = %user,
            platform = platform,
            action = action,
            score = weight,
            accumulated_before = score_before,
            accumulated_after = score_after,
            "📦 Engagement recorded"
        );

        Ok(id)
    }

    /// Current accumulated score for `user` (0 if none).
    pub async fn score_of(&self, user: UserId) -> Result<u64> {
        self.storage.score(user).await
    }

    /// Passthrough to the metric table.
    pub async fn weight(&self, platform: &str, action: &str) -> u64 {
        self.metrics.weight(platform, action).await
    }

    /// Admin-gated weight update.
    pub async fn set_weight(
        &self,
        caller: UserId,
        platform: &str,
        action: &str,
        weight: u64,
    ) -> Result<()> {
        self.gate.require(caller, Capability::Admin).await?;
        self.metrics.set_weight(platform, action, weight).await;
        Ok(())
    }

    pub async fn engagement(&self, id: EngagementId) -> Result<Option<Engagement>> {
        self.storage.engagement(id).await
    }

    /// Flip `validated` and compute the payout from the user's *entire*
    /// accumulated score. The flag transition happens even when the payout
    /// is 0. The score reset and the mint belong to the coordinator;
    /// authorization is enforced at that entry point.
    ///
    /// Any unvalidated engagement can redeem the user's whole pending
    /// balance. Two back-to-back validations for one user each see what
    /// the accumulator holds at their turn.
    pub async fn validate(&self, id: EngagementId) -> Result<Validation> {
        let mut engagement = self
            .storage
            .engagement(id)
            .await?
            .ok_or(EngageError::NotFound(id))?;

        if engagement.validated {
            return Err(EngageError::AlreadyValidated(id));
        }

        engagement.validated = true;
        let user = engagement.user;
        self.storage.put_engagement(engagement).await?;

        let accumulated = self.storage.score(user).await?;
        let payout = accumulated / CONVERSION_RATE;

        info!(
            engagement_id = %id,
            user = %user,
            accumulated = accumulated,
            payout = payout,
            "✅ Engagement validated"
        );

        Ok(Validation { user, payout })
    }

    /// Zero the accumulator after a nonzero payout has been minted.
    pub async fn reset_score(&self, user: UserId) -> Result<()> {
        self.storage.set_score(user, 0).await
    }

    pub async fn begin_transaction(&self) -> Result<()> {
        self.storage.begin_transaction().await
    }

    pub async fn commit_transaction(&self) -> Result<()> {
        self.storage.commit_transaction().await
    }

    pub async fn rollback_transaction(&self) -> Result<()> {
        self.storage.rollback_transaction().await
    }
}
