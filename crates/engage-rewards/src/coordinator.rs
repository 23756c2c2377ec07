use crate::token::TokenLedger;
use chrono::Utc;
use engage_ledger::EngagementLedger;
use engage_types::{
    Capability, CoreEvent, EngageError, EngagementId, EventBus, Result, RoleGate, UserId,
};
use engage_wallet::WalletRegistry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

/// Orchestrates the validate → provision → mint → reset transition.
///
/// The three mutating steps run inside snapshot transactions on the
/// ledger and wallet stores: either all of them commit or none do.
pub struct RewardCoordinator {
    ledger: Arc<EngagementLedger>,
    wallets: Arc<WalletRegistry>,
    token: Arc<dyn TokenLedger>,
    gate: Arc<dyn RoleGate>,
    events: EventBus,
    busy: AtomicBool,
}

/// Clears the busy flag on every exit path, including early returns.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl RewardCoordinator {
    pub fn new(
        ledger: Arc<EngagementLedger>,
        wallets: Arc<WalletRegistry>,
        token: Arc<dyn TokenLedger>,
        gate: Arc<dyn RoleGate>,
        events: EventBus,
    ) -> Self {
        Self {
            ledger,
            wallets,
            token,
            gate,
            events,
            busy: AtomicBool::new(false),
        }
    }

    /// Validate `id` and, for a nonzero payout, provision the user's
    /// parent wallet if missing, mint the scaled payout and reset the
    /// accumulator. Admin-gated, single in-flight invocation.
    ///
    /// Returns the whole-token payout (0 when the accumulator held less
    /// than one conversion unit; the validated flag still commits).
    pub async fn validate_and_reward(&self, caller: UserId, id: EngagementId) -> Result<u64> {
        self.gate.require(caller, Capability::Admin).await?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngageError::ReentrantCall);
        }
        let _guard = BusyGuard(&self.busy);

        self.ledger.begin_transaction().await?;
        self.wallets.begin_transaction().await?;

        match self.settle(id).await {
            Ok(payout) => {
                self.ledger.commit_transaction().await?;
                self.wallets.commit_transaction().await?;
                Ok(payout)
            }
            Err(e) => {
                // Both stores must be rolled back even if one refuses;
                // the settle error is the one the caller acts on.
                if let Err(rollback_err) = self.ledger.rollback_transaction().await {
                    error!(error = %rollback_err, "❌ Ledger rollback failed");
                }
                if let Err(rollback_err) = self.wallets.rollback_transaction().await {
                    error!(error = %rollback_err, "❌ Wallet rollback failed");
                }
                Err(e)
            }
        }
    }

    async fn settle(&self, id: EngagementId) -> Result<u64> {
        let validation = self.ledger.validate(id).await?;
        let user = validation.user;

        if validation.payout == 0 {
            info!(
                engagement_id = %id,
                user = %user,
                "✅ Validation committed with zero payout"
            );
            return Ok(0);
        }

        let wallet_id = self.wallets.ensure_parent(user).await?;

        let base_units = validation
            .payout
            .checked_mul(10u64.pow(self.token.decimals()))
            .ok_or_else(|| EngageError::Storage("payout overflow in base units".to_string()))?;
        self.token.mint(user, base_units).await?;

        self.ledger.reset_score(user).await?;

        self.events.emit(CoreEvent::RewardIssued {
            user,
            payout: validation.payout,
            base_units,
            timestamp: Utc::now(),
        });

        info!(
            engagement_id = %id,
            user = %user,
            wallet_id = %wallet_id,
            payout = validation.payout,
            base_units = base_units,
            "🏆 Reward issued"
        );

        Ok(validation.payout)
    }
}
