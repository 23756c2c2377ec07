use crate::token::TokenLedger;
use chrono::Utc;
use engage_types::{Capability, CoreEvent, EngageError, EventBus, Result, RoleGate, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Anti-Sybil stake accounting keyed by user.
///
/// Staking burns tokens on the ledger into the vault's books; withdrawing
/// mints them back. Slashed stake simply disappears.
pub struct StakingVault {
    token: Arc<dyn TokenLedger>,
    gate: Arc<dyn RoleGate>,
    stakes: Arc<RwLock<HashMap<UserId, u64>>>,
    events: EventBus,
}

impl StakingVault {
    pub fn new(token: Arc<dyn TokenLedger>, gate: Arc<dyn RoleGate>, events: EventBus) -> Self {
        Self {
            token,
            gate,
            stakes: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    pub async fn stake(&self, user: UserId, amount: u64) -> Result<()> {
        self.token.burn(user, amount).await?;

        let mut stakes = self.stakes.write().await;
        let staked = stakes.get(&user).copied().unwrap_or(0).saturating_add(amount);
        stakes.insert(user, staked);

        self.events.emit(CoreEvent::StakeChanged {
            user,
            staked,
            timestamp: Utc::now(),
        });

        info!(user = %user, amount = amount, staked = staked, "🔒 Stake deposited");
        Ok(())
    }

    pub async fn withdraw(&self, user: UserId, amount: u64) -> Result<()> {
        // Deduct under the lock, then release it before calling out to
        // the token ledger so a collaborator can re-enter the vault.
        let remaining = {
            let mut stakes = self.stakes.write().await;
            let staked = stakes.get(&user).copied().unwrap_or(0);

            if staked < amount {
                return Err(EngageError::InsufficientStake {
                    staked,
                    requested: amount,
                });
            }

            let remaining = staked - amount;
            if remaining == 0 {
                stakes.remove(&user);
            } else {
                stakes.insert(user, remaining);
            }
            remaining
        };

        if let Err(e) = self.token.mint(user, amount).await {
            let mut stakes = self.stakes.write().await;
            let staked = stakes.get(&user).copied().unwrap_or(0).saturating_add(amount);
            stakes.insert(user, staked);
            warn!(user = %user, amount = amount, error = %e, "🔓 Withdrawal mint refused, stake restored");
            return Err(e);
        }

        self.events.emit(CoreEvent::StakeChanged {
            user,
            staked: remaining,
            timestamp: Utc::now(),
        });

        info!(user = %user, amount = amount, staked = remaining, "🔓 Stake withdrawn");
        Ok(())
    }

    /// Admin-gated punitive removal of staked balance.
    pub async fn slash(&self, caller: UserId, user: UserId, amount: u64) -> Result<()> {
        self.gate.require(caller, Capability::Admin).await?;

        let mut stakes = self.stakes.write().await;
        let staked = stakes.get(&user).copied().unwrap_or(0);

        if staked < amount {
            return Err(EngageError::InsufficientStake {
                staked,
                requested: amount,
            });
        }

        let remaining = staked - amount;
        if remaining == 0 {
            stakes.remove(&user);
        } else {
            stakes.insert(user, remaining);
        }

        self.events.emit(CoreEvent::StakeChanged {
            user,
            staked: remaining,
            timestamp: Utc::now(),
        });

        warn!(
            slashed_by = %caller,
            user = %user,
            amount = amount,
            staked = remaining,
            "⚔️ Stake slashed"
        );
        Ok(())
    }

    pub async fn staked_of(&self, user: UserId) -> u64 {
        let stakes = self.stakes.read().await;
        stakes.get(&user).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::RoleStore;
    use crate::token::MemoryTokenLedger;
    use async_trait::async_trait;
    use std::sync::{Mutex, OnceLock};

    fn user(byte: u8) -> UserId {
        UserId::from_bytes([byte; 32])
    }

    fn vault() -> (Arc<MemoryTokenLedger>, StakingVault, UserId) {
        let root = user(0);
        let token = Arc::new(MemoryTokenLedger::new());
        let vault = StakingVault::new(
            token.clone(),
            Arc::new(RoleStore::new(root)),
            EventBus::new(),
        );
        (token, vault, root)
    }

    #[tokio::test]
    async fn test_stake_and_withdraw() {
        let (token, vault, _) = vault();
        let alice = user(1);

        token.mint(alice, 100).await.unwrap();
        vault.stake(alice, 60).await.unwrap();

        assert_eq!(vault.staked_of(alice).await, 60);
        assert_eq!(token.balance_of(alice).await, 40);

        vault.withdraw(alice, 25).await.unwrap();
        assert_eq!(vault.staked_of(alice).await, 35);
        assert_eq!(token.balance_of(alice).await, 65);
    }

    #[tokio::test]
    async fn test_cannot_withdraw_more_than_staked() {
        let (token, vault, _) = vault();
        let alice = user(1);

        token.mint(alice, 100).await.unwrap();
        vault.stake(alice, 30).await.unwrap();

        let result = vault.withdraw(alice, 31).await;
        assert!(matches!(
            result,
            Err(EngageError::InsufficientStake { staked: 30, requested: 31 })
        ));
        assert_eq!(vault.staked_of(alice).await, 30);
    }

    #[tokio::test]
    async fn test_slash_is_admin_gated_and_bounded() {
        let (token, vault, root) = vault();
        let alice = user(1);

        token.mint(alice, 100).await.unwrap();
        vault.stake(alice, 50).await.unwrap();

        assert!(vault.slash(alice, alice, 10).await.is_err());
        assert!(matches!(
            vault.slash(root, alice, 51).await,
            Err(EngageError::InsufficientStake { .. })
        ));

        vault.slash(root, alice, 50).await.unwrap();
        assert_eq!(vault.staked_of(alice).await, 0);
        // Slashed tokens are gone, not returned
        assert_eq!(token.balance_of(alice).await, 50);
    }

    #[tokio::test]
    async fn test_stake_beyond_balance_fails() {
        let (token, vault, _) = vault();
        let alice = user(1);

        token.mint(alice, 10).await.unwrap();
        assert!(vault.stake(alice, 11).await.is_err());
        assert_eq!(vault.staked_of(alice).await, 0);
    }

    #[tokio::test]
    async fn test_rejected_withdrawal_mint_restores_stake() {
        let (token, vault, _) = vault();
        let alice = user(1);

        token.mint(alice, 100).await.unwrap();
        vault.stake(alice, 60).await.unwrap();

        token.set_reject_mints(true);
        let result = vault.withdraw(alice, 25).await;
        assert!(matches!(result, Err(EngageError::ExternalRejected(_))));
        assert_eq!(vault.staked_of(alice).await, 60);
        assert_eq!(token.balance_of(alice).await, 40);

        token.set_reject_mints(false);
        vault.withdraw(alice, 25).await.unwrap();
        assert_eq!(vault.staked_of(alice).await, 35);
        assert_eq!(token.balance_of(alice).await, 65);
    }

    /// Token ledger that reads the vault's books from inside `mint`,
    /// like a collaborator reacting to the withdrawal.
    struct ReflexiveTokenLedger {
        inner: MemoryTokenLedger,
        vault: OnceLock<Arc<StakingVault>>,
        seen: Mutex<Option<u64>>,
    }

    #[async_trait]
    impl TokenLedger for ReflexiveTokenLedger {
        async fn mint(&self, account: UserId, base_units: u64) -> Result<()> {
            if let Some(vault) = self.vault.get() {
                *self.seen.lock().unwrap() = Some(vault.staked_of(account).await);
            }
            self.inner.mint(account, base_units).await
        }

        async fn burn(&self, account: UserId, base_units: u64) -> Result<()> {
            self.inner.burn(account, base_units).await
        }

        async fn balance_of(&self, account: UserId) -> u64 {
            self.inner.balance_of(account).await
        }

        fn decimals(&self) -> u32 {
            self.inner.decimals()
        }
    }

    #[tokio::test]
    async fn test_withdraw_tolerates_ledger_calling_back_into_vault() {
        let root = user(0);
        let alice = user(1);
        let token = Arc::new(ReflexiveTokenLedger {
            inner: MemoryTokenLedger::new(),
            vault: OnceLock::new(),
            seen: Mutex::new(None),
        });
        let vault = Arc::new(StakingVault::new(
            token.clone(),
            Arc::new(RoleStore::new(root)),
            EventBus::new(),
        ));

        token.inner.mint(alice, 100).await.unwrap();
        vault.stake(alice, 60).await.unwrap();
        token.vault.set(vault.clone()).ok().unwrap();

        // The callback must not block on the stakes lock and must see
        // the deduction already applied.
        vault.withdraw(alice, 25).await.unwrap();
        assert_eq!(*token.seen.lock().unwrap(), Some(35));
        assert_eq!(vault.staked_of(alice).await, 35);
        assert_eq!(token.balance_of(alice).await, 65);
    }
}
