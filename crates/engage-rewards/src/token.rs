use async_trait::async_trait;
use engage_types::{EngageError, Result, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Base units per whole token on the in-memory ledger
pub const TOKEN_DECIMALS: u32 = 9;

/// Boundary contract of the external fungible token ledger. The core only
/// calls it; its correctness is assumed.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    async fn mint(&self, account: UserId, base_units: u64) -> Result<()>;
    async fn burn(&self, account: UserId, base_units: u64) -> Result<()>;
    async fn balance_of(&self, account: UserId) -> u64;
    fn decimals(&self) -> u32;
}

/// In-memory token ledger for tests and embedding. A failure toggle lets
/// rollback paths be exercised deterministically.
pub struct MemoryTokenLedger {
    balances: Arc<RwLock<HashMap<UserId, u64>>>,
    reject_mints: AtomicBool,
}

impl MemoryTokenLedger {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            reject_mints: AtomicBool::new(false),
        }
    }

    /// Make every subsequent mint fail with `ExternalRejected`.
    pub fn set_reject_mints(&self, reject: bool) {
        self.reject_mints.store(reject, Ordering::SeqCst);
    }
}

impl Default for MemoryTokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenLedger for MemoryTokenLedger {
    async fn mint(&self, account: UserId, base_units: u64) -> Result<()> {
        if self.reject_mints.load(Ordering::SeqCst) {
            return Err(EngageError::ExternalRejected(
                "mint rejected by token ledger".to_string(),
            ));
        }

        let mut balances = self.balances.write().await;
        let current = balances.get(&account).copied().unwrap_or(0);
        let updated = current
            .checked_add(base_units)
            .ok_or_else(|| EngageError::ExternalRejected("balance overflow".to_string()))?;
        balances.insert(account, updated);

        info!(
            account = %account,
            base_units = base_units,
            balance_after = updated,
            "💰 Tokens minted"
        );
        Ok(())
    }

    async fn burn(&self, account: UserId, base_units: u64) -> Result<()> {
        let mut balances = self.balances.write().await;
        let current = balances.get(&account).copied().unwrap_or(0);
        let updated = current.checked_sub(base_units).ok_or_else(|| {
            EngageError::ExternalRejected(format!(
                "insufficient balance: has {}, burning {}",
                current, base_units
            ))
        })?;

        if updated == 0 {
            balances.remove(&account);
        } else {
            balances.insert(account, updated);
        }

        info!(
            account = %account,
            base_units = base_units,
            balance_after = updated,
            "💸 Tokens burned"
        );
        Ok(())
    }

    async fn balance_of(&self, account: UserId) -> u64 {
        let balances = self.balances.read().await;
        balances.get(&account).copied().unwrap_or(0)
    }

    fn decimals(&self) -> u32 {
        TOKEN_DECIMALS
    }
}
