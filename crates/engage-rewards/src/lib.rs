pub mod coordinator;
pub mod roles;
pub mod staking;
pub mod token;

pub use coordinator::RewardCoordinator;
pub use roles::RoleStore;
pub use staking::StakingVault;
pub use token::{MemoryTokenLedger, TokenLedger, TOKEN_DECIMALS};

use engage_ledger::{EngagementLedger, MemoryLedgerStorage, MetricTable};
use engage_types::{EventBus, UserId};
use engage_wallet::{MemoryWalletStorage, WalletRegistry};
use std::sync::Arc;

/// Fully wired pipeline over in-memory backends.
pub struct RewardEngine {
    pub metrics: Arc<MetricTable>,
    pub ledger: Arc<EngagementLedger>,
    pub wallets: Arc<WalletRegistry>,
    pub roles: Arc<RoleStore>,
    pub staking: Arc<StakingVault>,
    pub coordinator: Arc<RewardCoordinator>,
    pub events: EventBus,
}

impl RewardEngine {
    pub fn new(root_admin: UserId, token: Arc<dyn TokenLedger>) -> Self {
        let events = EventBus::new();
        let roles = Arc::new(RoleStore::new(root_admin));
        let metrics = Arc::new(MetricTable::new());

        let ledger = Arc::new(EngagementLedger::new(
            Arc::new(MemoryLedgerStorage::new()),
            metrics.clone(),
            roles.clone(),
            events.clone(),
        ));

        let wallets = Arc::new(WalletRegistry::new(
            Arc::new(MemoryWalletStorage::new()),
            roles.clone(),
            events.clone(),
        ));

        let staking = Arc::new(StakingVault::new(
            token.clone(),
            roles.clone(),
            events.clone(),
        ));

        let coordinator = Arc::new(RewardCoordinator::new(
            ledger.clone(),
            wallets.clone(),
            token,
            roles.clone(),
            events.clone(),
        ));

        Self {
            metrics,
            ledger,
            wallets,
            roles,
            staking,
            coordinator,
            events,
        }
    }
}
