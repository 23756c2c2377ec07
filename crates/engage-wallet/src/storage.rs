use crate::registry::Wallet;
use async_trait::async_trait;
use engage_types::{Result, UserId, WalletId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

type WalletMap = HashMap<WalletId, Wallet>;
type ParentIndex = HashMap<UserId, WalletId>;
type ChildIndex = HashMap<WalletId, Vec<WalletId>>;
type RegistryBackup = Option<(WalletMap, ParentIndex, ChildIndex, u64)>;

/// Storage backend for the wallet registry.
///
/// Owns the wallet set, the owner-to-parent index, the parent-to-children
/// index (insertion order preserved) and the id counter.
#[async_trait]
pub trait WalletStorage: Send + Sync {
    async fn wallet(&self, id: WalletId) -> Result<Option<Wallet>>;
    async fn put_wallet(&self, wallet: Wallet) -> Result<()>;
    async fn allocate_wallet_id(&self) -> Result<WalletId>;

    async fn parent_of(&self, owner: UserId) -> Result<Option<WalletId>>;
    async fn index_parent(&self, owner: UserId, id: WalletId) -> Result<()>;

    async fn children(&self, parent: WalletId) -> Result<Vec<WalletId>>;
    async fn push_child(&self, parent: WalletId, child: WalletId) -> Result<()>;

    async fn begin_transaction(&self) -> Result<()>;
    async fn commit_transaction(&self) -> Result<()>;
    async fn rollback_transaction(&self) -> Result<()>;
}

/// In-memory backend with clone-snapshot transactions.
pub struct MemoryWalletStorage {
    wallets: Arc<RwLock<WalletMap>>,
    parents: Arc<RwLock<ParentIndex>>,
    child_lists: Arc<RwLock<ChildIndex>>,
    next_id: Arc<RwLock<u64>>,
    backup: Arc<RwLock<RegistryBackup>>,
}

impl MemoryWalletStorage {
    pub fn new() -> Self {
        Self {
            wallets: Arc::new(RwLock::new(HashMap::new())),
            parents: Arc::new(RwLock::new(HashMap::new())),
            child_lists: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(0)),
            backup: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for MemoryWalletStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletStorage for MemoryWalletStorage {
    async fn wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        let wallets = self.wallets.read().await;
        Ok(wallets.get(&id).cloned())
    }

    async fn put_wallet(&self, wallet: Wallet) -> Result<()> {
        let mut wallets = self.wallets.write().await;
        wallets.insert(wallet.id, wallet);
        Ok(())
    }

    async fn allocate_wallet_id(&self) -> Result<WalletId> {
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        Ok(WalletId::new(*next_id))
    }

    async fn parent_of(&self, owner: UserId) -> Result<Option<WalletId>> {
        let parents = self.parents.read().await;
        Ok(parents.get(&owner).copied())
    }

    async fn index_parent(&self, owner: UserId, id: WalletId) -> Result<()> {
        let mut parents = self.parents.write().await;
        parents.insert(owner, id);
        Ok(())
    }

    async fn children(&self, parent: WalletId) -> Result<Vec<WalletId>> {
        let child_lists = self.child_lists.read().await;
        Ok(child_lists.get(&parent).cloned().unwrap_or_default())
    }

    async fn push_child(&self, parent: WalletId, child: WalletId) -> Result<()> {
        let mut child_lists = self.child_lists.write().await;
        child_lists.entry(parent).or_default().push(child);
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<()> {
        let wallets = self.wallets.read().await;
        let parents = self.parents.read().await;
        let child_lists = self.child_lists.read().await;
        let next_id = self.next_id.read().await;

        let mut backup = self.backup.write().await;
        *backup = Some((
            wallets.clone(),
            parents.clone(),
            child_lists.clone(),
            *next_id,
        ));

        debug!(
            wallet_count = wallets.len(),
            storage_type = "memory",
            "📝 Registry transaction began (snapshot created)"
        );
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;
        *backup = None;
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;

        if let Some((wallet_backup, parent_backup, child_backup, id_backup)) = backup.take() {
            let mut wallets = self.wallets.write().await;
            let mut parents = self.parents.write().await;
            let mut child_lists = self.child_lists.write().await;
            let mut next_id = self.next_id.write().await;

            *wallets = wallet_backup;
            *parents = parent_backup;
            *child_lists = child_backup;
            *next_id = id_backup;

            info!(
                storage_type = "memory",
                "❌ Registry transaction rolled back (snapshot restored)"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derivation::derive_address;
    use crate::registry::WalletRole;

    fn wallet(id: u64, owner: UserId, parent: Option<WalletId>) -> Wallet {
        let wallet_id = WalletId::new(id);
        Wallet {
            id: wallet_id,
            address: derive_address(&owner, 0, wallet_id),
            owner,
            parent,
            role: if parent.is_some() {
                WalletRole::Child
            } else {
                WalletRole::Parent
            },
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_id_allocation_starts_at_one() {
        let storage = MemoryWalletStorage::new();
        assert_eq!(
            storage.allocate_wallet_id().await.unwrap(),
            WalletId::new(1)
        );
    }

    #[tokio::test]
    async fn test_child_index_preserves_insertion_order() {
        let storage = MemoryWalletStorage::new();
        let parent = WalletId::new(1);

        for child in [5, 3, 9] {
            storage
                .push_child(parent, WalletId::new(child))
                .await
                .unwrap();
        }

        assert_eq!(
            storage.children(parent).await.unwrap(),
            vec![WalletId::new(5), WalletId::new(3), WalletId::new(9)]
        );
    }

    #[tokio::test]
    async fn test_rollback_restores_all_indexes() {
        let storage = MemoryWalletStorage::new();
        let owner = UserId::from_bytes([1; 32]);

        storage.begin_transaction().await.unwrap();

        let id = storage.allocate_wallet_id().await.unwrap();
        storage.put_wallet(wallet(id.get(), owner, None)).await.unwrap();
        storage.index_parent(owner, id).await.unwrap();
        storage.push_child(id, WalletId::new(2)).await.unwrap();

        storage.rollback_transaction().await.unwrap();

        assert!(storage.wallet(id).await.unwrap().is_none());
        assert!(storage.parent_of(owner).await.unwrap().is_none());
        assert!(storage.children(id).await.unwrap().is_empty());
        assert_eq!(storage.allocate_wallet_id().await.unwrap(), id);
    }
}
