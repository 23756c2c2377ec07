use crate::address::WalletAddress;
use crate::derivation::derive_address;
use crate::storage::WalletStorage;
use chrono::{DateTime, Utc};
use engage_types::{
    Capability, CoreEvent, EngageError, EventBus, Result, RoleGate, UserId, WalletId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletRole {
    Parent,
    Child,
}

/// One custodial account record. Immutable after creation, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub address: WalletAddress,
    pub owner: UserId,
    pub parent: Option<WalletId>,
    pub role: WalletRole,
    pub created_at: DateTime<Utc>,
}

/// Hierarchical identity store: one parent wallet per owner, any number
/// of child wallets linked to a parent.
pub struct WalletRegistry {
    storage: Arc<dyn WalletStorage>,
    gate: Arc<dyn RoleGate>,
    events: EventBus,
}

impl WalletRegistry {
    pub fn new(storage: Arc<dyn WalletStorage>, gate: Arc<dyn RoleGate>, events: EventBus) -> Self {
        Self {
            storage,
            gate,
            events,
        }
    }

    /// Provision the single root wallet for `owner`. Admin-gated.
    pub async fn create_parent(&self, caller: UserId, owner: UserId) -> Result<WalletId> {
        self.gate.require(caller, Capability::Admin).await?;
        self.create_parent_unchecked(owner).await
    }

    /// Provision a child wallet under `parent_id`. Minter-gated.
    pub async fn create_child(
        &self,
        caller: UserId,
        parent_id: WalletId,
        owner: UserId,
    ) -> Result<WalletId> {
        self.gate.require(caller, Capability::Minter).await?;

        if self.storage.wallet(parent_id).await?.is_none() {
            return Err(EngageError::ParentNotFound(parent_id));
        }

        let id = self.storage.allocate_wallet_id().await?;
        let salt = Utc::now().timestamp();
        let address = derive_address(&owner, salt, id);

        self.storage
            .put_wallet(Wallet {
                id,
                address,
                owner,
                parent: Some(parent_id),
                role: WalletRole::Child,
                created_at: Utc::now(),
            })
            .await?;
        self.storage.push_child(parent_id, id).await?;

        self.emit_created(id, &address, owner, Some(parent_id));

        info!(
            wallet_id = %id,
            parent_id = %parent_id,
            owner = %owner,
            address = %address,
            "👛 Child wallet created"
        );

        Ok(id)
    }

    /// Return the owner's parent wallet id, provisioning one if missing.
    /// Internal step of reward issuance; the coordinator's entry point
    /// carries the capability check.
    pub async fn ensure_parent(&self, owner: UserId) -> Result<WalletId> {
        match self.storage.parent_of(owner).await? {
            Some(id) => Ok(id),
            None => self.create_parent_unchecked(owner).await,
        }
    }

    async fn create_parent_unchecked(&self, owner: UserId) -> Result<WalletId> {
        if let Some(existing) = self.storage.parent_of(owner).await? {
            return Err(EngageError::DuplicateParent { owner, existing });
        }

        let id = self.storage.allocate_wallet_id().await?;
        let salt = Utc::now().timestamp();
        let address = derive_address(&owner, salt, id);

        self.storage
            .put_wallet(Wallet {
                id,
                address,
                owner,
                parent: None,
                role: WalletRole::Parent,
                created_at: Utc::now(),
            })
            .await?;
        self.storage.index_parent(owner, id).await?;

        self.emit_created(id, &address, owner, None);

        info!(
            wallet_id = %id,
            owner = %owner,
            address = %address,
            "👛 Parent wallet created"
        );

        Ok(id)
    }

    fn emit_created(
        &self,
        id: WalletId,
        address: &WalletAddress,
        owner: UserId,
        parent_id: Option<WalletId>,
    ) {
        self.events.emit(CoreEvent::WalletCreated {
            wallet_id: id,
            address: address.to_string(),
            owner,
            parent_id,
            timestamp: Utc::now(),
        });
    }

    /// Child wallet ids under `parent_id`, in creation order.
    pub async fn children(&self, parent_id: WalletId) -> Result<Vec<WalletId>> {
        self.storage.children(parent_id).await
    }

    /// True iff a parent wallet is recorded for `owner`.
    pub async fn wallet_exists(&self, owner: UserId) -> Result<bool> {
        Ok(self.storage.parent_of(owner).await?.is_some())
    }

    pub async fn parent_of(&self, owner: UserId) -> Result<Option<WalletId>> {
        self.storage.parent_of(owner).await
    }

    pub async fn wallet(&self, id: WalletId) -> Result<Option<Wallet>> {
        self.storage.wallet(id).await
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
