use async_trait::async_trait;
use engage_types::{Capability, EngageError, Result, RoleGate, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// In-memory capability store behind the [`RoleGate`] seam.
///
/// A fixed root admin is set at construction; grants and revocations are
/// themselves admin-gated.
pub struct RoleStore {
    root: UserId,
    members: Arc<RwLock<HashMap<Capability, HashSet<UserId>>>>,
}

impl RoleStore {
    pub fn new(root: UserId) -> Self {
        Self {
            root,
            members: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn grant(&self, caller: UserId, capability: Capability, user: UserId) -> Result<()> {
        self.require(caller, Capability::Admin).await?;

        let mut members = self.members.write().await;
        members.entry(capability).or_default().insert(user);

        info!(
            granted_by = %caller,
            user = %user,
            capability = ?capability,
            "🔑 Capability granted"
        );
        Ok(())
    }

    pub async fn revoke(&self, caller: UserId, capability: Capability, user: UserId) -> Result<()> {
        self.require(caller, Capability::Admin).await?;

        let mut members = self.members.write().await;
        if let Some(set) = members.get_mut(&capability) {
            set.remove(&user);
        }

        info!(
            revoked_by = %caller,
            user = %user,
            capability = ?capability,
            "🔑 Capability revoked"
        );
        Ok(())
    }

    pub async fn holds(&self, user: UserId, capability: Capability) -> bool {
        if capability == Capability::Admin && user == self.root {
            return true;
        }
        let members = self.members.read().await;
        members
            .get(&capability)
            .map(|set| set.contains(&user))
            .unwrap_or(false)
    }
}

#[async_trait]
impl RoleGate for RoleStore {
    async fn require(&self, caller: UserId, capability: Capability) -> Result<()> {
        if self.holds(caller, capability).await {
            Ok(())
        } else {
            Err(EngageError::Unauthorized { caller, capability })
        }
    }
}
