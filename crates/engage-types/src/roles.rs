use crate::error::Result;
use crate::id::UserId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Capabilities required by the pipeline's mutating entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Grants, metric updates, reward issuance and parent wallet creation
    Admin,
    /// Recording engagements on behalf of external platforms
    Oracle,
    /// Child wallet creation
    Minter,
}

/// Policy-evaluation seam invoked at each entry point.
///
/// Storage components stay decoupled from the enforcement mechanism so
/// the gate can be swapped or mocked in tests.
#[async_trait]
pub trait RoleGate: Send + Sync {
    /// Returns `Ok(())` iff `caller` holds `capability`, otherwise
    /// [`crate::EngageError::Unauthorized`]. Never mutates state.
    async fn require(&self, caller: UserId, capability: Capability) -> Result<()>;
}
