use crate::id::{EngagementId, UserId, WalletId};
use crate::roles::Capability;
use thiserror::Error;

/// Pipeline operation result type
pub type Result<T> = std::result::Result<T, EngageError>;

/// Errors shared across the engagement reward pipeline.
///
/// Every error aborts its operation wholesale; callers never observe
/// partially applied state.
#[derive(Debug, Error)]
pub enum EngageError {
    #[error("caller {caller} lacks capability {capability:?}")]
    Unauthorized {
        caller: UserId,
        capability: Capability,
    },

    #[error("engagement not found: {0}")]
    NotFound(EngagementId),

    #[error("engagement already validated: {0}")]
    AlreadyValidated(EngagementId),

    #[error("owner {owner} already has parent wallet {existing}")]
    DuplicateParent { owner: UserId, existing: WalletId },

    #[error("parent wallet not found: {0}")]
    ParentNotFound(WalletId),

    #[error("re-entrant call into a protected entry point")]
    ReentrantCall,

    #[error("token ledger rejected the operation: {0}")]
    ExternalRejected(String),

    #[error("insufficient stake: staked {staked}, requested {requested}")]
    InsufficientStake { staked: u64, requested: u64 },

    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("storage error: {0}")]
    Storage(String),
}
