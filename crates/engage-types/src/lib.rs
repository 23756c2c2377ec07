pub mod error;
pub mod events;
pub mod id;
pub mod roles;

pub use error::{EngageError, Result};
pub use events::{CoreEvent, EventBus};
pub use id::{EngagementId, UserId, WalletId};
pub use roles::{Capability, RoleGate};
