pub mod address;
pub mod derivation;
pub mod registry;
pub mod storage;

pub use address::WalletAddress;
pub use derivation::derive_address;
pub use registry::{Wallet, WalletRegistry, WalletRole};
pub use storage::{MemoryWalletStorage, WalletStorage};
