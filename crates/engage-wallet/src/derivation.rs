//! Deterministic wallet identity derivation.
//!
//! An address is a pure function of `(owner, freshness salt, allocated
//! id)`. The allocated id is unique per attempt, so two creations in the
//! same batch can never collide even with an identical salt. The salt
//! diversifies the derivation input across retries and is not a security
//! boundary.

use crate::address::WalletAddress;
use engage_types::{UserId, WalletId};

const DERIVATION_DOMAIN: &[u8] = b"engage-wallet-v1";

pub fn derive_address(owner: &UserId, salt: i64, wallet_id: WalletId) -> WalletAddress {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DERIVATION_DOMAIN);
    hasher.update(owner.as_bytes());
    hasher.update(&salt.to_le_bytes());
    hasher.update(&wallet_id.get().to_le_bytes());

    WalletAddress::from_bytes(*hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(byte: u8) -> UserId {
        UserId::from_bytes([byte; 32])
    }

    #[test]
    fn test_derivation_is_reproducible() {
        let owner = user(1);
        let a = derive_address(&owner, 1_700_000_000, WalletId::new(1));
        let b = derive_address(&owner, 1_700_000_000, WalletId::new(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_distinct_owners_same_batch_never_collide() {
        // Same salt simulates two creations in one transaction batch
        let salt = 1_700_000_000;
        let a = derive_address(&user(1), salt, WalletId::new(1));
        let b = derive_address(&user(2), salt, WalletId::new(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_allocated_id_alone_diversifies() {
        let owner = user(3);
        let salt = 42;
        let a = derive_address(&owner, salt, WalletId::new(1));
        let b = derive_address(&owner, salt, WalletId::new(2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_salt_diversifies() {
        let owner = user(4);
        let a = derive_address(&owner, 1, WalletId::new(1));
        let b = derive_address(&owner, 2, WalletId::new(1));
        assert_ne!(a, b);
    }
}
