use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier for an external user principal.
///
/// The pipeline never interprets the bytes; they come from whatever
/// authentication layer sits in front of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId([u8; 32]);

impl UserId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

/// Identifier of a recorded engagement. The first allocated id is 1;
/// absence is always expressed as `Option`, never a zero sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EngagementId(u64);

impl EngagementId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EngagementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a wallet record. Allocation starts at 1, same as
/// [`EngagementId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletId(u64);

impl WalletId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display_is_shortened() {
        let user = UserId::from_bytes([0xAB; 32]);
        assert_eq!(user.to_string(), "0xabababababababab");
        assert_eq!(user.to_hex().len(), 64);
    }

    #[test]
    fn test_ids_are_ordered() {
        assert!(EngagementId::new(1) < EngagementId::new(2));
        assert!(WalletId::new(9) > WalletId::new(8));
    }
}
