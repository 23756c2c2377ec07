use bech32::{Bech32, Hrp};
use engage_types::{EngageError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const WALLET_HRP: &str = "eng";

/// Opaque wallet handle computed by deterministic derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletAddress([u8; 32]);

impl WalletAddress {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_bech32(&self) -> Result<String> {
        let hrp = Hrp::parse(WALLET_HRP)
            .map_err(|e| EngageError::InvalidAddress(format!("invalid hrp: {}", e)))?;

        bech32::encode::<Bech32>(hrp, &self.0)
            .map_err(|e| EngageError::InvalidAddress(format!("failed to encode address: {}", e)))
    }

    pub fn from_bech32(address: &str) -> Result<Self> {
        let (hrp, data) = bech32::decode(address)
            .map_err(|e| EngageError::InvalidAddress(format!("failed to decode address: {}", e)))?;

        if hrp.as_str() != WALLET_HRP {
            return Err(EngageError::InvalidAddress(format!(
                "invalid address prefix: expected '{}', got '{}'",
                WALLET_HRP,
                hrp.as_str()
            )));
        }

        if data.len() != 32 {
            return Err(EngageError::InvalidAddress(format!(
                "invalid address length: expected 32 bytes, got {}",
                data.len()
            )));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&data);
        Ok(Self(bytes))
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_bech32() {
            Ok(addr) => write!(f, "{}", addr),
            // Fall back to hex if encoding fails (shouldn't happen in practice)
            Err(_) => write!(f, "0x{}", hex::encode(&self.0[..8])),
        }
    }
}
