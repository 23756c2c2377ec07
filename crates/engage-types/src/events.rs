//! Event types emitted by the pipeline for off-chain indexers.
//!
//! A bounded broadcast channel carries the events; emission never blocks
//! and never fails the originating operation when nobody is listening.

use crate::id::{EngagementId, UserId, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Events buffered per subscriber before old events are dropped
const EVENT_BUFFER: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum CoreEvent {
    /// An engagement was recorded and its weight added to the user score
    EngagementRecorded {
        id: EngagementId,
        user: UserId,
        platform: String,
        action: String,
        score: u64,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A validation paid out and reset the user's accumulated score
    RewardIssued {
        user: UserId,
        payout: u64,
        base_units: u64,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A parent or child wallet was provisioned
    WalletCreated {
        wallet_id: WalletId,
        address: String,
        owner: UserId,
        parent_id: Option<WalletId>,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },

    /// A user's staked balance changed
    StakeChanged {
        user: UserId,
        staked: u64,
        #[serde(with = "chrono::serde::ts_seconds")]
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast bus shared by the pipeline components.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.tx.subscribe()
    }

    /// Emit an event. A send error only means no subscriber is connected.
    pub fn emit(&self, event: CoreEvent) {
        if self.tx.send(event).is_err() {
            debug!("event dropped: no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
