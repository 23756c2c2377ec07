use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Lookup key for a platform weight entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricKey {
    pub platform: String,
    pub action: String,
}

impl MetricKey {
    pub fn new(platform: &str, action: &str) -> Self {
        Self {
            platform: platform.to_string(),
            action: action.to_string(),
        }
    }
}

/// Static weight table consulted by the scoring step.
///
/// Absence of an entry means weight 0 and is never an error; setting a
/// weight to 0 removes the entry.
pub struct MetricTable {
    weights: Arc<RwLock<HashMap<MetricKey, u64>>>,
}

impl MetricTable {
    pub fn new() -> Self {
        Self {
            weights: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Overwrite the weight for `(platform, action)` unconditionally.
    pub async fn set_weight(&self, platform: &str, action: &str, weight: u64) {
        let key = MetricKey::new(platform, action);
        let mut weights = self.weights.write().await;

        let previous = if weight == 0 {
            weights.remove(&key)
        } else {
            weights.insert(key, weight)
        };

        info!(
            platform = platform,
            action = action,
            weight_before = previous.unwrap_or(0),
            weight_after = weight,
            "📊 Platform weight updated"
        );
    }

    /// Pure lookup; returns 0 for any unknown key.
    pub async fn weight(&self, platform: &str, action: &str) -> u64 {
        let weights = self.weights.read().await;
        weights
            .get(&MetricKey::new(platform, action))
            .copied()
            .unwrap_or(0)
    }

    pub async fn len(&self) -> usize {
        self.weights.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.weights.read().await.is_empty()
    }
}

impl Default for MetricTable {
    fn default() -> Self {
        Self::new()
    }
}
