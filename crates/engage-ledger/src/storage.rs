use crate::ledger::Engagement;
use async_trait::async_trait;
use engage_types::{EngagementId, Result, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

type ScoreMap = HashMap<UserId, u64>;
type EngagementMap = HashMap<EngagementId, Engagement>;
type LedgerBackup = Option<(EngagementMap, ScoreMap, u64)>;

/// Storage backend for the engagement ledger.
///
/// The id counter is owned by the backend and advanced in the same step
/// that hands out the id, so allocation never leaves gaps.
#[async_trait]
pub trait LedgerStorage: Send + Sync {
    async fn engagement(&self, id: EngagementId) -> Result<Option<Engagement>>;
    async fn put_engagement(&self, engagement: Engagement) -> Result<()>;
    async fn allocate_engagement_id(&self) -> Result<EngagementId>;

    async fn score(&self, user: UserId) -> Result<u64>;
    async fn set_score(&self, user: UserId, score: u64) -> Result<()>;

    async fn begin_transaction(&self) -> Result<()>;
    async fn commit_transaction(&self) -> Result<()>;
    async fn rollback_transaction(&self) -> Result<()>;
}

/// In-memory backend with clone-snapshot transactions.
pub struct MemoryLedgerStorage {
    engagements: Arc<RwLock<EngagementMap>>,
    scores: Arc<RwLock<ScoreMap>>,
    next_id: Arc<RwLock<u64>>,
    backup: Arc<RwLock<LedgerBackup>>,
}

impl MemoryLedgerStorage {
    pub fn new() -> Self {
        Self {
            engagements: Arc::new(RwLock::new(HashMap::new())),
            scores: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(RwLock::new(0)),
            backup: Arc::new(RwLock::new(None)),
        }
    }
}

impl Default for MemoryLedgerStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStorage for MemoryLedgerStorage {
    async fn engagement(&self, id: EngagementId) -> Result<Option<Engagement>> {
        let engagements = self.engagements.read().await;
        Ok(engagements.get(&id).cloned())
    }

    async fn put_engagement(&self, engagement: Engagement) -> Result<()> {
        let mut engagements = self.engagements.write().await;
        engagements.insert(engagement.id, engagement);
        Ok(())
    }

    async fn allocate_engagement_id(&self) -> Result<EngagementId> {
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        Ok(EngagementId::new(*next_id))
    }

    async fn score(&self, user: UserId) -> Result<u64> {
        let scores = self.scores.read().await;
        Ok(scores.get(&user).copied().unwrap_or(0))
    }

    async fn set_score(&self, user: UserId, score: u64) -> Result<()> {
        let mut scores = self.scores.write().await;
        let old_score = scores.get(&user).copied().unwrap_or(0);

        if score == 0 {
            scores.remove(&user);
        } else {
            scores.insert(user, score);
        }

        if old_score != score {
            debug!(
                user = %user,
                score_before = old_score,
                score_after = score,
                storage_type = "memory",
                "💾 Score stored"
            );
        }
        Ok(())
    }

    async fn begin_transaction(&self) -> Result<()> {
        let engagements = self.engagements.read().await;
        let scores = self.scores.read().await;
        let next_id = self.next_id.read().await;

        let mut backup = self.backup.write().await;
        *backup = Some((engagements.clone(), scores.clone(), *next_id));

        debug!(
            engagement_count = engagements.len(),
            scored_users = scores.len(),
            storage_type = "memory",
            "📝 Ledger transaction began (snapshot created)"
        );
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;
        *backup = None;
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut backup = self.backup.write().await;

        if let Some((engagement_backup, score_backup, id_backup)) = backup.take() {
            let mut engagements = self.engagements.write().await;
            let mut scores = self.scores.write().await;
            let mut next_id = self.next_id.write().await;

            *engagements = engagement_backup;
            *scores = score_backup;
            *next_id = id_backup;

            info!(
                storage_type = "memory",
                "❌ Ledger transaction rolled back (snapshot restored)"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engagement(id: u64, user: UserId, score: u64) -> Engagement {
        Engagement {
            id: EngagementId::new(id),
            user,
            platform: "twitter".to_string(),
            action: "like".to_string(),
            score,
            validated: false,
        }
    }

    #[tokio::test]
    async fn test_id_allocation_starts_at_one() {
        let storage = MemoryLedgerStorage::new();
        assert_eq!(
            storage.allocate_engagement_id().await.unwrap(),
            EngagementId::new(1)
        );
        assert_eq!(
            storage.allocate_engagement_id().await.unwrap(),
            EngagementId::new(2)
        );
    }

    #[tokio::test]
    async fn test_zero_score_removes_entry() {
        let storage = MemoryLedgerStorage::new();
        let user = UserId::from_bytes([1; 32]);

        storage.set_score(user, 50).await.unwrap();
        assert_eq!(storage.score(user).await.unwrap(), 50);

        storage.set_score(user, 0).await.unwrap();
        assert_eq!(storage.score(user).await.unwrap(), 0);
        assert!(storage.scores.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_rollback_restores_snapshot() {
        let storage = MemoryLedgerStorage::new();
        let user = UserId::from_bytes([2; 32]);

        storage.set_score(user, 100).await.unwrap();
        let id = storage.allocate_engagement_id().await.unwrap();
        storage
            .put_engagement(engagement(id.get(), user, 20))
            .await
            .unwrap();

        storage.begin_transaction().await.unwrap();
        storage.set_score(user, 0).await.unwrap();
        let id2 = storage.allocate_engagement_id().await.unwrap();
        storage
            .put_engagement(engagement(id2.get(), user, 30))
            .await
            .unwrap();
        storage.rollback_transaction().await.unwrap();

        assert_eq!(storage.score(user).await.unwrap(), 100);
        assert!(storage.engagement(id2).await.unwrap().is_none());
        // The counter rewinds with the snapshot, so no id gap appears
        assert_eq!(storage.allocate_engagement_id().await.unwrap(), id2);
    }

    #[tokio::test]
    async fn test_commit_discards_snapshot() {
        let storage = MemoryLedgerStorage::new();
        let user = UserId::from_bytes([3; 32]);

        storage.begin_transaction().await.unwrap();
        storage.set_score(user, 40).await.unwrap();
        storage.commit_transaction().await.unwrap();

        // A rollback after commit must not undo anything
        storage.rollback_transaction().await.unwrap();
        assert_eq!(storage.score(user).await.unwrap(), 40);
    }
}
