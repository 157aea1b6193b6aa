//! In-memory storage
//!
//! Keeps every entity in `RwLock`-guarded maps. Used by the test suites
//! and by embedders that have not wired a persistent collaborator yet.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use super::{Storage, StorageError, StorageResult};
use crate::models::{AuditRecord, Block, Staker, ValidationVote, WorkItem};

#[derive(Default)]
pub struct InMemoryStore {
    work_items: RwLock<HashMap<String, WorkItem>>,
    votes: RwLock<Vec<ValidationVote>>,
    stakers: RwLock<HashMap<String, Staker>>,
    audit_records: RwLock<Vec<AuditRecord>>,
    activity_hashes: RwLock<HashSet<String>>,
    blocks: RwLock<BTreeMap<u64, Block>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn audit_record_count(&self) -> usize {
        self.audit_records.read().await.len()
    }
}

#[async_trait]
impl Storage for InMemoryStore {
    async fn get_work_item(&self, id: &str) -> StorageResult<Option<WorkItem>> {
        Ok(self.work_items.read().await.get(id).cloned())
    }

    async fn put_work_item(&self, item: WorkItem) -> StorageResult<()> {
        self.work_items.write().await.insert(item.id.clone(), item);
        Ok(())
    }

    async fn get_validation_votes_for_work(
        &self,
        work_id: &str,
    ) -> StorageResult<Vec<ValidationVote>> {
        Ok(self
            .votes
            .read()
            .await
            .iter()
            .filter(|v| v.work_id == work_id)
            .cloned()
            .collect())
    }

    async fn put_validation_vote(&self, vote: ValidationVote) -> StorageResult<()> {
        self.votes.write().await.push(vote);
        Ok(())
    }

    async fn all_validation_votes(&self) -> StorageResult<Vec<ValidationVote>> {
        Ok(self.votes.read().await.clone())
    }

    async fn get_staker(&self, id: &str) -> StorageResult<Option<Staker>> {
        Ok(self.stakers.read().await.get(id).cloned())
    }

    async fn put_staker(&self, staker: Staker) -> StorageResult<()> {
        self.stakers.write().await.insert(staker.id.clone(), staker);
        Ok(())
    }

    async fn get_active_stakers(&self) -> StorageResult<Vec<Staker>> {
        Ok(self
            .stakers
            .read()
            .await
            .values()
            .filter(|s| s.stake_amount > 0.0)
            .cloned()
            .collect())
    }

    async fn get_recent_audit_records(&self, limit: usize) -> StorageResult<Vec<AuditRecord>> {
        let records = self.audit_records.read().await;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn append_audit_record(&self, record: AuditRecord) -> StorageResult<()> {
        let mut hashes = self.activity_hashes.write().await;
        if !hashes.insert(record.activity_hash.clone()) {
            return Err(StorageError::DuplicateActivity(record.activity_hash));
        }
        self.audit_records.write().await.push(record);
        Ok(())
    }

    async fn has_audit_record_for_activity(&self, activity_hash: &str) -> StorageResult<bool> {
        Ok(self.activity_hashes.read().await.contains(activity_hash))
    }

    async fn latest_record_hash_for_work(&self, work_id: &str) -> StorageResult<Option<String>> {
        Ok(self
            .audit_records
            .read()
            .await
            .iter()
            .rev()
            .find(|r| r.work_id.as_deref() == Some(work_id))
            .map(|r| r.activity_hash.clone()))
    }

    async fn get_recent_blocks(&self, limit: usize) -> StorageResult<Vec<Block>> {
        let blocks = self.blocks.read().await;
        Ok(blocks.values().rev().take(limit).cloned().collect())
    }

    async fn append_block(&self, block: Block) -> StorageResult<()> {
        let mut blocks = self.blocks.write().await;
        if blocks.contains_key(&block.index) {
            return Err(StorageError::IndexCollision(block.index));
        }
        blocks.insert(block.index, block);
        Ok(())
    }
}
