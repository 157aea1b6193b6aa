//! Storage boundary
//!
//! The core consumes work records, votes, stakers, audit records, and
//! blocks through this trait and emits its artifacts back through it.
//! The backing technology is a collaborator concern; an in-memory store
//! ships for tests and embedding.
//!
//! Only two storage conditions are fatal to an operation: the store being
//! unreachable and a block index collision. Both surface as typed errors;
//! everything else the core does degrades gracefully.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AuditRecord, Block, Staker, ValidationVote, WorkItem};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unreachable: {0}")]
    Unreachable(String),
    #[error("block index {0} already exists")]
    IndexCollision(u64),
    #[error("audit record for activity {0} already exists")]
    DuplicateActivity(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_work_item(&self, id: &str) -> StorageResult<Option<WorkItem>>;
    /// Persist a work item. Items are immutable once stored.
    async fn put_work_item(&self, item: WorkItem) -> StorageResult<()>;

    async fn get_validation_votes_for_work(&self, work_id: &str)
        -> StorageResult<Vec<ValidationVote>>;
    /// Append a vote. Votes are append-only; superseding is by timestamp.
    async fn put_validation_vote(&self, vote: ValidationVote) -> StorageResult<()>;
    async fn all_validation_votes(&self) -> StorageResult<Vec<ValidationVote>>;

    async fn get_staker(&self, id: &str) -> StorageResult<Option<Staker>>;
    async fn put_staker(&self, staker: Staker) -> StorageResult<()>;
    async fn get_active_stakers(&self) -> StorageResult<Vec<Staker>>;

    async fn get_recent_audit_records(&self, limit: usize) -> StorageResult<Vec<AuditRecord>>;
    /// Append an audit record, enforcing activity-hash uniqueness.
    async fn append_audit_record(&self, record: AuditRecord) -> StorageResult<()>;
    async fn has_audit_record_for_activity(&self, activity_hash: &str) -> StorageResult<bool>;
    /// Hash of the newest audit record in a work's chain, if any.
    async fn latest_record_hash_for_work(&self, work_id: &str) -> StorageResult<Option<String>>;

    async fn get_recent_blocks(&self, limit: usize) -> StorageResult<Vec<Block>>;
    /// Append a block; a reused index is a fatal collision.
    async fn append_block(&self, block: Block) -> StorageResult<()>;
}
