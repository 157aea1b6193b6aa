use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditRecordType {
    /// Backfilled ledger entry for a single validation vote.
    ValidationVote,
    /// Terminal consensus decision for a work item.
    ConsensusDecision,
}

/// Immutable audit ledger entry.
///
/// Records are append-only: once written they are never modified or
/// deleted. `activity_hash` is unique across the ledger, which is what
/// makes backfill idempotent, and `previous_record_hash` links each record
/// to the prior one in its work's chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: String,
    pub record_type: AuditRecordType,
    /// Unique digest of the audited activity.
    pub activity_hash: String,
    pub validation_vote_id: Option<String>,
    pub work_id: Option<String>,
    pub block_id: Option<String>,
    pub previous_record_hash: Option<String>,
    pub merkle_root: String,
    /// Hex Ed25519 auditor signature over the activity hash.
    pub signature: String,
    pub reputation_impact: f64,
    pub stake_impact: f64,
    pub is_verified: bool,
    pub immutable_since: DateTime<Utc>,
}

impl AuditRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        record_type: AuditRecordType,
        activity_hash: String,
        validation_vote_id: Option<String>,
        work_id: Option<String>,
        previous_record_hash: Option<String>,
        merkle_root: String,
        signature: String,
        reputation_impact: f64,
        stake_impact: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            record_type,
            activity_hash,
            validation_vote_id,
            work_id,
            block_id: None,
            previous_record_hash,
            merkle_root,
            signature,
            reputation_impact,
            stake_impact,
            is_verified: true,
            immutable_since: Utc::now(),
        }
    }
}
