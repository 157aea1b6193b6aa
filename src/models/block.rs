use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One sealed block of accepted work.
///
/// `merkle_root` and `block_hash` are pure functions of the referenced
/// work items' leaf hashes and the header fields; recomputing them from the
/// same inputs must reproduce the stored values exactly. Blocks are never
/// mutated after sealing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Unique, monotonically increasing.
    pub index: u64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub difficulty: u32,
    pub nonce: u64,
    pub block_hash: String,
    pub miner_id: String,
    pub total_scientific_value: f64,
    /// Ids of the referenced work items, in Merkle leaf order.
    pub work_refs: Vec<String>,
    pub sealed_at: DateTime<Utc>,
}
