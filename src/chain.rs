//! Block integrity
//!
//! Assembles accepted work into hash-chained blocks and verifies them.
//! A block's Merkle root and hash are pure functions of the referenced
//! items' leaf hashes and the header fields; verification recomputes both
//! and accepts only an exact match.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::crypto::{self, pad_digest, DIGEST_WIDTH};
use crate::models::{Block, WorkItem};
use crate::storage::Storage;

/// Previous hash of the genesis block.
const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Default ceiling on nonce search attempts.
const DEFAULT_NONCE_CEILING: u64 = 1_000_000;

/// Default tolerance when re-checking a block's total value.
const DEFAULT_VALUE_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Nonce search gives up after this many attempts and returns the
    /// ceiling itself; the caller decides whether to retry.
    pub nonce_ceiling: u64,
    /// Tolerance for the total-value check during verification.
    pub value_epsilon: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            nonce_ceiling: DEFAULT_NONCE_CEILING,
            value_epsilon: DEFAULT_VALUE_EPSILON,
        }
    }
}

/// Block header fields that exist before the nonce is known.
#[derive(Debug, Clone)]
pub struct BlockHeader {
    pub index: u64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub signatures: String,
    pub total_scientific_value: f64,
}

impl BlockHeader {
    pub fn from_items(index: u64, previous_hash: String, items: &[WorkItem]) -> Self {
        let leaves: Vec<String> = items.iter().map(WorkItem::integrity_hash).collect();
        Self {
            index,
            previous_hash,
            merkle_root: crypto::merkle_root(&leaves),
            signatures: items.iter().map(|w| w.signature.as_str()).collect(),
            total_scientific_value: items.iter().map(|w| w.scientific_value).sum(),
        }
    }

    /// Block hash for a candidate nonce, left-padded to the digest width.
    pub fn hash_with_nonce(&self, nonce: u64) -> String {
        pad_digest(&crypto::hash(&format!(
            "{}{}{}{}{}{:.2}",
            self.index,
            self.previous_hash,
            self.merkle_root,
            nonce,
            self.signatures,
            self.total_scientific_value,
        )))
    }
}

pub struct BlockIntegrityEngine {
    storage: Arc<dyn Storage>,
    config: ChainConfig,
    /// Exclusive section around index allocation and persistence, keeping
    /// block indices monotonic and non-overlapping.
    assembly_lock: Mutex<()>,
}

impl BlockIntegrityEngine {
    pub fn new(storage: Arc<dyn Storage>, config: ChainConfig) -> Self {
        Self {
            storage,
            config,
            assembly_lock: Mutex::new(()),
        }
    }

    /// Assemble a block from ordered work items. Pure: no storage access.
    pub fn build_block(
        &self,
        index: u64,
        previous_hash: &str,
        items: &[WorkItem],
        nonce: u64,
        miner_id: &str,
        difficulty: u32,
    ) -> Block {
        let header = BlockHeader::from_items(index, previous_hash.to_string(), items);
        Block {
            index,
            previous_hash: previous_hash.to_string(),
            merkle_root: header.merkle_root.clone(),
            difficulty,
            nonce,
            block_hash: header.hash_with_nonce(nonce),
            miner_id: miner_id.to_string(),
            total_scientific_value: header.total_scientific_value,
            work_refs: items.iter().map(|w| w.id.clone()).collect(),
            sealed_at: Utc::now(),
        }
    }

    /// Brute-force the first nonce whose block hash carries the required
    /// leading zeros (target length = difficulty / 4).
    ///
    /// Bounded: returns the ceiling itself when no qualifying nonce exists
    /// within it. That is a defined degradation, not an error.
    pub fn find_nonce(&self, header: &BlockHeader, difficulty: u32) -> u64 {
        let target_len = (difficulty / 4) as usize;
        if target_len == 0 {
            return 0;
        }
        if target_len > DIGEST_WIDTH {
            // No digest can satisfy the target; skip the futile search.
            return self.config.nonce_ceiling;
        }

        let target = "0".repeat(target_len);
        for nonce in 0..self.config.nonce_ceiling {
            if header.hash_with_nonce(nonce).starts_with(&target) {
                debug!(index = header.index, nonce, target_len, "nonce found");
                return nonce;
            }
        }
        debug!(
            index = header.index,
            ceiling = self.config.nonce_ceiling,
            target_len,
            "nonce search exhausted"
        );
        self.config.nonce_ceiling
    }

    /// Recompute a block's Merkle root, hash, and value total from the
    /// given items and compare against the stored fields.
    pub fn verify_block(&self, block: &Block, items: &[WorkItem]) -> bool {
        let expected_refs: Vec<&str> = items.iter().map(|w| w.id.as_str()).collect();
        if block.work_refs.len() != expected_refs.len()
            || block.work_refs.iter().map(String::as_str).ne(expected_refs)
        {
            return false;
        }

        let header = BlockHeader::from_items(block.index, block.previous_hash.clone(), items);
        let merkle_matches = header.merkle_root == block.merkle_root;
        let hash_matches = header.hash_with_nonce(block.nonce) == block.block_hash;
        let value_matches = (header.total_scientific_value - block.total_scientific_value).abs()
            <= self.config.value_epsilon;

        merkle_matches && hash_matches && value_matches
    }

    /// Seal the next block from accepted work items.
    ///
    /// Runs under a short-lived exclusive section: the next index is read
    /// and the block persisted without interleaving, so indices stay
    /// monotonic. An index collision from a competing writer is fatal and
    /// propagates.
    pub async fn seal_block(
        &self,
        items: &[WorkItem],
        miner_id: &str,
        difficulty: u32,
    ) -> Result<Block> {
        let _guard = self.assembly_lock.lock().await;

        let (index, previous_hash) = match self
            .storage
            .get_recent_blocks(1)
            .await
            .context("reading chain tip")?
            .first()
        {
            Some(tip) => (tip.index + 1, tip.block_hash.clone()),
            None => (0, GENESIS_PREVIOUS_HASH.to_string()),
        };

        let header = BlockHeader::from_items(index, previous_hash.clone(), items);
        let nonce = self.find_nonce(&header, difficulty);
        let block = self.build_block(index, &previous_hash, items, nonce, miner_id, difficulty);

        self.storage
            .append_block(block.clone())
            .await
            .with_context(|| format!("sealing block {index}"))?;

        info!(
            index,
            items = items.len(),
            total_value = block.total_scientific_value,
            nonce,
            "block sealed"
        );
        Ok(block)
    }
}
