//! Stake-weighted consensus and the immutable audit ledger
//!
//! Resolves each work item's acceptance from its votes, weighted by the
//! stake snapshot each vote carries, and keeps the append-only audit
//! ledger complete: every vote gets exactly one backfilled record, every
//! terminal decision gets one decision record. Backfill is idempotent —
//! re-running it after a successful pass creates nothing.
//!
//! Reputation lives here and only here: no other component mutates staker
//! reputation fields.

use anyhow::{Context, Result};
use dashmap::DashMap;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::crypto::{self, CryptoEngine};
use crate::models::{AuditRecord, AuditRecordType, ValidationVote, VoteStatus};
use crate::storage::Storage;

/// Stake share either side must clear for consensus.
const DEFAULT_APPROVAL_THRESHOLD_PCT: f64 = 51.0;

/// Signing identity for audit records.
const AUDITOR_ENTITY: &str = "consensus-auditor";

/// Reputation delta for a vote on the winning side.
const REPUTATION_REWARD: f64 = 1.0;
/// Reputation delta for a vote on the losing side.
const REPUTATION_PENALTY: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    pub approval_threshold_pct: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            approval_threshold_pct: DEFAULT_APPROVAL_THRESHOLD_PCT,
        }
    }
}

/// Terminal state machine per work item: pending until one side clears
/// the threshold, then approved or rejected forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusDecision {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusOutcome {
    pub work_id: String,
    pub decision: ConsensusDecision,
    pub approval_percentage: f64,
    pub approved_stake: f64,
    pub rejected_stake: f64,
    pub total_stake: f64,
    pub votes_counted: usize,
    /// Votes referencing a missing staker, reported rather than fatal.
    pub skipped_votes: usize,
    /// Stakers whose latest vote entered the tally.
    pub participants: Vec<String>,
}

/// Result of one backfill pass over the vote ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackfillSummary {
    pub scanned: usize,
    pub created: usize,
    pub already_recorded: usize,
    /// Votes referencing a missing work item or staker.
    pub skipped: usize,
}

pub struct ConsensusAuditor {
    storage: Arc<dyn Storage>,
    crypto: Arc<RwLock<CryptoEngine>>,
    config: ConsensusConfig,
    /// Per-work locks serializing ledger writes for the same work item, so
    /// concurrent backfills cannot duplicate a record or fork a chain tail.
    work_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConsensusAuditor {
    pub fn new(
        storage: Arc<dyn Storage>,
        crypto: Arc<RwLock<CryptoEngine>>,
        config: ConsensusConfig,
    ) -> Self {
        Self {
            storage,
            crypto,
            config,
            work_locks: DashMap::new(),
        }
    }

    fn work_lock(&self, work_id: &str) -> Arc<Mutex<()>> {
        self.work_locks
            .entry(work_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn ensure_auditor_key(&self) -> Result<()> {
        let mut crypto = self.crypto.write().await;
        if !crypto.has_keypair(AUDITOR_ENTITY) {
            crypto.generate_keypair(AUDITOR_ENTITY)?;
        }
        Ok(())
    }

    /// Latest decided vote per staker for a work item, skipping votes whose
    /// staker no longer resolves.
    async fn effective_votes(&self, work_id: &str) -> Result<(Vec<ValidationVote>, usize)> {
        let votes = self
            .storage
            .get_validation_votes_for_work(work_id)
            .await
            .context("loading votes")?;

        let mut skipped = 0usize;
        let mut latest: HashMap<String, ValidationVote> = HashMap::new();
        for vote in votes {
            if self
                .storage
                .get_staker(&vote.staker_id)
                .await
                .context("resolving staker")?
                .is_none()
            {
                warn!(
                    vote_id = %vote.id,
                    staker_id = %vote.staker_id,
                    "vote references missing staker, skipping"
                );
                skipped += 1;
                continue;
            }
            match latest.get(&vote.staker_id) {
                Some(existing) if existing.timestamp >= vote.timestamp => {}
                _ => {
                    latest.insert(vote.staker_id.clone(), vote);
                }
            }
        }

        let mut effective: Vec<ValidationVote> = latest.into_values().collect();
        effective.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok((effective, skipped))
    }

    /// Tally the stake-weighted vote for a work item.
    pub async fn tally(&self, work_id: &str) -> Result<ConsensusOutcome> {
        if self
            .storage
            .get_work_item(work_id)
            .await
            .context("loading work item")?
            .is_none()
        {
            anyhow::bail!("work item not found: {}", work_id);
        }

        let (votes, skipped) = self.effective_votes(work_id).await?;

        let mut approved_stake = 0.0;
        let mut rejected_stake = 0.0;
        let mut participants = Vec::new();
        for vote in &votes {
            match vote.status {
                VoteStatus::Approved => approved_stake += vote.stake_amount,
                VoteStatus::Rejected => rejected_stake += vote.stake_amount,
                VoteStatus::Pending => continue,
            }
            participants.push(vote.staker_id.clone());
        }

        let total_stake = approved_stake + rejected_stake;
        let approval_percentage = if total_stake > 0.0 {
            approved_stake / total_stake * 100.0
        } else {
            0.0
        };

        let decision = if total_stake <= 0.0 {
            ConsensusDecision::Pending
        } else if approval_percentage >= self.config.approval_threshold_pct {
            ConsensusDecision::Approved
        } else if (100.0 - approval_percentage) >= self.config.approval_threshold_pct {
            ConsensusDecision::Rejected
        } else {
            ConsensusDecision::Pending
        };

        debug!(
            work_id,
            approval_percentage,
            total_stake,
            ?decision,
            "tally computed"
        );

        Ok(ConsensusOutcome {
            work_id: work_id.to_string(),
            decision,
            approval_percentage,
            approved_stake,
            rejected_stake,
            total_stake,
            votes_counted: participants.len(),
            skipped_votes: skipped,
            participants,
        })
    }

    /// Tally many work items concurrently. Safe: tallies are read-only.
    pub async fn tally_many(&self, work_ids: &[String]) -> Result<Vec<ConsensusOutcome>> {
        join_all(work_ids.iter().map(|id| self.tally(id)))
            .await
            .into_iter()
            .collect()
    }

    /// Create one audit record for every vote that lacks one.
    ///
    /// Idempotent: activity hashes are derived from vote ids, and the store
    /// enforces their uniqueness, so a second pass over the same ledger
    /// creates zero records.
    pub async fn backfill_missing_records(&self) -> Result<BackfillSummary> {
        self.ensure_auditor_key().await?;

        let votes = self
            .storage
            .all_validation_votes()
            .await
            .context("scanning vote ledger")?;

        let mut summary = BackfillSummary {
            scanned: votes.len(),
            ..Default::default()
        };

        for vote in votes {
            let lock = self.work_lock(&vote.work_id);
            let _guard = lock.lock().await;

            let activity_hash = vote_activity_hash(&vote);
            if self
                .storage
                .has_audit_record_for_activity(&activity_hash)
                .await?
            {
                summary.already_recorded += 1;
                continue;
            }

            let work_exists = self.storage.get_work_item(&vote.work_id).await?.is_some();
            let staker_exists = self.storage.get_staker(&vote.staker_id).await?.is_some();
            if !work_exists || !staker_exists {
                warn!(
                    vote_id = %vote.id,
                    work_id = %vote.work_id,
                    staker_id = %vote.staker_id,
                    "vote references missing entities, skipping backfill"
                );
                summary.skipped += 1;
                continue;
            }

            let previous = self
                .storage
                .latest_record_hash_for_work(&vote.work_id)
                .await?;
            let merkle_root = crypto::merkle_root(&[crypto::hash(&format!(
                "{}:{}:{:?}:{}",
                vote.work_id, vote.staker_id, vote.status, vote.stake_amount
            ))]);
            let signature = {
                let crypto_engine = self.crypto.read().await;
                crypto_engine
                    .sign_message(AUDITOR_ENTITY, &activity_hash)?
                    .to_hex()
            };

            let record = AuditRecord::new(
                AuditRecordType::ValidationVote,
                activity_hash,
                Some(vote.id.clone()),
                Some(vote.work_id.clone()),
                previous,
                merkle_root,
                signature,
                0.0,
                vote.stake_amount,
            );

            self.storage
                .append_audit_record(record)
                .await
                .context("appending vote audit record")?;
            summary.created += 1;
        }

        info!(
            scanned = summary.scanned,
            created = summary.created,
            already_recorded = summary.already_recorded,
            skipped = summary.skipped,
            "audit backfill complete"
        );
        Ok(summary)
    }

    /// Record a terminal consensus decision and apply reputation deltas.
    ///
    /// No-op while consensus has not been reached, and idempotent once it
    /// has: the decision's activity hash is derived from the work id alone.
    pub async fn record_consensus_decision(&self, work_id: &str) -> Result<Option<AuditRecord>> {
        let outcome = self.tally(work_id).await?;
        if outcome.decision == ConsensusDecision::Pending {
            debug!(work_id, "consensus not reached, nothing to record");
            return Ok(None);
        }

        self.ensure_auditor_key().await?;

        let lock = self.work_lock(work_id);
        let _guard = lock.lock().await;

        let activity_hash = decision_activity_hash(work_id);
        if self
            .storage
            .has_audit_record_for_activity(&activity_hash)
            .await?
        {
            return Ok(None);
        }

        let (votes, _) = self.effective_votes(work_id).await?;
        let winning_status = match outcome.decision {
            ConsensusDecision::Approved => VoteStatus::Approved,
            ConsensusDecision::Rejected => VoteStatus::Rejected,
            ConsensusDecision::Pending => unreachable!("pending handled above"),
        };

        let mut reputation_impact = 0.0;
        for vote in votes.iter().filter(|v| v.status.is_decided()) {
            let Some(mut staker) = self.storage.get_staker(&vote.staker_id).await? else {
                continue;
            };
            staker.total_validations += 1;
            if vote.status == winning_status {
                staker.correct_validations += 1;
                staker.validation_reputation += REPUTATION_REWARD;
                reputation_impact += REPUTATION_REWARD;
            } else {
                staker.validation_reputation =
                    (staker.validation_reputation - REPUTATION_PENALTY).max(0.0);
                reputation_impact -= REPUTATION_PENALTY;
            }
            staker.updated_at = chrono::Utc::now();
            self.storage.put_staker(staker).await?;
        }

        let participant_leaves: Vec<String> = outcome
            .participants
            .iter()
            .map(|id| crypto::hash(id))
            .collect();
        let previous = self.storage.latest_record_hash_for_work(work_id).await?;
        let signature = {
            let crypto_engine = self.crypto.read().await;
            crypto_engine
                .sign_message(AUDITOR_ENTITY, &activity_hash)?
                .to_hex()
        };

        let record = AuditRecord::new(
            AuditRecordType::ConsensusDecision,
            activity_hash,
            None,
            Some(work_id.to_string()),
            previous,
            crypto::merkle_root(&participant_leaves),
            signature,
            reputation_impact,
            outcome.total_stake,
        );

        self.storage
            .append_audit_record(record.clone())
            .await
            .context("appending decision audit record")?;

        info!(
            work_id,
            decision = ?outcome.decision,
            approval = outcome.approval_percentage,
            participants = outcome.participants.len(),
            "consensus decision recorded"
        );
        Ok(Some(record))
    }
}

fn vote_activity_hash(vote: &ValidationVote) -> String {
    crypto::hash(&format!("vote:{}", vote.id))
}

fn decision_activity_hash(work_id: &str) -> String {
    crypto::hash(&format!("decision:{work_id}"))
}
