use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStatus {
    Pending,
    Approved,
    Rejected,
}

impl VoteStatus {
    /// A decided vote contributes its stake to one side of the tally.
    pub fn is_decided(&self) -> bool {
        !matches!(self, VoteStatus::Pending)
    }
}

/// One staker's vote on one work item.
///
/// Votes are append-only: a changed vote is a new record that supersedes
/// the old one by timestamp, never an in-place edit. The tally keeps the
/// latest record per staker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationVote {
    pub id: String,
    pub work_id: String,
    pub staker_id: String,
    pub status: VoteStatus,
    /// Stake snapshot at vote time; this is the tally weight.
    pub stake_amount: f64,
    pub timestamp: DateTime<Utc>,
}

impl ValidationVote {
    pub fn new(
        work_id: impl Into<String>,
        staker_id: impl Into<String>,
        status: VoteStatus,
        stake_amount: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            work_id: work_id.into(),
            staker_id: staker_id.into(),
            status,
            stake_amount,
            timestamp: Utc::now(),
        }
    }
}
