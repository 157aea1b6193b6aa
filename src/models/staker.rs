use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A staked validator.
///
/// Reputation fields are mutated by consensus outcomes only; nothing else
/// in the core writes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staker {
    pub id: String,
    pub stake_amount: f64,
    pub validation_reputation: f64,
    pub total_validations: u64,
    pub correct_validations: u64,
    pub updated_at: DateTime<Utc>,
}

impl Staker {
    pub fn new(id: impl Into<String>, stake_amount: f64) -> Self {
        Self {
            id: id.into(),
            stake_amount,
            validation_reputation: 0.0,
            total_validations: 0,
            correct_validations: 0,
            updated_at: Utc::now(),
        }
    }

    /// Fraction of this staker's finalized votes that matched consensus.
    pub fn accuracy(&self) -> f64 {
        if self.total_validations == 0 {
            return 1.0;
        }
        self.correct_validations as f64 / self.total_validations as f64
    }
}
