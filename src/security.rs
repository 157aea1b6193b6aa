//! Discovery auditing
//!
//! Composite security scoring over a work item's validation and integrity
//! signals, plus fraud flagging. The score is additive across four capped
//! components: mathematical integrity (40), consensus strength (30),
//! scientific-value plausibility (20), and computational-effort
//! plausibility (10).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::engines::{self, EngineBudget};
use crate::models::{ComputationMode, ValidationVote, VoteStatus, WorkItem};
use crate::storage::Storage;
use crate::validation;
use crate::valuation::{MAX_VALUE, MIN_VALUE};

/// Fraud requires at least this many independent indicators.
const FRAUD_INDICATOR_THRESHOLD: usize = 2;

/// Confidence ceiling for fraud assessments.
const MAX_FRAUD_CONFIDENCE: f64 = 95.0;

/// Wall-clock budget for an independent re-verification run.
const REVERIFY_BUDGET_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            RiskLevel::Low
        } else if score >= 70.0 {
            RiskLevel::Medium
        } else if score >= 50.0 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityAssessment {
    pub work_id: String,
    /// 0..=100 composite.
    pub security_score: f64,
    /// Mathematical integrity component, 0..=40.
    pub integrity_score: f64,
    /// Consensus strength component, 0..=30.
    pub consensus_score: f64,
    /// Scientific-value plausibility component, 0..=20.
    pub value_score: f64,
    /// Computational-effort plausibility component, 0..=10.
    pub effort_score: f64,
    pub risk_level: RiskLevel,
    pub formula_valid: bool,
    pub computation_verified: bool,
    pub signature_present: bool,
    pub independently_reverified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAssessment {
    pub work_id: String,
    pub fraudulent: bool,
    pub indicators: Vec<String>,
    pub risk_factors: Vec<String>,
    /// 0..=95.
    pub confidence: f64,
}

pub struct DiscoveryAuditEngine {
    storage: Arc<dyn Storage>,
}

impl DiscoveryAuditEngine {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Score a work item from its own signals and its votes.
    pub fn assess(&self, work: &WorkItem, votes: &[ValidationVote]) -> SecurityAssessment {
        let verdict = validation::validate_item(work);
        let formula_valid = verdict.valid;
        let signature_present = signature_well_formed(&work.signature);
        let computation_verified = work.computation_mode == ComputationMode::Real
            && work.verification.checks_failed == 0;
        let independently_reverified = self.reverify(work);

        // One quartile of the integrity component per signal.
        let mut integrity_score = 0.0;
        for signal in [
            formula_valid,
            computation_verified,
            signature_present,
            independently_reverified,
        ] {
            if signal {
                integrity_score += 10.0;
            }
        }

        let consensus_score = consensus_strength(votes);
        let value_score = value_plausibility(work.scientific_value);
        let effort_score = (f64::from(work.difficulty) / 10.0).min(10.0);

        let security_score = integrity_score + consensus_score + value_score + effort_score;
        let risk_level = RiskLevel::from_score(security_score);

        SecurityAssessment {
            work_id: work.id.clone(),
            security_score,
            integrity_score,
            consensus_score,
            value_score,
            effort_score,
            risk_level,
            formula_valid,
            computation_verified,
            signature_present,
            independently_reverified,
        }
    }

    /// Load a work item and its votes, then score it.
    pub async fn assess_work(&self, work_id: &str) -> Result<SecurityAssessment> {
        let work = self
            .storage
            .get_work_item(work_id)
            .await
            .context("loading work item")?
            .ok_or_else(|| anyhow::anyhow!("work item not found: {}", work_id))?;
        let votes = self
            .storage
            .get_validation_votes_for_work(work_id)
            .await
            .context("loading votes")?;

        let assessment = self.assess(&work, &votes);
        info!(
            work_id,
            score = assessment.security_score,
            risk = assessment.risk_level.as_str(),
            "security assessment complete"
        );
        Ok(assessment)
    }

    /// Flag fraud when at least two independent indicators are present.
    pub async fn detect_fraud(&self, work_id: &str) -> Result<FraudAssessment> {
        let work = self
            .storage
            .get_work_item(work_id)
            .await
            .context("loading work item")?
            .ok_or_else(|| anyhow::anyhow!("work item not found: {}", work_id))?;
        let votes = self
            .storage
            .get_validation_votes_for_work(work_id)
            .await
            .context("loading votes")?;
        let assessment = self.assess(&work, &votes);

        let mut indicators = Vec::new();
        if work.scientific_value < 1.0 {
            indicators.push("near_zero_scientific_value".to_string());
        }
        if votes.iter().filter(|v| v.status.is_decided()).count() == 0 {
            indicators.push("zero_votes".to_string());
        }
        if !assessment.formula_valid {
            indicators.push("failed_formula_check".to_string());
        }
        if !assessment.signature_present {
            indicators.push("missing_or_invalid_signature".to_string());
        }

        let mut risk_factors = Vec::new();
        if matches!(assessment.risk_level, RiskLevel::High | RiskLevel::Critical) {
            risk_factors.push(format!("risk_level_{}", assessment.risk_level.as_str()));
        }
        if !assessment.computation_verified {
            risk_factors.push("computation_unverified".to_string());
        }
        if work.scientific_value > MAX_VALUE || (work.scientific_value > 0.0 && work.scientific_value < MIN_VALUE)
        {
            risk_factors.push("value_out_of_bounds".to_string());
        }

        let fraudulent = indicators.len() >= FRAUD_INDICATOR_THRESHOLD;
        let confidence = ((indicators.len() * 30 + risk_factors.len() * 10) as f64)
            .min(MAX_FRAUD_CONFIDENCE);

        if fraudulent {
            warn!(
                work_id,
                indicators = ?indicators,
                confidence,
                "fraud indicators exceeded threshold"
            );
        }

        Ok(FraudAssessment {
            work_id: work_id.to_string(),
            fraudulent,
            indicators,
            risk_factors,
            confidence,
        })
    }

    /// Independently reproduce the computation and re-validate the fresh
    /// result. Only meaningful for real-mode items of computable types.
    fn reverify(&self, work: &WorkItem) -> bool {
        if work.computation_mode != ComputationMode::Real || !work.work_type.is_computable() {
            return false;
        }
        let budget = EngineBudget::from_secs(REVERIFY_BUDGET_SECS);
        match engines::compute(work.work_type, work.difficulty, &budget) {
            Ok(outcome) => validation::validate(work.work_type, &outcome.result).valid,
            Err(_) => false,
        }
    }
}

/// Consensus strength: half from participation depth, half from the
/// stake-weighted approval rate.
fn consensus_strength(votes: &[ValidationVote]) -> f64 {
    let decided: Vec<&ValidationVote> = votes.iter().filter(|v| v.status.is_decided()).collect();
    if decided.is_empty() {
        return 0.0;
    }

    let participation = (decided.len() as f64).min(10.0) / 10.0 * 15.0;

    let approved: f64 = decided
        .iter()
        .filter(|v| v.status == VoteStatus::Approved)
        .map(|v| v.stake_amount)
        .sum();
    let total: f64 = decided.iter().map(|v| v.stake_amount).sum();
    let approval_rate = if total > 0.0 { approved / total } else { 0.0 };

    participation + approval_rate * 15.0
}

/// Log-scaled plausibility of a scientific value, peaking mid-band.
fn value_plausibility(value: f64) -> f64 {
    if value <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    let center = (MIN_VALUE.log10() + MAX_VALUE.log10()) / 2.0;
    let half_width = (MAX_VALUE.log10() - MIN_VALUE.log10()) / 2.0;
    let deviation = (value.log10() - center).abs() / half_width;
    (20.0 * (1.0 - deviation)).clamp(0.0, 20.0)
}

/// A well-formed signature is 64 hex-encoded bytes.
fn signature_well_formed(signature: &str) -> bool {
    match hex::decode(signature) {
        Ok(bytes) => bytes.len() == 64,
        Err(_) => false,
    }
}
