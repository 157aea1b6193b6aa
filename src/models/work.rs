//! Work item models
//!
//! A work item is one unit of claimed mathematical result. Result payloads
//! are a tagged union keyed by work type: one shape per case, so a payload
//! that does not match its declared type is a compile-visible mismatch
//! instead of a runtime shape guess.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto;

/// Fixed set of work types the ledger understands.
///
/// The first four are computable by the local engines; the rest arrive from
/// external submitters and are only validated (or simulated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    GoldbachVerification,
    PrimeGapAnalysis,
    FibonacciConvergence,
    CollatzConvergence,
    RiemannZero,
    QuantumSimulation,
    ParticleInteraction,
    #[serde(other)]
    Unknown,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkType::GoldbachVerification => "goldbach_verification",
            WorkType::PrimeGapAnalysis => "prime_gap_analysis",
            WorkType::FibonacciConvergence => "fibonacci_convergence",
            WorkType::CollatzConvergence => "collatz_convergence",
            WorkType::RiemannZero => "riemann_zero",
            WorkType::QuantumSimulation => "quantum_simulation",
            WorkType::ParticleInteraction => "particle_interaction",
            WorkType::Unknown => "unknown",
        }
    }

    /// Whether a deterministic local engine exists for this type.
    pub fn is_computable(&self) -> bool {
        matches!(
            self,
            WorkType::GoldbachVerification
                | WorkType::PrimeGapAnalysis
                | WorkType::FibonacciConvergence
                | WorkType::CollatzConvergence
        )
    }
}

impl std::fmt::Display for WorkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a result was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComputationMode {
    Real,
    Simulated,
}

impl ComputationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputationMode::Real => "real",
            ComputationMode::Simulated => "simulation",
        }
    }
}

/// One prime-pair decomposition of an even target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldbachPair {
    pub target: u64,
    pub prime_a: u64,
    pub prime_b: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldbachResult {
    pub range_start: u64,
    pub range_end: u64,
    pub evens_tested: u64,
    /// Even numbers with no prime-pair decomposition. Expected empty.
    pub counterexamples: Vec<u64>,
    /// Spot-checkable decompositions sampled across the range.
    pub sample_decompositions: Vec<GoldbachPair>,
    pub verification_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimeGapResult {
    pub sieve_limit: u64,
    pub prime_count: usize,
    pub mean_gap: f64,
    pub std_dev_gap: f64,
    pub min_gap: u64,
    pub max_gap: u64,
    pub twin_prime_count: usize,
    /// Smoothed gap-distribution statistic. Auxiliary, not load-bearing.
    pub resonance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FibonacciResult {
    pub sequence_length: usize,
    pub final_ratio: f64,
    /// Worst deviation from the golden ratio over the trailing window.
    pub golden_ratio_error: f64,
    pub trailing_window: usize,
    pub converged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollatzResult {
    pub range_start: u64,
    pub range_end: u64,
    pub tested: u64,
    pub converged: u64,
    pub convergence_rate: f64,
    pub max_steps_observed: u32,
    /// Seeds that did not reach 1 within the iteration ceiling.
    pub failures: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiemannZeroResult {
    /// Real part of the claimed zero; must sit on the critical line.
    pub zero_real: f64,
    pub zero_imag: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantumSimulationResult {
    pub energy_levels: u32,
    pub coherence_time_us: f64,
    pub fidelity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleInteractionResult {
    pub collision_energy_gev: f64,
    pub particle_count: u32,
    pub cross_section_pb: f64,
}

/// Structured result of a work item, one variant per work type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ResultPayload {
    Goldbach(GoldbachResult),
    PrimeGap(PrimeGapResult),
    Fibonacci(FibonacciResult),
    Collatz(CollatzResult),
    RiemannZero(RiemannZeroResult),
    QuantumSimulation(QuantumSimulationResult),
    ParticleInteraction(ParticleInteractionResult),
    /// Unknown work types carry their raw structured payload.
    Generic(serde_json::Value),
}

/// Independent-checking summary attached to every work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationPayload {
    pub method: String,
    pub checks_passed: u32,
    pub checks_failed: u32,
    /// True when the engine hit its wall-clock budget and returned early.
    pub partial: bool,
    pub elapsed_ms: u64,
}

/// One unit of claimed mathematical work. Immutable once persisted;
/// `scientific_value` is assigned by the valuation engine before that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub work_type: WorkType,
    pub difficulty: u32,
    pub result: ResultPayload,
    pub verification: VerificationPayload,
    /// Operation count reported by the producing engine.
    pub computational_cost: u64,
    pub energy_efficiency: f64,
    pub scientific_value: f64,
    pub worker_id: String,
    /// Hex Ed25519 signature over [`WorkItem::canonical_signing_data`].
    pub signature: String,
    pub computation_mode: ComputationMode,
    /// False for simulated results; consumers discount accordingly.
    pub tractable: bool,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl WorkItem {
    /// Bytes covered by the worker signature.
    pub fn canonical_signing_data(&self) -> Vec<u8> {
        format!(
            "{}:{}:{}:{}:{}",
            self.id,
            self.work_type,
            self.difficulty,
            self.worker_id,
            self.computation_mode.as_str(),
        )
        .into_bytes()
    }

    /// Merkle leaf hash of this item: digest of type, signature, and value.
    ///
    /// The value is fixed to two decimals so the leaf is re-derivable from
    /// persisted state.
    pub fn integrity_hash(&self) -> String {
        crypto::hash(&format!(
            "{}{}{:.2}",
            self.work_type, self.signature, self.scientific_value
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_type_serde_tags() {
        let tag = serde_json::to_string(&WorkType::GoldbachVerification).unwrap();
        assert_eq!(tag, "\"goldbach_verification\"");

        let parsed: WorkType = serde_json::from_str("\"riemann_zero\"").unwrap();
        assert_eq!(parsed, WorkType::RiemannZero);

        // Unrecognized tags collapse to Unknown rather than failing.
        let parsed: WorkType = serde_json::from_str("\"hyperbolic_tiling\"").unwrap();
        assert_eq!(parsed, WorkType::Unknown);
    }

    #[test]
    fn test_computable_set() {
        assert!(WorkType::GoldbachVerification.is_computable());
        assert!(WorkType::CollatzConvergence.is_computable());
        assert!(!WorkType::RiemannZero.is_computable());
        assert!(!WorkType::Unknown.is_computable());
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = ResultPayload::RiemannZero(RiemannZeroResult {
            zero_real: 0.5,
            zero_imag: 14.134725,
        });
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"kind\":\"riemann_zero\""));
        let back: ResultPayload = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ResultPayload::RiemannZero(_)));
    }

    #[test]
    fn test_integrity_hash_tracks_value() {
        let mut item = WorkItem {
            id: "w1".into(),
            work_type: WorkType::GoldbachVerification,
            difficulty: 10,
            result: ResultPayload::Generic(serde_json::Value::Null),
            verification: VerificationPayload {
                method: "test".into(),
                checks_passed: 1,
                checks_failed: 0,
                partial: false,
                elapsed_ms: 1,
            },
            computational_cost: 1,
            energy_efficiency: 0.5,
            scientific_value: 1500.0,
            worker_id: "worker".into(),
            signature: "ab".into(),
            computation_mode: ComputationMode::Real,
            tractable: true,
            confidence: 1.0,
            timestamp: Utc::now(),
        };
        let h1 = item.integrity_hash();
        item.scientific_value = 1501.0;
        assert_ne!(h1, item.integrity_hash());
    }
}
