//! Formula validation
//!
//! Structural and numeric acceptance rules, one per work type. The
//! validator is pure and total: it never errors, never panics, and a
//! malformed or mismatched payload simply fails with score 0.

use serde::{Deserialize, Serialize};

use crate::models::{ResultPayload, WorkItem, WorkType};

/// Critical-line tolerance for Riemann-type results.
const RIEMANN_TOLERANCE: f64 = 1e-3;

/// Score given to unknown work types carrying non-null structured data.
const NEUTRAL_SCORE: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaVerdict {
    pub valid: bool,
    /// 0..=100.
    pub score: u32,
    pub details: String,
}

impl FormulaVerdict {
    fn pass(score: u32, details: impl Into<String>) -> Self {
        Self {
            valid: true,
            score: score.min(100),
            details: details.into(),
        }
    }

    fn fail(score: u32, details: impl Into<String>) -> Self {
        Self {
            valid: false,
            score: score.min(100),
            details: details.into(),
        }
    }
}

/// Validate a result payload against its declared work type.
pub fn validate(work_type: WorkType, payload: &ResultPayload) -> FormulaVerdict {
    match (work_type, payload) {
        (WorkType::GoldbachVerification, ResultPayload::Goldbach(r)) => {
            if !r.counterexamples.is_empty() {
                return FormulaVerdict::fail(
                    5,
                    format!("{} counterexamples reported", r.counterexamples.len()),
                );
            }
            if r.evens_tested == 0 || r.range_end <= r.range_start {
                return FormulaVerdict::fail(0, "empty or inverted verification range");
            }
            if r.sample_decompositions.is_empty() {
                return FormulaVerdict::fail(20, "no spot-check decompositions supplied");
            }
            for pair in &r.sample_decompositions {
                if pair.target <= 2 || pair.target % 2 != 0 {
                    return FormulaVerdict::fail(
                        10,
                        format!("decomposition target {} is not an even number > 2", pair.target),
                    );
                }
                if pair.prime_a + pair.prime_b != pair.target
                    || !is_prime(pair.prime_a)
                    || !is_prime(pair.prime_b)
                {
                    return FormulaVerdict::fail(
                        10,
                        format!(
                            "{} + {} is not a prime decomposition of {}",
                            pair.prime_a, pair.prime_b, pair.target
                        ),
                    );
                }
            }
            FormulaVerdict::pass(
                95,
                format!(
                    "{} evens verified in [{}, {}] with no counterexamples",
                    r.evens_tested, r.range_start, r.range_end
                ),
            )
        }

        (WorkType::PrimeGapAnalysis, ResultPayload::PrimeGap(r)) => {
            if r.prime_count < 2 {
                return FormulaVerdict::fail(0, "too few primes for gap statistics");
            }
            if r.min_gap == 0 || r.min_gap > r.max_gap {
                return FormulaVerdict::fail(10, "inconsistent gap bounds");
            }
            if r.mean_gap < r.min_gap as f64 || r.mean_gap > r.max_gap as f64 {
                return FormulaVerdict::fail(10, "mean gap outside [min, max]");
            }
            if r.std_dev_gap < 0.0 || !r.std_dev_gap.is_finite() {
                return FormulaVerdict::fail(10, "invalid gap deviation");
            }
            FormulaVerdict::pass(
                90,
                format!(
                    "{} primes below {}, {} twins",
                    r.prime_count, r.sieve_limit, r.twin_prime_count
                ),
            )
        }

        (WorkType::FibonacciConvergence, ResultPayload::Fibonacci(r)) => {
            if r.sequence_length < 10 || r.trailing_window == 0 {
                return FormulaVerdict::fail(0, "sequence too short to assess convergence");
            }
            if !r.final_ratio.is_finite() || r.final_ratio <= 1.0 || r.final_ratio >= 2.0 {
                return FormulaVerdict::fail(10, "final ratio outside the convergent band");
            }
            if r.golden_ratio_error > 1e-3 {
                return FormulaVerdict::fail(
                    15,
                    format!("convergence error {:.2e} too large", r.golden_ratio_error),
                );
            }
            let score = if r.golden_ratio_error < 1e-9 { 98 } else { 92 };
            FormulaVerdict::pass(
                score,
                format!(
                    "ratio converged to {:.12} (error {:.2e})",
                    r.final_ratio, r.golden_ratio_error
                ),
            )
        }

        (WorkType::CollatzConvergence, ResultPayload::Collatz(r)) => {
            if r.tested == 0 || r.range_end < r.range_start {
                return FormulaVerdict::fail(0, "empty survey range");
            }
            if !(0.0..=1.0).contains(&r.convergence_rate) {
                return FormulaVerdict::fail(0, "convergence rate outside [0, 1]");
            }
            if !r.failures.is_empty() {
                let score = (r.convergence_rate * 50.0) as u32;
                return FormulaVerdict::fail(
                    score,
                    format!("{} seeds failed to converge", r.failures.len()),
                );
            }
            FormulaVerdict::pass(
                96,
                format!("{} seeds converged, max orbit {}", r.tested, r.max_steps_observed),
            )
        }

        (WorkType::RiemannZero, ResultPayload::RiemannZero(r)) => {
            if !r.zero_real.is_finite() || !r.zero_imag.is_finite() {
                return FormulaVerdict::fail(0, "non-finite zero coordinates");
            }
            let distance = (r.zero_real - 0.5).abs();
            if distance <= RIEMANN_TOLERANCE {
                FormulaVerdict::pass(
                    98,
                    format!("zero on the critical line at t = {:.6}", r.zero_imag),
                )
            } else {
                // Score decays with distance from the critical line; well
                // under the 50-point acceptance bar by construction.
                let score = (40.0 - distance * 100.0).max(0.0) as u32;
                FormulaVerdict::fail(
                    score,
                    format!("real part {:.6} is off the critical line", r.zero_real),
                )
            }
        }

        (WorkType::QuantumSimulation, ResultPayload::QuantumSimulation(r)) => {
            if r.energy_levels == 0 {
                return FormulaVerdict::fail(0, "no energy levels reported");
            }
            if r.coherence_time_us <= 0.0 || !r.coherence_time_us.is_finite() {
                return FormulaVerdict::fail(10, "coherence time must be positive");
            }
            if r.fidelity <= 0.0 || r.fidelity > 1.0 {
                return FormulaVerdict::fail(10, "fidelity outside (0, 1]");
            }
            FormulaVerdict::pass(85, format!("{} levels, fidelity {:.3}", r.energy_levels, r.fidelity))
        }

        (WorkType::ParticleInteraction, ResultPayload::ParticleInteraction(r)) => {
            if r.collision_energy_gev <= 0.0 || !r.collision_energy_gev.is_finite() {
                return FormulaVerdict::fail(10, "collision energy must be positive");
            }
            if r.particle_count == 0 {
                return FormulaVerdict::fail(10, "no particles reported");
            }
            if r.cross_section_pb <= 0.0 || !r.cross_section_pb.is_finite() {
                return FormulaVerdict::fail(10, "cross section must be positive");
            }
            FormulaVerdict::pass(
                85,
                format!(
                    "{} particles at {:.1} GeV",
                    r.particle_count, r.collision_energy_gev
                ),
            )
        }

        // Unknown work types pass with a neutral score as long as they
        // carry non-null structured data.
        (WorkType::Unknown, ResultPayload::Generic(value)) => {
            if value.is_null() {
                FormulaVerdict::fail(0, "null payload")
            } else {
                FormulaVerdict::pass(NEUTRAL_SCORE, "unrecognized work type, structural check only")
            }
        }
        (WorkType::Unknown, _) => {
            FormulaVerdict::pass(NEUTRAL_SCORE, "unrecognized work type, structural check only")
        }

        // Declared type and payload shape disagree.
        (declared, _) => FormulaVerdict::fail(
            0,
            format!("payload shape does not match declared work type {declared}"),
        ),
    }
}

/// Validate a work item's result against its declared type.
pub fn validate_item(item: &WorkItem) -> FormulaVerdict {
    validate(item.work_type, &item.result)
}

/// Trial-division primality check for spot-check decompositions.
fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3u64;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GoldbachPair, GoldbachResult, RiemannZeroResult};

    fn goldbach_payload() -> ResultPayload {
        ResultPayload::Goldbach(GoldbachResult {
            range_start: 4,
            range_end: 100,
            evens_tested: 49,
            counterexamples: vec![],
            sample_decompositions: vec![
                GoldbachPair { target: 10, prime_a: 3, prime_b: 7 },
                GoldbachPair { target: 28, prime_a: 5, prime_b: 23 },
            ],
            verification_method: "sieve_pair_search".into(),
        })
    }

    #[test]
    fn test_goldbach_valid_payload_passes() {
        let verdict = validate(WorkType::GoldbachVerification, &goldbach_payload());
        assert!(verdict.valid);
        assert!(verdict.score >= 90);
    }

    #[test]
    fn test_goldbach_bad_decomposition_fails() {
        let payload = ResultPayload::Goldbach(GoldbachResult {
            sample_decompositions: vec![GoldbachPair { target: 10, prime_a: 4, prime_b: 6 }],
            ..match goldbach_payload() {
                ResultPayload::Goldbach(r) => r,
                _ => unreachable!(),
            }
        });
        let verdict = validate(WorkType::GoldbachVerification, &payload);
        assert!(!verdict.valid);
        assert_eq!(verdict.score, 10);
    }

    #[test]
    fn test_riemann_off_critical_line_fails() {
        let payload = ResultPayload::RiemannZero(RiemannZeroResult {
            zero_real: 0.3,
            zero_imag: 21.022,
        });
        let verdict = validate(WorkType::RiemannZero, &payload);
        assert!(!verdict.valid);
        assert!(verdict.score < 50);
    }

    #[test]
    fn test_riemann_on_critical_line_passes() {
        let payload = ResultPayload::RiemannZero(RiemannZeroResult {
            zero_real: 0.5,
            zero_imag: 14.134725,
        });
        let verdict = validate(WorkType::RiemannZero, &payload);
        assert!(verdict.valid);
        assert!(verdict.score >= 90);
    }

    #[test]
    fn test_mismatched_payload_scores_zero() {
        let verdict = validate(WorkType::RiemannZero, &goldbach_payload());
        assert!(!verdict.valid);
        assert_eq!(verdict.score, 0);
    }

    #[test]
    fn test_unknown_type_neutral_pass() {
        let verdict = validate(
            WorkType::Unknown,
            &ResultPayload::Generic(serde_json::json!({"anything": 1})),
        );
        assert!(verdict.valid);
        assert_eq!(verdict.score, NEUTRAL_SCORE);

        let verdict = validate(
            WorkType::Unknown,
            &ResultPayload::Generic(serde_json::Value::Null),
        );
        assert!(!verdict.valid);
        assert_eq!(verdict.score, 0);
    }

    #[test]
    fn test_is_prime_spot_checks() {
        assert!(is_prime(2));
        assert!(is_prime(97));
        assert!(!is_prime(1));
        assert!(!is_prime(91)); // 7 * 13
    }
}
