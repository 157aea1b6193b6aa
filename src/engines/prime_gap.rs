//! Prime gap analysis
//!
//! Sieves primes up to a difficulty-scaled limit, computes the consecutive
//! gap distribution, and derives summary statistics plus a smoothed
//! "resonance" metric over the gap distribution.

use tracing::debug;

use super::{primes_from_sieve, EngineBudget, EngineOutcome};
use crate::models::{PrimeGapResult, ResultPayload};

/// Sieve limit per unit of difficulty.
const LIMIT_PER_DIFFICULTY: u64 = 5_000;

pub fn run(difficulty: u32, budget: &EngineBudget) -> EngineOutcome {
    let limit = u64::from(difficulty.max(1)) * LIMIT_PER_DIFFICULTY;
    let (is_prime, partial) = super::sieve(limit, budget);
    let primes = primes_from_sieve(&is_prime);

    let gaps: Vec<u64> = primes.windows(2).map(|w| w[1] - w[0]).collect();
    let ops = limit + gaps.len() as u64;

    let (mean, std_dev, min_gap, max_gap, twin_count, resonance) = if gaps.is_empty() {
        (0.0, 0.0, 0, 0, 0, 0.0)
    } else {
        let n = gaps.len() as f64;
        let mean = gaps.iter().sum::<u64>() as f64 / n;
        let variance = gaps
            .iter()
            .map(|&g| {
                let d = g as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();
        let min_gap = *gaps.iter().min().unwrap_or(&0);
        let max_gap = *gaps.iter().max().unwrap_or(&0);
        let twin_count = gaps.iter().filter(|&&g| g == 2).count();

        // Mean Gaussian-kernel weight of each gap around the distribution
        // mean; approaches 1 for tightly clustered gaps, 0 for scattered.
        let resonance = if std_dev > 0.0 {
            gaps.iter()
                .map(|&g| {
                    let z = (g as f64 - mean) / std_dev;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                / n
        } else {
            1.0
        };

        (mean, std_dev, min_gap, max_gap, twin_count, resonance)
    };

    debug!(
        limit,
        primes = primes.len(),
        twin_count,
        partial,
        "prime gap analysis finished"
    );

    EngineOutcome {
        result: ResultPayload::PrimeGap(PrimeGapResult {
            sieve_limit: limit,
            prime_count: primes.len(),
            mean_gap: mean,
            std_dev_gap: std_dev,
            min_gap,
            max_gap,
            twin_prime_count: twin_count,
            resonance,
        }),
        partial,
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statistics_at_difficulty_one() {
        let budget = EngineBudget::from_secs(30);
        let outcome = run(1, &budget);
        let ResultPayload::PrimeGap(result) = outcome.result else {
            panic!("wrong payload variant");
        };

        // 669 primes below 5000; first gap is 3 - 2 = 1.
        assert_eq!(result.sieve_limit, 5_000);
        assert_eq!(result.prime_count, 669);
        assert_eq!(result.min_gap, 1);
        assert!(result.max_gap >= 2);
        assert!(result.twin_prime_count > 0);
        assert!(result.mean_gap > 0.0);
        assert!(result.resonance > 0.0 && result.resonance <= 1.0);
    }

    #[test]
    fn test_gap_ordering_invariants() {
        let budget = EngineBudget::from_secs(30);
        let outcome = run(4, &budget);
        let ResultPayload::PrimeGap(result) = outcome.result else {
            panic!("wrong payload variant");
        };
        assert!(result.min_gap <= result.max_gap);
        assert!(result.mean_gap >= result.min_gap as f64);
        assert!(result.mean_gap <= result.max_gap as f64);
        assert!(result.std_dev_gap >= 0.0);
    }
}
