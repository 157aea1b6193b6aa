//! Goldbach conjecture verification
//!
//! Sieves primes up to a difficulty-scaled bound and confirms that every
//! even number in [4, bound] has at least one prime-pair decomposition.
//! Counterexamples are reported, never expected.

use tracing::debug;

use super::{primes_from_sieve, EngineBudget, EngineOutcome};
use crate::models::{GoldbachPair, GoldbachResult, ResultPayload};

/// Even-range upper bound per unit of difficulty.
const RANGE_PER_DIFFICULTY: u64 = 2_000;

/// How many spot-check decompositions to retain.
const SAMPLE_COUNT: usize = 5;

pub fn run(difficulty: u32, budget: &EngineBudget) -> EngineOutcome {
    let bound = u64::from(difficulty.max(1)) * RANGE_PER_DIFFICULTY;
    let (is_prime, sieve_partial) = super::sieve(bound, budget);
    let primes = primes_from_sieve(&is_prime);

    let mut ops = primes.len() as u64;
    let mut evens_tested = 0u64;
    let mut counterexamples = Vec::new();
    let mut samples: Vec<GoldbachPair> = Vec::with_capacity(SAMPLE_COUNT);
    let sample_stride = (bound / 2 / SAMPLE_COUNT as u64).max(1);
    let mut partial = sieve_partial;

    let mut n = 4u64;
    while n <= bound {
        if budget.exhausted_at(evens_tested) && evens_tested > 0 {
            partial = true;
            break;
        }

        let mut decomposition = None;
        for &p in &primes {
            if p > n / 2 {
                break;
            }
            ops += 1;
            if is_prime[(n - p) as usize] {
                decomposition = Some(GoldbachPair {
                    target: n,
                    prime_a: p,
                    prime_b: n - p,
                });
                break;
            }
        }

        match decomposition {
            Some(pair) => {
                if evens_tested % sample_stride == 0 && samples.len() < SAMPLE_COUNT {
                    samples.push(pair);
                }
            }
            None => counterexamples.push(n),
        }

        evens_tested += 1;
        n += 2;
    }

    debug!(
        bound,
        evens_tested,
        counterexamples = counterexamples.len(),
        partial,
        "goldbach verification finished"
    );

    EngineOutcome {
        result: ResultPayload::Goldbach(GoldbachResult {
            range_start: 4,
            range_end: bound,
            evens_tested,
            counterexamples,
            sample_decompositions: samples,
            verification_method: "sieve_pair_search".to_string(),
        }),
        partial,
        ops,
    }
}
