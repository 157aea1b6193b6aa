//! Collatz convergence survey
//!
//! Iterates the 3n+1 rule for every start value in a difficulty-scaled
//! range, bounded by a fixed per-seed iteration ceiling, and reports the
//! convergence rate along with any seeds that failed to reach 1.

use tracing::debug;

use super::{EngineBudget, EngineOutcome};
use crate::models::{CollatzResult, ResultPayload};

/// Seeds surveyed per unit of difficulty.
const SEEDS_PER_DIFFICULTY: u64 = 500;

/// Per-seed iteration ceiling. A seed that has not reached 1 by then is
/// recorded as a failure rather than iterated forever.
pub const ITERATION_CEILING: u32 = 10_000;

pub fn run(difficulty: u32, budget: &EngineBudget) -> EngineOutcome {
    let range_end = u64::from(difficulty.max(1)) * SEEDS_PER_DIFFICULTY;

    let mut tested = 0u64;
    let mut converged = 0u64;
    let mut max_steps = 0u32;
    let mut failures = Vec::new();
    let mut ops = 0u64;
    let mut partial = false;

    for seed in 1..=range_end {
        if budget.exhausted_at(seed) && tested > 0 {
            partial = true;
            break;
        }

        let mut n = seed;
        let mut steps = 0u32;
        while n != 1 && steps < ITERATION_CEILING {
            n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
            steps += 1;
        }
        ops += u64::from(steps);
        tested += 1;

        if n == 1 {
            converged += 1;
            max_steps = max_steps.max(steps);
        } else {
            failures.push(seed);
        }
    }

    let convergence_rate = if tested > 0 {
        converged as f64 / tested as f64
    } else {
        0.0
    };

    debug!(
        range_end,
        tested,
        convergence_rate,
        failures = failures.len(),
        partial,
        "collatz survey finished"
    );

    EngineOutcome {
        result: ResultPayload::Collatz(CollatzResult {
            range_start: 1,
            range_end,
            tested,
            converged,
            convergence_rate,
            max_steps_observed: max_steps,
            failures,
        }),
        partial,
        ops,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_seeds_converge_in_small_range() {
        let budget = EngineBudget::from_secs(30);
        let outcome = run(2, &budget);
        let ResultPayload::Collatz(result) = outcome.result else {
            panic!("wrong payload variant");
        };

        assert_eq!(result.range_end, 1_000);
        assert_eq!(result.tested, 1_000);
        assert!(result.failures.is_empty());
        assert!((result.convergence_rate - 1.0).abs() < f64::EPSILON);
        // 27 is the classic long orbit below 1000: 111 steps.
        assert!(result.max_steps_observed >= 111);
    }

    #[test]
    fn test_ops_account_for_iterations() {
        let budget = EngineBudget::from_secs(30);
        let outcome = run(1, &budget);
        assert!(outcome.ops > 0);
        assert!(!outcome.partial);
    }
}
