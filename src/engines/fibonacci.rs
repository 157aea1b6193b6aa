//! Fibonacci / golden ratio convergence
//!
//! Generates a difficulty-scaled Fibonacci sequence and measures how the
//! ratio of consecutive terms converges toward the golden ratio, reporting
//! the worst deviation over the trailing window.

use tracing::debug;

use super::{EngineBudget, EngineOutcome};
use crate::models::{FibonacciResult, ResultPayload};

pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// Sequence terms per unit of difficulty.
const TERMS_PER_DIFFICULTY: usize = 10;

/// Terms are held as f64; beyond ~1470 the values overflow the exponent.
const MAX_SEQUENCE_LENGTH: usize = 1_400;

/// Ratios inspected for the convergence error.
const TRAILING_WINDOW: usize = 10;

/// Convergence threshold on the trailing-window error.
const CONVERGENCE_EPSILON: f64 = 1e-9;

pub fn run(difficulty: u32, budget: &EngineBudget) -> EngineOutcome {
    let target_length =
        (difficulty.max(1) as usize * TERMS_PER_DIFFICULTY).clamp(TRAILING_WINDOW + 2, MAX_SEQUENCE_LENGTH);

    let mut a = 1.0f64;
    let mut b = 1.0f64;
    let mut ratios: Vec<f64> = Vec::with_capacity(target_length);
    let mut generated = 2usize;
    let mut partial = false;

    while generated < target_length {
        if budget.exhausted_at(generated as u64) {
            partial = true;
            break;
        }
        let next = a + b;
        ratios.push(next / b);
        a = b;
        b = next;
        generated += 1;
    }

    let final_ratio = ratios.last().copied().unwrap_or(1.0);
    let window = ratios
        .iter()
        .rev()
        .take(TRAILING_WINDOW)
        .copied()
        .collect::<Vec<_>>();
    let golden_ratio_error = window
        .iter()
        .map(|r| (r - GOLDEN_RATIO).abs())
        .fold(0.0f64, f64::max);
    let converged = !window.is_empty() && golden_ratio_error < CONVERGENCE_EPSILON;

    debug!(
        length = generated,
        error = golden_ratio_error,
        converged,
        "fibonacci convergence finished"
    );

    EngineOutcome {
        result: ResultPayload::Fibonacci(FibonacciResult {
            sequence_length: generated,
            final_ratio,
            golden_ratio_error,
            trailing_window: window.len(),
            converged,
        }),
        partial,
        ops: generated as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_to_golden_ratio() {
        let budget = EngineBudget::from_secs(10);
        let outcome = run(10, &budget);
        let ResultPayload::Fibonacci(result) = outcome.result else {
            panic!("wrong payload variant");
        };

        assert_eq!(result.sequence_length, 100);
        assert!(result.converged);
        assert!(result.golden_ratio_error < CONVERGENCE_EPSILON);
        assert!((result.final_ratio - GOLDEN_RATIO).abs() < 1e-12);
    }

    #[test]
    fn test_length_clamped_for_large_difficulty() {
        let budget = EngineBudget::from_secs(10);
        let outcome = run(10_000, &budget);
        let ResultPayload::Fibonacci(result) = outcome.result else {
            panic!("wrong payload variant");
        };
        assert_eq!(result.sequence_length, MAX_SEQUENCE_LENGTH);
        assert!(result.final_ratio.is_finite());
    }
}
