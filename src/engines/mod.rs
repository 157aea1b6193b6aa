//! Deterministic computation engines
//!
//! One engine per computable work type. Every engine takes a difficulty
//! that scales its problem size and a wall-clock budget; an engine that
//! exhausts the budget stops and returns what it has, flagged partial —
//! a defined degradation, not an error.

pub mod collatz;
pub mod fibonacci;
pub mod goldbach;
pub mod prime_gap;

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::models::{ResultPayload, WorkType};

/// Default wall-clock ceiling for a single engine run.
pub const DEFAULT_TIME_BUDGET_SECS: u64 = 25;

/// How many inner-loop iterations pass between budget checks.
const BUDGET_CHECK_STRIDE: u64 = 4096;

/// Wall-clock budget handed to an engine run.
#[derive(Debug, Clone, Copy)]
pub struct EngineBudget {
    deadline: Instant,
}

impl EngineBudget {
    pub fn new(limit: Duration) -> Self {
        Self {
            deadline: Instant::now() + limit,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn exhausted(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Cheap periodic check: only consults the clock every
    /// [`BUDGET_CHECK_STRIDE`] iterations.
    pub fn exhausted_at(&self, iteration: u64) -> bool {
        iteration % BUDGET_CHECK_STRIDE == 0 && self.exhausted()
    }
}

/// Output of one engine run.
#[derive(Debug, Clone)]
pub struct EngineOutcome {
    pub result: ResultPayload,
    /// True when the run stopped at the wall-clock budget.
    pub partial: bool,
    /// Operation count, reported as the item's computational cost.
    pub ops: u64,
}

/// Dispatch a real computation. Errors only for work types without an
/// engine; the router turns that into a simulated fallback.
pub fn compute(work_type: WorkType, difficulty: u32, budget: &EngineBudget) -> Result<EngineOutcome> {
    match work_type {
        WorkType::GoldbachVerification => Ok(goldbach::run(difficulty, budget)),
        WorkType::PrimeGapAnalysis => Ok(prime_gap::run(difficulty, budget)),
        WorkType::FibonacciConvergence => Ok(fibonacci::run(difficulty, budget)),
        WorkType::CollatzConvergence => Ok(collatz::run(difficulty, budget)),
        other => anyhow::bail!("no computation engine for work type: {}", other),
    }
}

/// Sieve of Eratosthenes up to `limit` inclusive.
///
/// Returns the primality table and whether the sieve completed within the
/// budget. A partial sieve is still internally consistent up to the last
/// fully processed prime.
pub(crate) fn sieve(limit: u64, budget: &EngineBudget) -> (Vec<bool>, bool) {
    let n = limit as usize;
    let mut is_prime = vec![true; n + 1];
    is_prime[0] = false;
    if n >= 1 {
        is_prime[1] = false;
    }

    let mut p = 2usize;
    while p * p <= n {
        if budget.exhausted() {
            return (is_prime, true);
        }
        if is_prime[p] {
            let mut multiple = p * p;
            while multiple <= n {
                is_prime[multiple] = false;
                multiple += p;
            }
        }
        p += 1;
    }
    (is_prime, false)
}

pub(crate) fn primes_from_sieve(is_prime: &[bool]) -> Vec<u64> {
    is_prime
        .iter()
        .enumerate()
        .filter_map(|(n, &p)| if p { Some(n as u64) } else { None })
        .collect()
}
