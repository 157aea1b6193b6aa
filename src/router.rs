//! Computation routing
//!
//! Decides per (work type, difficulty) whether a request runs on a real
//! deterministic engine or the simulated fallback, dispatches accordingly,
//! and assembles signed work items. Engine failures are redirected to the
//! simulated path and logged, never surfaced to the caller.
//!
//! The router is an explicitly constructed service object; generation and
//! mode counters live on the instance, not in process-wide state.

use anyhow::Result;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::crypto::CryptoEngine;
use crate::engines::{self, EngineBudget, DEFAULT_TIME_BUDGET_SECS};
use crate::models::{
    ComputationMode, GoldbachPair, GoldbachResult, ParticleInteractionResult, QuantumSimulationResult,
    ResultPayload, RiemannZeroResult, VerificationPayload, WorkItem, WorkType,
};

/// Default difficulty ceiling for the real computation path.
const DEFAULT_TRACTABLE_DIFFICULTY: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Real computation is attempted only at or below this difficulty.
    pub tractable_difficulty_threshold: u32,
    /// Wall-clock ceiling per engine run, in seconds.
    pub engine_time_budget_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            tractable_difficulty_threshold: DEFAULT_TRACTABLE_DIFFICULTY,
            engine_time_budget_secs: DEFAULT_TIME_BUDGET_SECS,
        }
    }
}

/// Per-instance routing counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterStats {
    pub real_computations: u64,
    pub simulated_computations: u64,
    /// Engine errors silently redirected to the simulated path.
    pub engine_fallbacks: u64,
    /// Bumped whenever the routing configuration is replaced.
    pub algorithm_generation: u64,
}

/// A computed (or fabricated) result, ready for valuation and signing.
#[derive(Debug, Clone)]
pub struct ComputedWork {
    pub work_type: WorkType,
    pub difficulty: u32,
    pub computation_mode: ComputationMode,
    pub tractable: bool,
    pub confidence: f64,
    pub result: ResultPayload,
    pub verification: VerificationPayload,
    pub computational_cost: u64,
    pub energy_efficiency: f64,
}

pub struct ComputationRouter {
    config: RwLock<RouterConfig>,
    crypto: Arc<RwLock<CryptoEngine>>,
    stats: RwLock<RouterStats>,
}

impl ComputationRouter {
    pub fn new(config: RouterConfig, crypto: Arc<RwLock<CryptoEngine>>) -> Self {
        Self {
            config: RwLock::new(config),
            crypto,
            stats: RwLock::new(RouterStats::default()),
        }
    }

    /// Routing decision: real iff an engine exists for the type and the
    /// difficulty is within the tractable threshold.
    pub async fn route(&self, work_type: WorkType, difficulty: u32) -> ComputationMode {
        let config = self.config.read().await;
        if work_type.is_computable() && difficulty <= config.tractable_difficulty_threshold {
            ComputationMode::Real
        } else {
            ComputationMode::Simulated
        }
    }

    /// Replace the routing configuration, bumping the generation counter.
    pub async fn reconfigure(&self, config: RouterConfig) {
        *self.config.write().await = config;
        self.stats.write().await.algorithm_generation += 1;
    }

    pub async fn stats(&self) -> RouterStats {
        self.stats.read().await.clone()
    }

    /// Produce a result for (work type, difficulty).
    ///
    /// Never fails: an engine error falls back to the simulated generator
    /// instead of propagating.
    pub async fn compute(&self, work_type: WorkType, difficulty: u32) -> ComputedWork {
        let mode = self.route(work_type, difficulty).await;
        let budget_secs = self.config.read().await.engine_time_budget_secs;

        if mode == ComputationMode::Real {
            let budget = EngineBudget::from_secs(budget_secs);
            let started = std::time::Instant::now();
            match engines::compute(work_type, difficulty, &budget) {
                Ok(outcome) => {
                    let elapsed_ms = started.elapsed().as_millis() as u64;
                    self.stats.write().await.real_computations += 1;
                    return ComputedWork {
                        work_type,
                        difficulty,
                        computation_mode: ComputationMode::Real,
                        tractable: true,
                        confidence: 1.0,
                        verification: VerificationPayload {
                            method: format!("engine:{work_type}"),
                            checks_passed: 1,
                            checks_failed: 0,
                            partial: outcome.partial,
                            elapsed_ms,
                        },
                        computational_cost: outcome.ops,
                        energy_efficiency: efficiency_from_throughput(outcome.ops, elapsed_ms),
                        result: outcome.result,
                    };
                }
                Err(e) => {
                    warn!(
                        work_type = %work_type,
                        difficulty,
                        error = %e,
                        "engine failed, falling back to simulated path"
                    );
                    self.stats.write().await.engine_fallbacks += 1;
                }
            }
        }

        self.stats.write().await.simulated_computations += 1;
        self.simulate(work_type, difficulty)
    }

    /// Compute and assemble a signed work item for a worker.
    ///
    /// The item's scientific value is left at zero; the valuation engine
    /// assigns it before the item is persisted.
    pub async fn create_work_item(
        &self,
        worker_id: &str,
        work_type: WorkType,
        difficulty: u32,
    ) -> Result<WorkItem> {
        let computed = self.compute(work_type, difficulty).await;

        {
            let mut crypto = self.crypto.write().await;
            if !crypto.has_keypair(worker_id) {
                crypto.generate_keypair(worker_id)?;
            }
        }

        let mut item = WorkItem {
            id: Uuid::new_v4().to_string(),
            work_type: computed.work_type,
            difficulty: computed.difficulty,
            result: computed.result,
            verification: computed.verification,
            computational_cost: computed.computational_cost,
            energy_efficiency: computed.energy_efficiency,
            scientific_value: 0.0,
            worker_id: worker_id.to_string(),
            signature: String::new(),
            computation_mode: computed.computation_mode,
            tractable: computed.tractable,
            confidence: computed.confidence,
            timestamp: Utc::now(),
        };

        let signature = {
            let crypto = self.crypto.read().await;
            crypto.sign(worker_id, &item.canonical_signing_data())?
        };
        item.signature = signature.to_hex();

        info!(
            work_id = %item.id,
            work_type = %item.work_type,
            mode = item.computation_mode.as_str(),
            difficulty,
            "work item created"
        );
        Ok(item)
    }

    /// Fabricate a structurally valid but non-authoritative result.
    ///
    /// Tagged simulated and intractable so downstream scoring can discount
    /// it; confidence is deliberately below 1.
    fn simulate(&self, work_type: WorkType, difficulty: u32) -> ComputedWork {
        let mut rng = rand::thread_rng();
        let confidence = rng.gen_range(0.55..0.75);
        let d = u64::from(difficulty.max(1));

        let result = match work_type {
            WorkType::GoldbachVerification => ResultPayload::Goldbach(GoldbachResult {
                range_start: 4,
                range_end: d * 2_000,
                evens_tested: d * 1_000 - 1,
                counterexamples: Vec::new(),
                sample_decompositions: vec![
                    GoldbachPair { target: 4, prime_a: 2, prime_b: 2 },
                    GoldbachPair { target: 6, prime_a: 3, prime_b: 3 },
                    GoldbachPair { target: 8, prime_a: 3, prime_b: 5 },
                ],
                verification_method: "simulated".to_string(),
            }),
            WorkType::PrimeGapAnalysis => {
                let limit = d * 5_000;
                let mean = (limit as f64).ln();
                ResultPayload::PrimeGap(crate::models::PrimeGapResult {
                    sieve_limit: limit,
                    prime_count: (limit as f64 / mean) as usize,
                    mean_gap: mean,
                    std_dev_gap: mean * 0.8,
                    min_gap: 1,
                    max_gap: (mean * 4.0) as u64,
                    twin_prime_count: (limit as f64 / (mean * mean)) as usize,
                    resonance: rng.gen_range(0.3..0.7),
                })
            }
            WorkType::FibonacciConvergence => ResultPayload::Fibonacci(crate::models::FibonacciResult {
                sequence_length: (d as usize * 10).clamp(12, 1_400),
                final_ratio: crate::engines::fibonacci::GOLDEN_RATIO,
                golden_ratio_error: 1e-12,
                trailing_window: 10,
                converged: true,
            }),
            WorkType::CollatzConvergence => {
                let range_end = d * 500;
                ResultPayload::Collatz(crate::models::CollatzResult {
                    range_start: 1,
                    range_end,
                    tested: range_end,
                    converged: range_end,
                    convergence_rate: 1.0,
                    max_steps_observed: rng.gen_range(150..400),
                    failures: Vec::new(),
                })
            }
            WorkType::RiemannZero => ResultPayload::RiemannZero(RiemannZeroResult {
                zero_real: 0.5,
                zero_imag: rng.gen_range(14.0..10_000.0),
            }),
            WorkType::QuantumSimulation => ResultPayload::QuantumSimulation(QuantumSimulationResult {
                energy_levels: rng.gen_range(2..64),
                coherence_time_us: rng.gen_range(1.0..500.0),
                fidelity: rng.gen_range(0.8..0.999),
            }),
            WorkType::ParticleInteraction => {
                ResultPayload::ParticleInteraction(ParticleInteractionResult {
                    collision_energy_gev: rng.gen_range(10.0..13_000.0),
                    particle_count: rng.gen_range(2..1_000),
                    cross_section_pb: rng.gen_range(0.01..100.0),
                })
            }
            WorkType::Unknown => ResultPayload::Generic(serde_json::json!({
                "note": "simulated placeholder result",
                "difficulty": difficulty,
            })),
        };

        ComputedWork {
            work_type,
            difficulty,
            computation_mode: ComputationMode::Simulated,
            tractable: false,
            confidence,
            result,
            verification: VerificationPayload {
                method: "simulated".to_string(),
                checks_passed: 0,
                checks_failed: 0,
                partial: false,
                elapsed_ms: 0,
            },
            computational_cost: d * 1_000,
            energy_efficiency: rng.gen_range(0.4..0.8),
        }
    }
}

/// Squash ops-per-millisecond into (0, 1).
fn efficiency_from_throughput(ops: u64, elapsed_ms: u64) -> f64 {
    let throughput = ops as f64 / (elapsed_ms.max(1)) as f64;
    throughput / (throughput + 1_000.0)
}
