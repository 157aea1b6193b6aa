//! Scientific valuation
//!
//! Converts verified work into a dollar-denominated scientific value and
//! aggregates portfolios of values with diminishing returns, so total
//! value cannot inflate without bound as discovery counts grow.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::WorkType;

/// Lower bound for any single valuation.
pub const MIN_VALUE: f64 = 100.0;
/// Upper bound for any single valuation.
pub const MAX_VALUE: f64 = 2_000_000.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Dollar rate per compute-hour.
    pub compute_rate_per_hour: f64,
    /// Dollar rate per kWh consumed.
    pub energy_rate_per_kwh: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            compute_rate_per_hour: 0.12,
            energy_rate_per_kwh: 0.08,
            min_value: MIN_VALUE,
            max_value: MAX_VALUE,
        }
    }
}

/// Itemized valuation of a single work unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationBreakdown {
    pub base_value: f64,
    pub computational_effort_value: f64,
    pub research_impact_value: f64,
    pub total_value: f64,
    pub difficulty_multiplier: f64,
}

/// Result of clamping a valuation to the configured bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundsCheck {
    pub value: f64,
    pub clamped: bool,
}

/// Aggregate of many valuations with diminishing returns applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    pub raw_total: f64,
    pub average: f64,
    pub adjusted_total: f64,
    pub diminishing_factor: f64,
}

pub struct ValuationEngine {
    config: ValuationConfig,
}

impl ValuationEngine {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    /// Fixed per-type base value.
    pub fn base_value(work_type: WorkType) -> f64 {
        match work_type {
            WorkType::RiemannZero => 5_000.0,
            WorkType::QuantumSimulation => 3_000.0,
            WorkType::ParticleInteraction => 2_500.0,
            WorkType::GoldbachVerification => 1_500.0,
            WorkType::PrimeGapAnalysis => 1_200.0,
            WorkType::CollatzConvergence => 1_000.0,
            WorkType::FibonacciConvergence => 800.0,
            WorkType::Unknown => 500.0,
        }
    }

    /// Fixed per-type research impact factor.
    fn impact_factor(work_type: WorkType) -> f64 {
        match work_type {
            WorkType::RiemannZero => 1_200.0,
            WorkType::QuantumSimulation => 800.0,
            WorkType::ParticleInteraction => 600.0,
            WorkType::GoldbachVerification => 450.0,
            WorkType::PrimeGapAnalysis => 300.0,
            WorkType::CollatzConvergence => 200.0,
            WorkType::FibonacciConvergence => 150.0,
            WorkType::Unknown => 100.0,
        }
    }

    /// Value a single unit of verified work.
    pub fn scientific_value(
        &self,
        work_type: WorkType,
        difficulty: u32,
        compute_seconds: f64,
        energy_kwh: f64,
    ) -> ValuationBreakdown {
        let log_difficulty = f64::from(difficulty.max(1)).log10();
        let difficulty_multiplier = 1.0 + log_difficulty * 0.3;

        let base_value = Self::base_value(work_type);

        let compute_hours = compute_seconds.max(0.0) / 3_600.0;
        let computational_effort_value = (compute_hours * self.config.compute_rate_per_hour
            + energy_kwh.max(0.0) * self.config.energy_rate_per_kwh)
            * (1.0 + log_difficulty * 0.8);

        let research_impact_value =
            Self::impact_factor(work_type) * (1.0 + f64::from(difficulty) / 200.0).min(3.0);

        let total_value = (base_value
            + computational_effort_value
            + research_impact_value
            + base_value * (difficulty_multiplier - 1.0))
            .round();

        debug!(
            work_type = %work_type,
            difficulty,
            total_value,
            "valuation computed"
        );

        ValuationBreakdown {
            base_value,
            computational_effort_value,
            research_impact_value,
            total_value,
            difficulty_multiplier,
        }
    }

    /// Clamp a value into the configured bounds, reporting whether
    /// clamping occurred.
    pub fn validate_bounds(&self, value: f64) -> BoundsCheck {
        let clamped_value = value.clamp(self.config.min_value, self.config.max_value);
        BoundsCheck {
            value: clamped_value,
            clamped: (clamped_value - value).abs() > f64::EPSILON,
        }
    }

    /// Aggregate a portfolio of values with diminishing returns.
    ///
    /// The factor log10(n+1) / log10(n+10) shrinks strictly as the count
    /// grows, so the adjusted total never exceeds the raw total.
    pub fn aggregate(&self, values: &[f64]) -> Aggregation {
        let n = values.len();
        if n == 0 {
            return Aggregation {
                raw_total: 0.0,
                average: 0.0,
                adjusted_total: 0.0,
                diminishing_factor: 1.0,
            };
        }

        let raw_total: f64 = values.iter().sum();
        let average = raw_total / n as f64;
        let diminishing_factor = ((n + 1) as f64).log10() / ((n + 10) as f64).log10();
        let adjusted_total = (raw_total * diminishing_factor).round();

        Aggregation {
            raw_total,
            average,
            adjusted_total,
            diminishing_factor,
        }
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new(ValuationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_grows_with_difficulty() {
        let engine = ValuationEngine::default();
        let low = engine.scientific_value(WorkType::GoldbachVerification, 1, 60.0, 0.1);
        let high = engine.scientific_value(WorkType::GoldbachVerification, 100, 60.0, 0.1);
        assert!(high.total_value > low.total_value);
        assert!(high.difficulty_multiplier > low.difficulty_multiplier);
    }

    #[test]
    fn test_impact_capped_at_three_times() {
        let engine = ValuationEngine::default();
        let capped = engine.scientific_value(WorkType::RiemannZero, 1_000, 0.0, 0.0);
        assert!((capped.research_impact_value - 1_200.0 * 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_bounds_never_escape_range() {
        let engine = ValuationEngine::default();

        let low = engine.validate_bounds(3.0);
        assert!(low.clamped);
        assert!((low.value - MIN_VALUE).abs() < f64::EPSILON);

        let high = engine.validate_bounds(9e9);
        assert!(high.clamped);
        assert!((high.value - MAX_VALUE).abs() < f64::EPSILON);

        let mid = engine.validate_bounds(1_234.0);
        assert!(!mid.clamped);
        assert!((mid.value - 1_234.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_empty_identity() {
        let engine = ValuationEngine::default();
        let agg = engine.aggregate(&[]);
        assert_eq!(agg.raw_total, 0.0);
        assert_eq!(agg.average, 0.0);
        assert_eq!(agg.adjusted_total, 0.0);
        assert_eq!(agg.diminishing_factor, 1.0);
    }

    #[test]
    fn test_diminishing_factor_strictly_decreasing() {
        let engine = ValuationEngine::default();
        let mut previous = f64::INFINITY;
        for n in 1..=200usize {
            let values = vec![1_000.0; n];
            let agg = engine.aggregate(&values);
            assert!(agg.diminishing_factor < previous);
            assert!(agg.adjusted_total <= agg.raw_total);
            previous = agg.diminishing_factor;
        }
    }
}
