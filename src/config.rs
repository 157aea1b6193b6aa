//! Configuration for the ledger core
//!
//! Every tunable is env-overridable with a `MATHLEDGER_` prefix and
//! validated before use. Embedders construct the config once and hand the
//! relevant sections to each service.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use tracing::info;

use crate::chain::ChainConfig;
use crate::consensus::ConsensusConfig;
use crate::router::RouterConfig;
use crate::valuation::ValuationConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub router: RouterConfig,
    pub consensus: ConsensusConfig,
    pub valuation: ValuationConfig,
    pub chain: ChainConfig,
    pub logging: LoggingConfig,
}

impl LedgerConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults, then validate.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(threshold) = env::var("MATHLEDGER_TRACTABLE_DIFFICULTY") {
            config.router.tractable_difficulty_threshold = threshold
                .parse()
                .context("invalid MATHLEDGER_TRACTABLE_DIFFICULTY value")?;
        }

        if let Ok(budget) = env::var("MATHLEDGER_ENGINE_BUDGET_SECS") {
            config.router.engine_time_budget_secs = budget
                .parse()
                .context("invalid MATHLEDGER_ENGINE_BUDGET_SECS value")?;
        }

        if let Ok(threshold) = env::var("MATHLEDGER_APPROVAL_THRESHOLD_PCT") {
            config.consensus.approval_threshold_pct = threshold
                .parse()
                .context("invalid MATHLEDGER_APPROVAL_THRESHOLD_PCT value")?;
        }

        if let Ok(rate) = env::var("MATHLEDGER_COMPUTE_RATE_PER_HOUR") {
            config.valuation.compute_rate_per_hour = rate
                .parse()
                .context("invalid MATHLEDGER_COMPUTE_RATE_PER_HOUR value")?;
        }

        if let Ok(rate) = env::var("MATHLEDGER_ENERGY_RATE_PER_KWH") {
            config.valuation.energy_rate_per_kwh = rate
                .parse()
                .context("invalid MATHLEDGER_ENERGY_RATE_PER_KWH value")?;
        }

        if let Ok(ceiling) = env::var("MATHLEDGER_NONCE_CEILING") {
            config.chain.nonce_ceiling = ceiling
                .parse()
                .context("invalid MATHLEDGER_NONCE_CEILING value")?;
        }

        if let Ok(epsilon) = env::var("MATHLEDGER_VALUE_EPSILON") {
            config.chain.value_epsilon = epsilon
                .parse()
                .context("invalid MATHLEDGER_VALUE_EPSILON value")?;
        }

        if let Ok(level) = env::var("MATHLEDGER_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        info!(
            tractable_difficulty = config.router.tractable_difficulty_threshold,
            approval_threshold = config.consensus.approval_threshold_pct,
            nonce_ceiling = config.chain.nonce_ceiling,
            "ledger configuration loaded"
        );
        Ok(config)
    }

    /// Validate cross-field invariants.
    pub fn validate(&self) -> Result<()> {
        if self.router.engine_time_budget_secs == 0 {
            anyhow::bail!("engine time budget must be non-zero");
        }

        // Below 50% both sides could clear the bar at once; above 100%
        // consensus becomes unreachable.
        if self.consensus.approval_threshold_pct <= 50.0
            || self.consensus.approval_threshold_pct > 100.0
        {
            anyhow::bail!(
                "approval threshold must be in (50, 100], got {}",
                self.consensus.approval_threshold_pct
            );
        }

        if self.valuation.compute_rate_per_hour < 0.0 || self.valuation.energy_rate_per_kwh < 0.0 {
            anyhow::bail!("valuation rates must be non-negative");
        }

        if self.valuation.min_value >= self.valuation.max_value {
            anyhow::bail!(
                "valuation bounds inverted: min {} >= max {}",
                self.valuation.min_value,
                self.valuation.max_value
            );
        }

        if self.chain.nonce_ceiling == 0 {
            anyhow::bail!("nonce ceiling must be non-zero");
        }

        if self.chain.value_epsilon < 0.0 {
            anyhow::bail!("value epsilon must be non-negative");
        }

        Ok(())
    }
}

/// Install a global tracing subscriber honoring the configured level.
///
/// Intended for binaries and test harnesses embedding the core; returns an
/// error if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log level: {}", config.level))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
