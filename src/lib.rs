//! Mathledger Core
//!
//! Accepts units of mathematical work, verifies that each claimed result is
//! independently reproducible, aggregates verified work into hash-chained
//! blocks, and resolves acceptance through stake-weighted voting with an
//! immutable audit trail.
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── lib.rs         - Crate root with re-exports
//! ├── config.rs      - Env-driven configuration
//! ├── crypto/        - Hashing, Merkle aggregation, Ed25519 signing
//! │   ├── digest.rs  - Deterministic digests & Merkle roots
//! │   └── signing.rs - Per-entity key management
//! ├── models/        - Work items, blocks, stakers, votes, audit records
//! ├── engines/       - Deterministic math engines
//! │   ├── goldbach.rs   - Prime-pair verification
//! │   ├── prime_gap.rs  - Gap distribution analysis
//! │   ├── fibonacci.rs  - Golden-ratio convergence
//! │   └── collatz.rs    - 3n+1 convergence survey
//! ├── router.rs      - Real vs. simulated computation routing
//! ├── validation.rs  - Per-type formula acceptance rules
//! ├── valuation.rs   - Scientific value & diminishing-returns aggregation
//! ├── consensus.rs   - Stake-weighted tally & audit ledger backfill
//! ├── security.rs    - Composite security scoring & fraud flagging
//! ├── chain.rs       - Block assembly, nonce search, verification
//! └── storage/       - Storage trait + in-memory store
//! ```

pub mod chain;
pub mod config;
pub mod consensus;
pub mod crypto;
pub mod engines;
pub mod models;
pub mod router;
pub mod security;
pub mod storage;
pub mod validation;
pub mod valuation;

// Re-export the main service types for convenience
pub use chain::{BlockHeader, BlockIntegrityEngine, ChainConfig};
pub use config::{init_tracing, LedgerConfig, LoggingConfig};
pub use consensus::{
    BackfillSummary, ConsensusAuditor, ConsensusConfig, ConsensusDecision, ConsensusOutcome,
};
pub use crypto::{CryptoEngine, LedgerSignature};
pub use models::{
    AuditRecord, AuditRecordType, Block, ComputationMode, ResultPayload, Staker, ValidationVote,
    VerificationPayload, VoteStatus, WorkItem, WorkType,
};
pub use router::{ComputationRouter, ComputedWork, RouterConfig, RouterStats};
pub use security::{DiscoveryAuditEngine, FraudAssessment, RiskLevel, SecurityAssessment};
pub use storage::{memory::InMemoryStore, Storage, StorageError};
pub use validation::{validate, validate_item, FormulaVerdict};
pub use valuation::{Aggregation, BoundsCheck, ValuationBreakdown, ValuationConfig, ValuationEngine};
