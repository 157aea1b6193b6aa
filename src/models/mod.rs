//! Ledger data model
//!
//! Work items, blocks, stakers, votes, and the immutable audit ledger.
//! All entities are plain serde structs; lifecycle rules (create-once,
//! append-only) are enforced by the services and the storage boundary.

pub mod audit;
pub mod block;
pub mod staker;
pub mod vote;
pub mod work;

pub use audit::{AuditRecord, AuditRecordType};
pub use block::Block;
pub use staker::Staker;
pub use vote::{ValidationVote, VoteStatus};
pub use work::{
    CollatzResult, ComputationMode, FibonacciResult, GoldbachPair, GoldbachResult,
    ParticleInteractionResult, PrimeGapResult, QuantumSimulationResult, ResultPayload,
    RiemannZeroResult, VerificationPayload, WorkItem, WorkType,
};
