//! Cryptographic utilities for the ledger core
//!
//! Provides:
//! - Deterministic string hashing and Merkle aggregation over ordered
//!   work-item hashes (block integrity)
//! - Ed25519 signing and verification for work items, audit records, and
//!   block candidates
//! - Key management per entity (worker, auditor, miner)

pub mod digest;
pub mod signing;

pub use digest::{hash, merkle_root, pad_digest, DIGEST_WIDTH, EMPTY_ROOT};
pub use signing::{CryptoEngine, KeyPair, LedgerSignature};
