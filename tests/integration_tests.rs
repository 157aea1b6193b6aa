//! Integration tests for the ledger core
//!
//! These tests verify end-to-end functionality: computation routing,
//! formula validation, valuation, stake-weighted consensus with audit
//! backfill, security scoring, and block assembly round-trips.

use std::sync::Arc;
use tokio::sync::RwLock;

use mathledger::{
    crypto, BlockIntegrityEngine, ChainConfig, ComputationMode, ComputationRouter,
    ConsensusAuditor, ConsensusConfig, ConsensusDecision, CryptoEngine, DiscoveryAuditEngine,
    InMemoryStore, ResultPayload, RiskLevel, RouterConfig, Staker, Storage, ValidationVote,
    ValuationEngine, VoteStatus, WorkItem, WorkType,
};

// ============================================================================
// Test Helpers
// ============================================================================

struct TestLedger {
    store: Arc<InMemoryStore>,
    router: ComputationRouter,
    valuation: ValuationEngine,
    auditor: ConsensusAuditor,
    security: DiscoveryAuditEngine,
    chain: BlockIntegrityEngine,
}

fn create_test_ledger() -> TestLedger {
    let store = Arc::new(InMemoryStore::new());
    let crypto_engine = Arc::new(RwLock::new(CryptoEngine::new()));

    TestLedger {
        store: store.clone(),
        router: ComputationRouter::new(RouterConfig::default(), crypto_engine.clone()),
        valuation: ValuationEngine::default(),
        auditor: ConsensusAuditor::new(
            store.clone(),
            crypto_engine.clone(),
            ConsensusConfig::default(),
        ),
        security: DiscoveryAuditEngine::new(store.clone()),
        chain: BlockIntegrityEngine::new(store, ChainConfig::default()),
    }
}

/// Compute, validate, value, and persist one work item.
async fn produce_work(
    ledger: &TestLedger,
    worker_id: &str,
    work_type: WorkType,
    difficulty: u32,
) -> WorkItem {
    let mut item = ledger
        .router
        .create_work_item(worker_id, work_type, difficulty)
        .await
        .unwrap();

    let breakdown = ledger.valuation.scientific_value(
        item.work_type,
        item.difficulty,
        item.verification.elapsed_ms as f64 / 1_000.0,
        0.05,
    );
    item.scientific_value = ledger.valuation.validate_bounds(breakdown.total_value).value;

    ledger.store.put_work_item(item.clone()).await.unwrap();
    item
}

/// Register stakers and cast one vote each on a work item.
async fn cast_votes(ledger: &TestLedger, work_id: &str, ballots: &[(&str, f64, VoteStatus)]) {
    for (staker_id, stake, status) in ballots {
        ledger
            .store
            .put_staker(Staker::new(*staker_id, *stake))
            .await
            .unwrap();
        ledger
            .store
            .put_validation_vote(ValidationVote::new(work_id, *staker_id, *status, *stake))
            .await
            .unwrap();
    }
}

// ============================================================================
// End-to-End Pipeline
// ============================================================================

mod pipeline {
    use super::*;

    #[tokio::test]
    async fn test_full_work_lifecycle() {
        let ledger = create_test_ledger();

        // Compute a real Goldbach verification and value it.
        let item = produce_work(&ledger, "worker_1", WorkType::GoldbachVerification, 10).await;
        assert_eq!(item.computation_mode, ComputationMode::Real);
        assert!(item.tractable);
        assert!(item.scientific_value >= 100.0);

        let verdict = mathledger::validate_item(&item);
        assert!(verdict.valid, "details: {}", verdict.details);

        // Stake-weighted approval (the 60/30/10 worked example).
        cast_votes(
            &ledger,
            &item.id,
            &[
                ("s1", 60.0, VoteStatus::Approved),
                ("s2", 30.0, VoteStatus::Rejected),
                ("s3", 10.0, VoteStatus::Rejected),
            ],
        )
        .await;

        let outcome = ledger.auditor.tally(&item.id).await.unwrap();
        assert!((outcome.approval_percentage - 60.0).abs() < 1e-9);
        assert_eq!(outcome.decision, ConsensusDecision::Approved);

        // Backfill the vote ledger, then record the decision.
        let summary = ledger.auditor.backfill_missing_records().await.unwrap();
        assert_eq!(summary.created, 3);

        let decision = ledger.auditor.record_consensus_decision(&item.id).await.unwrap();
        assert!(decision.is_some());

        // The item should now assess as well-audited.
        let assessment = ledger.security.assess_work(&item.id).await.unwrap();
        assert!(assessment.formula_valid);
        assert!(assessment.signature_present);
        assert!(assessment.computation_verified);
        assert!(assessment.independently_reverified);
        assert!(assessment.security_score >= 50.0);

        // Seal the accepted work into a block and verify the round-trip.
        let items = vec![item];
        let block = ledger.chain.seal_block(&items, "miner_1", 4).await.unwrap();
        assert_eq!(block.index, 0);
        assert!(ledger.chain.verify_block(&block, &items));
    }

    #[tokio::test]
    async fn test_simulated_path_for_intractable_work() {
        let ledger = create_test_ledger();

        // Above the tractable threshold: must be simulated and discounted.
        let item = produce_work(&ledger, "worker_1", WorkType::GoldbachVerification, 200).await;
        assert_eq!(item.computation_mode, ComputationMode::Simulated);
        assert!(!item.tractable);
        assert!(item.confidence < 1.0);

        // Simulated results are still structurally valid.
        let verdict = mathledger::validate_item(&item);
        assert!(verdict.valid);

        // But never counted as verified or re-verifiable computation.
        let assessment = ledger.security.assess(&item, &[]);
        assert!(!assessment.computation_verified);
        assert!(!assessment.independently_reverified);
    }

    #[tokio::test]
    async fn test_multi_item_block_value_aggregation() {
        let ledger = create_test_ledger();

        let mut items = Vec::new();
        for (i, work_type) in [
            WorkType::GoldbachVerification,
            WorkType::PrimeGapAnalysis,
            WorkType::CollatzConvergence,
            WorkType::FibonacciConvergence,
        ]
        .into_iter()
        .enumerate()
        {
            items.push(produce_work(&ledger, &format!("worker_{i}"), work_type, 3).await);
        }

        let values: Vec<f64> = items.iter().map(|w| w.scientific_value).collect();
        let aggregation = ledger.valuation.aggregate(&values);
        assert!(aggregation.adjusted_total <= aggregation.raw_total);
        assert!(aggregation.diminishing_factor < 1.0);

        let block = ledger.chain.seal_block(&items, "miner_1", 0).await.unwrap();
        let expected_total: f64 = values.iter().sum();
        assert!((block.total_scientific_value - expected_total).abs() < 0.01);
        assert!(ledger.chain.verify_block(&block, &items));
        assert_eq!(block.work_refs.len(), 4);
    }
}

// ============================================================================
// Consensus & Audit Ledger
// ============================================================================

mod consensus_flow {
    use super::*;

    #[tokio::test]
    async fn test_backfill_twice_creates_nothing_new() {
        let ledger = create_test_ledger();
        let item = produce_work(&ledger, "worker_1", WorkType::CollatzConvergence, 2).await;
        cast_votes(
            &ledger,
            &item.id,
            &[
                ("s1", 40.0, VoteStatus::Approved),
                ("s2", 25.0, VoteStatus::Approved),
            ],
        )
        .await;

        let first = ledger.auditor.backfill_missing_records().await.unwrap();
        assert_eq!(first.created, 2);
        assert_eq!(first.skipped, 0);

        let second = ledger.auditor.backfill_missing_records().await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.already_recorded, 2);
    }

    #[tokio::test]
    async fn test_orphan_votes_reported_not_fatal() {
        let ledger = create_test_ledger();
        let item = produce_work(&ledger, "worker_1", WorkType::PrimeGapAnalysis, 2).await;
        cast_votes(&ledger, &item.id, &[("s1", 50.0, VoteStatus::Approved)]).await;

        // A vote for a work item the store never saw.
        ledger
            .store
            .put_validation_vote(ValidationVote::new(
                "missing_work",
                "s1",
                VoteStatus::Approved,
                50.0,
            ))
            .await
            .unwrap();

        let summary = ledger.auditor.backfill_missing_records().await.unwrap();
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 1);
    }

    #[tokio::test]
    async fn test_rejection_by_majority_stake() {
        let ledger = create_test_ledger();
        let item = produce_work(&ledger, "worker_1", WorkType::FibonacciConvergence, 2).await;
        cast_votes(
            &ledger,
            &item.id,
            &[
                ("s1", 10.0, VoteStatus::Approved),
                ("s2", 90.0, VoteStatus::Rejected),
            ],
        )
        .await;

        let outcome = ledger.auditor.tally(&item.id).await.unwrap();
        assert_eq!(outcome.decision, ConsensusDecision::Rejected);
        assert!((outcome.approval_percentage - 10.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_audit_chain_links_through_decision() {
        let ledger = create_test_ledger();
        let item = produce_work(&ledger, "worker_1", WorkType::GoldbachVerification, 2).await;
        cast_votes(&ledger, &item.id, &[("s1", 100.0, VoteStatus::Approved)]).await;

        ledger.auditor.backfill_missing_records().await.unwrap();
        ledger.auditor.record_consensus_decision(&item.id).await.unwrap();

        let records = ledger.store.get_recent_audit_records(10).await.unwrap();
        assert_eq!(records.len(), 2);
        // Newest first: the decision record chains to the vote record.
        assert_eq!(
            records[0].previous_record_hash.as_deref(),
            Some(records[1].activity_hash.as_str())
        );
    }

    #[tokio::test]
    async fn test_concurrent_backfills_stay_idempotent() {
        let ledger = create_test_ledger();
        let item = produce_work(&ledger, "worker_1", WorkType::CollatzConvergence, 1).await;
        cast_votes(
            &ledger,
            &item.id,
            &[
                ("s1", 30.0, VoteStatus::Approved),
                ("s2", 30.0, VoteStatus::Approved),
                ("s3", 30.0, VoteStatus::Approved),
            ],
        )
        .await;

        let (a, b) = tokio::join!(
            ledger.auditor.backfill_missing_records(),
            ledger.auditor.backfill_missing_records(),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(a.created + b.created, 3);
        assert_eq!(ledger.store.audit_record_count().await, 3);
    }
}

// ============================================================================
// Security Scoring & Fraud
// ============================================================================

mod security_flow {
    use super::*;

    #[tokio::test]
    async fn test_fraudulent_item_flagged() {
        let ledger = create_test_ledger();

        // Forge an item: off-critical-line zero, garbage signature, no votes.
        let mut item = produce_work(&ledger, "worker_1", WorkType::RiemannZero, 5).await;
        item.id = "forged".to_string();
        item.result = ResultPayload::RiemannZero(mathledger::models::RiemannZeroResult {
            zero_real: 0.3,
            zero_imag: 21.0,
        });
        item.signature = "zz-not-hex".to_string();
        item.scientific_value = 0.0;
        ledger.store.put_work_item(item).await.unwrap();

        let fraud = ledger.security.detect_fraud("forged").await.unwrap();
        assert!(fraud.fraudulent);
        assert!(fraud.indicators.len() >= 2);
        assert!(fraud.confidence >= 60.0);
        assert!(fraud.confidence <= 95.0);
    }

    #[tokio::test]
    async fn test_honest_item_clears_fraud_check() {
        let ledger = create_test_ledger();
        let item = produce_work(&ledger, "worker_1", WorkType::GoldbachVerification, 5).await;
        cast_votes(
            &ledger,
            &item.id,
            &[
                ("s1", 50.0, VoteStatus::Approved),
                ("s2", 50.0, VoteStatus::Approved),
            ],
        )
        .await;

        let fraud = ledger.security.detect_fraud(&item.id).await.unwrap();
        assert!(!fraud.fraudulent);

        let assessment = ledger.security.assess_work(&item.id).await.unwrap();
        assert!(matches!(
            assessment.risk_level,
            RiskLevel::Low | RiskLevel::Medium
        ));
    }
}

// ============================================================================
// Testable Properties
// ============================================================================

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_merkle_root_deterministic(leaves in proptest::collection::vec("[a-f0-9]{8,64}", 1..32)) {
            let once = crypto::merkle_root(&leaves);
            let twice = crypto::merkle_root(&leaves);
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.len(), 64);
        }

        #[test]
        fn prop_diminishing_factor_monotonic(n1 in 1usize..100, extra in 1usize..100) {
            let engine = ValuationEngine::default();
            let n2 = n1 + extra;
            let f1 = engine.aggregate(&vec![500.0; n1]).diminishing_factor;
            let f2 = engine.aggregate(&vec![500.0; n2]).diminishing_factor;
            prop_assert!(f2 <= f1);
        }

        #[test]
        fn prop_bounds_always_in_range(value in -1e12f64..1e12) {
            let engine = ValuationEngine::default();
            let checked = engine.validate_bounds(value);
            prop_assert!(checked.value >= 100.0);
            prop_assert!(checked.value <= 2_000_000.0);
        }

        #[test]
        fn prop_adjusted_total_never_exceeds_raw(values in proptest::collection::vec(100.0f64..10_000.0, 1..50)) {
            let engine = ValuationEngine::default();
            let agg = engine.aggregate(&values);
            prop_assert!(agg.adjusted_total <= agg.raw_total);
        }
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
}
