//! Property-based tests for the Balance Engine.
//!
//! - Property 1: Sequential Model Equivalence
//! - Property 2: Non-Negativity
//! - Property 3: Chain Integrity
//! - Property 4: Concurrent Conservation

use std::sync::Arc;

use bolsa_shared::{ActorId, CertificateId, Money, RechargeId};
use futures::future::join_all;
use proptest::prelude::*;

use super::audit::{reconcile, verify_chain};
use super::engine::{BalanceEngine, RetryPolicy};
use super::error::LedgerError;
use super::memory::InMemoryLedgerStore;
use super::types::{EntryFilter, Posting, Reference};

#[derive(Debug, Clone, Copy)]
enum Op {
    Credit(i64),
    Debit(i64),
    Adjust(i64),
}

impl Op {
    const fn delta(self) -> i64 {
        match self {
            Self::Credit(amount) | Self::Adjust(amount) => amount,
            Self::Debit(amount) => -amount,
        }
    }
}

/// Strategy to generate positive amounts (1 to 1,000,000 pesos).
fn positive_amount() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

/// Strategy to generate non-zero signed deltas.
fn non_zero_delta() -> impl Strategy<Value = i64> {
    prop_oneof![-1_000_000i64..0i64, 1i64..1_000_000i64]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        positive_amount().prop_map(Op::Credit),
        positive_amount().prop_map(Op::Debit),
        non_zero_delta().prop_map(Op::Adjust),
    ]
}

fn actor() -> ActorId {
    ActorId::new("prop-tester").unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

async fn apply(engine: &BalanceEngine, op: Op) -> Result<Posting, LedgerError> {
    match op {
        Op::Credit(amount) => {
            engine
                .credit(Money::new(amount), Reference::recharge(RechargeId::new()), actor())
                .await
        }
        Op::Debit(amount) => {
            engine
                .debit(Money::new(amount), Reference::issuance(CertificateId::new()), actor())
                .await
        }
        Op::Adjust(delta) => {
            engine
                .adjust(Money::new(delta), Reference::correction(CertificateId::new()), actor())
                .await
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property 1 + 2: sequential operations match a plain integer model and
    /// a rejected operation changes nothing.
    #[test]
    fn prop_sequential_model_equivalence(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let rt = runtime();
        rt.block_on(async {
            let engine = BalanceEngine::new(Arc::new(InMemoryLedgerStore::new()), RetryPolicy::new(1));
            let mut model: i64 = 0;
            let mut version: i64 = 0;

            for op in ops {
                let expected = model + op.delta();
                let result = apply(&engine, op).await;

                if expected < 0 {
                    let is_insufficient = matches!(result, Err(LedgerError::InsufficientFunds { .. }));
                    prop_assert!(is_insufficient, "expected InsufficientFunds, got {:?}", result);
                } else {
                    let posting = result.unwrap();
                    prop_assert_eq!(posting.previous_balance, Money::new(model));
                    prop_assert_eq!(posting.new_balance(), Money::new(expected));
                    model = expected;
                    version += 1;
                }

                let balance = engine.balance().await.unwrap();
                prop_assert_eq!(balance.amount, Money::new(model));
                prop_assert_eq!(balance.version, version);
                prop_assert!(!balance.amount.is_negative());
            }
            Ok(())
        })?;
    }

    /// Property 3: the recorded history always replays to the stored balance.
    #[test]
    fn prop_chain_integrity(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let rt = runtime();
        rt.block_on(async {
            let engine = BalanceEngine::new(Arc::new(InMemoryLedgerStore::new()), RetryPolicy::new(1));
            for op in ops {
                let _ = apply(&engine, op).await;
            }

            let balance = engine.balance().await.unwrap();
            let entries = engine.entries(&EntryFilter::default()).await.unwrap();

            prop_assert_eq!(verify_chain(&entries), Ok(balance.amount));
            prop_assert!(reconcile(&balance, &entries).unwrap().consistent);
            for entry in &entries {
                prop_assert!(!entry.resulting_balance.is_negative());
            }
            Ok(())
        })?;
    }

    /// Property 4: concurrent operations from many tasks leave a balance
    /// equal to the sum of the entries that were accepted.
    #[test]
    fn prop_concurrent_conservation(
        opening in positive_amount(),
        ops in prop::collection::vec(op_strategy(), 1..24),
    ) {
        let rt = runtime();
        rt.block_on(async {
            let attempts = u32::try_from(ops.len()).unwrap() + 1;
            let engine = BalanceEngine::new(Arc::new(InMemoryLedgerStore::new()), RetryPolicy::new(attempts));
            engine
                .credit(Money::new(opening), Reference::recharge(RechargeId::new()), actor())
                .await
                .unwrap();

            let handles = ops.iter().copied().map(|op| {
                let engine = engine.clone();
                tokio::spawn(async move { apply(&engine, op).await })
            });

            let mut accepted = opening;
            for result in join_all(handles).await {
                match result.unwrap() {
                    Ok(posting) => accepted += posting.entry.amount.amount(),
                    Err(LedgerError::InsufficientFunds { .. }) => {}
                    Err(other) => prop_assert!(false, "unexpected error: {}", other),
                }
            }

            let balance = engine.balance().await.unwrap();
            let entries = engine.entries(&EntryFilter::default()).await.unwrap();
            prop_assert_eq!(balance.amount, Money::new(accepted));
            prop_assert_eq!(verify_chain(&entries), Ok(balance.amount));
            prop_assert!(!balance.amount.is_negative());
            Ok(())
        })?;
    }
}
