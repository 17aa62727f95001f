//! Balance Engine: the only writer of the ledger.
//!
//! Each mutation is a read-check-append cycle against the [`LedgerStore`].
//! The append carries the version that was read; if another writer got there
//! first the store answers `ConcurrencyConflict` and the cycle starts over
//! from a fresh read, up to [`RetryPolicy::max_attempts`] times.

use std::sync::Arc;

use bolsa_shared::{ActorId, LedgerConfig, Money};
use tracing::{debug, warn};

use super::error::LedgerError;
use super::store::LedgerStore;
use super::types::{Balance, EntryDraft, EntryFilter, EntryKind, LedgerEntry, Posting, Reference};

/// Bounded retry for version conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// Creates a policy; at least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    /// Attempts per mutation before reporting `Contention`.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&LedgerConfig::default())
    }
}

impl From<&LedgerConfig> for RetryPolicy {
    fn from(config: &LedgerConfig) -> Self {
        Self::new(config.max_attempts)
    }
}

/// Serializes balance mutations through optimistic concurrency.
#[derive(Clone)]
pub struct BalanceEngine {
    store: Arc<dyn LedgerStore>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for BalanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BalanceEngine")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl BalanceEngine {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Current balance snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the store is unreachable.
    pub async fn balance(&self) -> Result<Balance, LedgerError> {
        self.store.read_balance().await
    }

    /// Entries matching `filter`, in append order.
    ///
    /// # Errors
    ///
    /// Returns `StorageFailure` if the store is unreachable.
    pub async fn entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, LedgerError> {
        self.store.list_entries(filter).await
    }

    /// Adds `amount` to the balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless `amount > 0`, plus any error of [`Self::post`].
    pub async fn credit(
        &self,
        amount: Money,
        reference: Reference,
        actor: ActorId,
    ) -> Result<Posting, LedgerError> {
        let draft = EntryDraft::new(EntryKind::Credit, amount, reference, actor)?;
        self.post(draft).await
    }

    /// Takes `amount` out of the balance.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` unless `amount > 0`; `InsufficientFunds` if the balance
    /// cannot cover it; plus any error of [`Self::post`].
    pub async fn debit(
        &self,
        amount: Money,
        reference: Reference,
        actor: ActorId,
    ) -> Result<Posting, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount(amount));
        }
        let draft = EntryDraft::new(EntryKind::Debit, amount.checked_neg()?, reference, actor)?;
        self.post(draft).await
    }

    /// Applies a signed `delta` to the balance as an ADJUSTMENT.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` if `delta` is zero; `InsufficientFunds` if a negative
    /// delta cannot be covered; plus any error of [`Self::post`].
    pub async fn adjust(
        &self,
        delta: Money,
        reference: Reference,
        actor: ActorId,
    ) -> Result<Posting, LedgerError> {
        let draft = EntryDraft::new(EntryKind::Adjustment, delta, reference, actor)?;
        self.post(draft).await
    }

    /// Runs the read-check-append cycle for `draft`.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` / `Overflow` against the latest snapshot
    /// - `Contention` once every attempt hit a version conflict
    /// - `DuplicateReference` / `StorageFailure` from the store
    async fn post(&self, draft: EntryDraft) -> Result<Posting, LedgerError> {
        let max_attempts = self.retry.max_attempts();

        for attempt in 1..=max_attempts {
            let snapshot = self.store.read_balance().await?;
            snapshot.project(draft.amount)?;

            match self.store.append(draft.clone(), snapshot.version).await {
                Ok(entry) => {
                    debug!(
                        kind = %entry.kind,
                        amount = %entry.amount,
                        reference_id = %entry.reference.id,
                        version = entry.version,
                        attempt,
                        "ledger entry appended"
                    );
                    return Ok(Posting {
                        entry,
                        previous_balance: snapshot.amount,
                    });
                }
                Err(err) if err.is_retryable() => {
                    debug!(
                        attempt,
                        max_attempts,
                        version = snapshot.version,
                        error = %err,
                        "balance moved, retrying"
                    );
                    tokio::task::yield_now().await;
                }
                Err(err) => return Err(err),
            }
        }

        warn!(
            attempts = max_attempts,
            reference_id = %draft.reference.id,
            amount = %draft.amount,
            "giving up on contended balance"
        );
        Err(LedgerError::Contention {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use bolsa_shared::{CertificateId, RechargeId};
    use futures::future::join_all;
    use tokio::sync::Barrier;

    use super::*;
    use crate::ledger::InMemoryLedgerStore;

    fn actor() -> ActorId {
        ActorId::new("cashier-1").unwrap()
    }

    fn engine(max_attempts: u32) -> BalanceEngine {
        BalanceEngine::new(Arc::new(InMemoryLedgerStore::new()), RetryPolicy::new(max_attempts))
    }

    /// Store that reports a version conflict on the first `conflicts` appends.
    struct ConflictingStore {
        inner: InMemoryLedgerStore,
        conflicts: AtomicU32,
        appends: AtomicU32,
    }

    impl ConflictingStore {
        fn new(conflicts: u32) -> Self {
            Self {
                inner: InMemoryLedgerStore::new(),
                conflicts: AtomicU32::new(conflicts),
                appends: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl LedgerStore for ConflictingStore {
        async fn read_balance(&self) -> Result<Balance, LedgerError> {
            self.inner.read_balance().await
        }

        async fn append(
            &self,
            draft: EntryDraft,
            expected_version: i64,
        ) -> Result<LedgerEntry, LedgerError> {
            self.appends.fetch_add(1, Ordering::SeqCst);
            let remaining = self.conflicts.load(Ordering::SeqCst);
            if remaining > 0 {
                self.conflicts.store(remaining - 1, Ordering::SeqCst);
                return Err(LedgerError::ConcurrencyConflict {
                    expected: expected_version,
                    actual: expected_version + 1,
                });
            }
            self.inner.append(draft, expected_version).await
        }

        async fn list_entries(
            &self,
            filter: &EntryFilter,
        ) -> Result<Vec<LedgerEntry>, LedgerError> {
            self.inner.list_entries(filter).await
        }
    }

    #[tokio::test]
    async fn test_credit_then_debit() {
        let engine = engine(5);

        let posting = engine
            .credit(Money::new(1_000_000), Reference::recharge(RechargeId::new()), actor())
            .await
            .unwrap();
        assert_eq!(posting.previous_balance, Money::ZERO);
        assert_eq!(posting.new_balance(), Money::new(1_000_000));

        let posting = engine
            .debit(Money::new(286_200), Reference::issuance(CertificateId::new()), actor())
            .await
            .unwrap();
        assert_eq!(posting.entry.amount, Money::new(-286_200));
        assert_eq!(posting.previous_balance, Money::new(1_000_000));
        assert_eq!(posting.new_balance(), Money::new(713_800));

        let balance = engine.balance().await.unwrap();
        assert_eq!(balance.amount, Money::new(713_800));
        assert_eq!(balance.version, 2);
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let engine = engine(5);
        let reference = Reference::recharge(RechargeId::new());

        for amount in [0, -1] {
            assert!(matches!(
                engine.credit(Money::new(amount), reference, actor()).await,
                Err(LedgerError::InvalidAmount(_))
            ));
            assert!(matches!(
                engine.debit(Money::new(amount), reference, actor()).await,
                Err(LedgerError::InvalidAmount(_))
            ));
        }
        assert!(matches!(
            engine.adjust(Money::ZERO, reference, actor()).await,
            Err(LedgerError::InvalidAmount(_))
        ));
        assert_eq!(engine.balance().await.unwrap().version, 0);
    }

    #[tokio::test]
    async fn test_debit_on_empty_fund_is_insufficient() {
        let engine = engine(5);
        let err = engine
            .debit(Money::new(286_200), Reference::issuance(CertificateId::new()), actor())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: Money::ZERO,
                required: Money::new(286_200),
            }
        );
        assert!(engine.entries(&EntryFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_credit_overflow_is_rejected() {
        let engine = engine(5);
        engine
            .credit(Money::new(i64::MAX), Reference::recharge(RechargeId::new()), actor())
            .await
            .unwrap();

        let err = engine
            .credit(Money::new(1), Reference::recharge(RechargeId::new()), actor())
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::Overflow);
        assert_eq!(engine.balance().await.unwrap().amount, Money::new(i64::MAX));
    }

    #[tokio::test]
    async fn test_retries_through_transient_conflicts() {
        let store = Arc::new(ConflictingStore::new(2));
        let engine = BalanceEngine::new(store.clone(), RetryPolicy::new(3));

        let posting = engine
            .credit(Money::new(500), Reference::recharge(RechargeId::new()), actor())
            .await
            .unwrap();

        assert_eq!(posting.new_balance(), Money::new(500));
        assert_eq!(store.appends.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_surface_contention() {
        let store = Arc::new(ConflictingStore::new(10));
        let engine = BalanceEngine::new(store.clone(), RetryPolicy::new(3));

        let err = engine
            .credit(Money::new(500), Reference::recharge(RechargeId::new()), actor())
            .await
            .unwrap_err();

        assert_eq!(err, LedgerError::Contention { attempts: 3 });
        assert_eq!(store.appends.load(Ordering::SeqCst), 3);
        assert_eq!(engine.balance().await.unwrap().amount, Money::ZERO);
    }

    #[test]
    fn test_retry_policy_makes_at_least_one_attempt() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::default().max_attempts(), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_credits_are_all_applied() {
        const WRITERS: usize = 16;
        let engine = engine(u32::try_from(WRITERS).unwrap() + 1);
        let barrier = Arc::new(Barrier::new(WRITERS));

        let handles = (0..WRITERS).map(|_| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                engine
                    .credit(Money::new(1_000), Reference::recharge(RechargeId::new()), actor())
                    .await
            })
        });

        for result in join_all(handles).await {
            result.unwrap().unwrap();
        }

        let balance = engine.balance().await.unwrap();
        assert_eq!(balance.amount, Money::new(16_000));
        assert_eq!(balance.version, 16);

        let entries = engine.entries(&EntryFilter::default()).await.unwrap();
        let versions: Vec<i64> = entries.iter().map(|e| e.version).collect();
        assert_eq!(versions, (1..=16).collect::<Vec<_>>());
    }
}
