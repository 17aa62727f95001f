//! Ledger repository: the PostgreSQL Ledger Store.
//!
//! The balance lives in the single `bolsa` row; entries live in the
//! append-only `ledger_entries` table. An append updates the row under a
//! version check and inserts the entry in the same database transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use tracing::{debug, warn};

use bolsa_core::ledger::{
    Balance, EntryDraft, EntryFilter, LedgerEntry, LedgerError, LedgerStore, Reference,
};
use bolsa_shared::{ActorId, LedgerEntryId, Money};

use crate::entities::{bolsa, ledger_entries};

/// Name of the partial unique index guarding recharge and issuance references.
const REFERENCE_INDEX: &str = "uq_ledger_entries_reference";

/// Ledger repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Reads the bolsa row, creating it on first access.
    async fn load_or_create<C: ConnectionTrait>(conn: &C) -> Result<bolsa::Model, DbErr> {
        if let Some(row) = bolsa::Entity::find_by_id(bolsa::SINGLETON_ID).one(conn).await? {
            return Ok(row);
        }

        let opening = bolsa::ActiveModel {
            id: Set(bolsa::SINGLETON_ID),
            current_amount: Set(0),
            version: Set(0),
            updated_at: Set(Utc::now().into()),
        };
        bolsa::Entity::insert(opening)
            .on_conflict(OnConflict::column(bolsa::Column::Id).do_nothing().to_owned())
            .exec_without_returning(conn)
            .await?;

        bolsa::Entity::find_by_id(bolsa::SINGLETON_ID)
            .one(conn)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("bolsa row missing after insert".to_string()))
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    async fn read_balance(&self) -> Result<Balance, LedgerError> {
        let row = Self::load_or_create(&self.db).await.map_err(storage)?;
        Ok(balance_from_row(&row))
    }

    async fn append(
        &self,
        draft: EntryDraft,
        expected_version: i64,
    ) -> Result<LedgerEntry, LedgerError> {
        let txn = self.db.begin().await.map_err(storage)?;

        // 1. Check the version against the current row
        let current = balance_from_row(&Self::load_or_create(&txn).await.map_err(storage)?);
        if current.version != expected_version {
            debug!(expected = expected_version, actual = current.version, "Stale ledger version");
            return Err(LedgerError::ConcurrencyConflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        // 2. Compute the entry; rejects overdrafts and overflow
        let now = Utc::now();
        let entry = LedgerEntry::from_draft(draft, &current, now)?;

        // 3. Move the balance, only if nobody committed in between
        let updated = bolsa::Entity::update_many()
            .col_expr(
                bolsa::Column::CurrentAmount,
                Expr::value(entry.resulting_balance.amount()),
            )
            .col_expr(bolsa::Column::Version, Expr::value(entry.version))
            .col_expr(bolsa::Column::UpdatedAt, Expr::value(now))
            .filter(bolsa::Column::Id.eq(bolsa::SINGLETON_ID))
            .filter(bolsa::Column::Version.eq(expected_version))
            .exec(&txn)
            .await
            .map_err(storage)?;

        if updated.rows_affected == 0 {
            let actual = bolsa::Entity::find_by_id(bolsa::SINGLETON_ID)
                .one(&txn)
                .await
                .map_err(storage)?
                .map_or(expected_version, |row| row.version);
            debug!(expected = expected_version, actual, "Lost the bolsa row to a concurrent writer");
            return Err(LedgerError::ConcurrencyConflict {
                expected: expected_version,
                actual,
            });
        }

        // 4. Record the entry
        let model = ledger_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            kind: Set(entry.kind.into()),
            amount: Set(entry.amount.amount()),
            reference_kind: Set(entry.reference.kind.into()),
            reference_id: Set(entry.reference.id),
            resulting_balance: Set(entry.resulting_balance.amount()),
            version: Set(entry.version),
            actor_id: Set(entry.actor_id.as_str().to_string()),
            created_at: Set(now.into()),
        };
        if let Err(err) = model.insert(&txn).await {
            return Err(classify_insert_error(&entry, err));
        }

        // 5. Commit; on failure neither the entry nor the balance is visible
        txn.commit().await.map_err(storage)?;

        Ok(entry)
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<LedgerEntry>, LedgerError> {
        let mut query = ledger_entries::Entity::find();

        if let Some(kind) = filter.reference_kind {
            query = query.filter(ledger_entries::Column::ReferenceKind.eq(
                crate::entities::sea_orm_active_enums::ReferenceKind::from(kind),
            ));
        }

        if let Some(reference_id) = filter.reference_id {
            query = query.filter(ledger_entries::Column::ReferenceId.eq(reference_id));
        }

        if let Some(since) = filter.since {
            query = query.filter(ledger_entries::Column::CreatedAt.gte(since));
        }

        let rows = query
            .order_by_asc(ledger_entries::Column::Version)
            .all(&self.db)
            .await
            .map_err(storage)?;

        rows.into_iter().map(entry_from_row).collect()
    }
}

fn storage(err: DbErr) -> LedgerError {
    LedgerError::StorageFailure(err.to_string())
}

fn classify_insert_error(entry: &LedgerEntry, err: DbErr) -> LedgerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) if message.contains(REFERENCE_INDEX) => {
            LedgerError::DuplicateReference {
                kind: entry.kind,
                reference: entry.reference,
            }
        }
        Some(SqlErr::UniqueConstraintViolation(message)) => {
            warn!(version = entry.version, %message, "Ledger version already taken");
            LedgerError::ConcurrencyConflict {
                expected: entry.version - 1,
                actual: entry.version,
            }
        }
        _ => storage(err),
    }
}

fn balance_from_row(row: &bolsa::Model) -> Balance {
    Balance {
        amount: Money::new(row.current_amount),
        version: row.version,
        updated_at: DateTime::<Utc>::from(row.updated_at),
    }
}

fn entry_from_row(row: ledger_entries::Model) -> Result<LedgerEntry, LedgerError> {
    let actor_id = ActorId::new(&row.actor_id).ok_or_else(|| {
        LedgerError::StorageFailure(format!("ledger entry {} has a blank actor", row.id))
    })?;

    Ok(LedgerEntry {
        id: LedgerEntryId::from_uuid(row.id),
        kind: row.kind.into(),
        amount: Money::new(row.amount),
        reference: Reference {
            kind: row.reference_kind.into(),
            id: row.reference_id,
        },
        resulting_balance: Money::new(row.resulting_balance),
        version: row.version,
        actor_id,
        created_at: DateTime::<Utc>::from(row.created_at),
    })
}
