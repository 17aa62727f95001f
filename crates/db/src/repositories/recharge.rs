//! Recharge repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set, SqlErr,
};

use bolsa_core::fund::{RechargeRecord, RechargeRegistry, RecordError};
use bolsa_shared::{ActorId, Money, RechargeId};

use crate::entities::recharges;

/// Recharge repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct RechargeRepository {
    db: DatabaseConnection,
}

impl RechargeRepository {
    /// Creates a new recharge repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RechargeRegistry for RechargeRepository {
    async fn insert(&self, record: RechargeRecord) -> Result<RechargeRecord, RecordError> {
        let model = recharges::ActiveModel {
            id: Set(record.id.into_inner()),
            amount: Set(record.amount.amount()),
            external_reference: Set(record.external_reference.clone()),
            notes: Set(record.notes.clone()),
            registered_by: Set(record.registered_by.as_str().to_string()),
            registered_at: Set(record.registered_at.into()),
        };

        let inserted = model.insert(&self.db).await.map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                RecordError::Duplicate(record.id.into_inner())
            }
            _ => storage(err),
        })?;

        recharge_from_row(inserted)
    }

    async fn discard(&self, id: RechargeId) -> Result<(), RecordError> {
        let result = recharges::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await
            .map_err(storage)?;

        if result.rows_affected == 0 {
            return Err(RecordError::NotFound(id.into_inner()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RechargeRecord>, RecordError> {
        let rows = recharges::Entity::find()
            .order_by_desc(recharges::Column::RegisteredAt)
            .order_by_desc(recharges::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        rows.into_iter().map(recharge_from_row).collect()
    }
}

pub(crate) fn storage(err: DbErr) -> RecordError {
    RecordError::Storage(err.to_string())
}

pub(crate) fn actor(raw: &str, owner: &str) -> Result<ActorId, RecordError> {
    ActorId::new(raw).ok_or_else(|| RecordError::Storage(format!("{owner} has a blank actor")))
}

fn recharge_from_row(row: recharges::Model) -> Result<RechargeRecord, RecordError> {
    Ok(RechargeRecord {
        id: RechargeId::from_uuid(row.id),
        amount: Money::new(row.amount),
        external_reference: row.external_reference,
        notes: row.notes,
        registered_by: actor(&row.registered_by, &format!("recharge {}", row.id))?,
        registered_at: DateTime::<Utc>::from(row.registered_at),
    })
}
