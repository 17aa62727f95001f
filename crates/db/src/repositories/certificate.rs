//! Certificate repository for database operations.
//!
//! Tier changes are conditional updates keyed on the total the correction
//! was computed against, so two corrections racing on one certificate cannot
//! both be recorded.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Alias, Expr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, UpdateMany,
};

use bolsa_core::fund::{
    CertificateDetails, CertificateRecord, CertificateRegistry, RecordError, TierChange,
};
use bolsa_shared::{CertificateId, Money};

use super::recharge::{actor, storage};
use crate::entities::certificates;
use crate::entities::sea_orm_active_enums::VehicleTier;

/// Certificate repository backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct CertificateRepository {
    db: DatabaseConnection,
}

impl CertificateRepository {
    /// Creates a new certificate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn require(&self, id: CertificateId) -> Result<CertificateRecord, RecordError> {
        self.find(id)
            .await?
            .ok_or(RecordError::NotFound(id.into_inner()))
    }
}

#[async_trait]
impl CertificateRegistry for CertificateRepository {
    async fn insert(&self, record: CertificateRecord) -> Result<CertificateRecord, RecordError> {
        let model = certificates::ActiveModel {
            id: Set(record.id.into_inner()),
            plate: Set(record.details.plate.clone()),
            owner_document: Set(record.details.owner_document.clone()),
            owner_name: Set(record.details.owner_name.clone()),
            notes: Set(record.details.notes.clone()),
            tier: Set(record.tier.into()),
            base_value: Set(record.base_value.amount()),
            commission: Set(record.commission.amount()),
            total: Set(record.total.amount()),
            issued_by: Set(record.issued_by.as_str().to_string()),
            issued_at: Set(record.issued_at.into()),
            updated_at: Set(record.updated_at.into()),
        };

        let inserted = model.insert(&self.db).await.map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                RecordError::Duplicate(record.id.into_inner())
            }
            _ => storage(err),
        })?;

        certificate_from_row(inserted)
    }

    async fn find(&self, id: CertificateId) -> Result<Option<CertificateRecord>, RecordError> {
        certificates::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(certificate_from_row)
            .transpose()
    }

    async fn list(&self) -> Result<Vec<CertificateRecord>, RecordError> {
        let rows = certificates::Entity::find()
            .order_by_desc(certificates::Column::IssuedAt)
            .order_by_desc(certificates::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?;

        rows.into_iter().map(certificate_from_row).collect()
    }

    async fn change_tier(
        &self,
        id: CertificateId,
        change: &TierChange,
    ) -> Result<CertificateRecord, RecordError> {
        let mut update = certificates::Entity::update_many()
            .col_expr(
                certificates::Column::Tier,
                Expr::val(VehicleTier::from(change.tier)).as_enum(Alias::new("vehicle_tier")),
            )
            .col_expr(
                certificates::Column::BaseValue,
                Expr::value(change.tariff.base_value.amount()),
            )
            .col_expr(
                certificates::Column::Commission,
                Expr::value(change.tariff.commission.amount()),
            )
            .col_expr(
                certificates::Column::Total,
                Expr::value(change.tariff.total().amount()),
            )
            .col_expr(certificates::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(details) = &change.details {
            update = with_details(update, details);
        }

        let result = update
            .filter(certificates::Column::Id.eq(id.into_inner()))
            .filter(certificates::Column::Total.eq(change.prior_total.amount()))
            .exec(&self.db)
            .await
            .map_err(storage)?;

        if result.rows_affected == 0 {
            // Either the certificate is gone or another correction won
            self.require(id).await?;
            return Err(RecordError::Stale(id.into_inner()));
        }

        self.require(id).await
    }

    async fn update_details(
        &self,
        id: CertificateId,
        details: &CertificateDetails,
    ) -> Result<CertificateRecord, RecordError> {
        let result = with_details(certificates::Entity::update_many(), details)
            .col_expr(certificates::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(certificates::Column::Id.eq(id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(storage)?;

        if result.rows_affected == 0 {
            return Err(RecordError::NotFound(id.into_inner()));
        }

        self.require(id).await
    }
}

fn with_details(
    update: UpdateMany<certificates::Entity>,
    details: &CertificateDetails,
) -> UpdateMany<certificates::Entity> {
    update
        .col_expr(certificates::Column::Plate, Expr::value(details.plate.clone()))
        .col_expr(
            certificates::Column::OwnerDocument,
            Expr::value(details.owner_document.clone()),
        )
        .col_expr(
            certificates::Column::OwnerName,
            Expr::value(details.owner_name.clone()),
        )
        .col_expr(certificates::Column::Notes, Expr::value(details.notes.clone()))
}

fn certificate_from_row(row: certificates::Model) -> Result<CertificateRecord, RecordError> {
    Ok(CertificateRecord {
        id: CertificateId::from_uuid(row.id),
        details: CertificateDetails {
            plate: row.plate,
            owner_document: row.owner_document,
            owner_name: row.owner_name,
            notes: row.notes,
        },
        tier: row.tier.into(),
        base_value: Money::new(row.base_value),
        commission: Money::new(row.commission),
        total: Money::new(row.total),
        issued_by: actor(&row.issued_by, &format!("certificate {}", row.id))?,
        issued_at: DateTime::<Utc>::from(row.issued_at),
        updated_at: DateTime::<Utc>::from(row.updated_at),
    })
}
