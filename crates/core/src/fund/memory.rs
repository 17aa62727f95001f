//! In-memory registries.
//!
//! Intended for tests/dev, mirroring [`crate::ledger::InMemoryLedgerStore`].

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bolsa_shared::{CertificateId, RechargeId};
use chrono::Utc;

use super::error::RecordError;
use super::records::{
    CertificateDetails, CertificateRecord, CertificateRegistry, RechargeRecord, RechargeRegistry,
    TierChange,
};

fn poisoned<T>(_: T) -> RecordError {
    RecordError::Storage("registry lock poisoned".to_string())
}

/// In-memory recharge registry.
#[derive(Debug, Default)]
pub struct InMemoryRechargeRegistry {
    records: RwLock<BTreeMap<RechargeId, RechargeRecord>>,
}

impl InMemoryRechargeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RechargeRegistry for InMemoryRechargeRegistry {
    async fn insert(&self, record: RechargeRecord) -> Result<RechargeRecord, RecordError> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.contains_key(&record.id) {
            return Err(RecordError::Duplicate(record.id.into_inner()));
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn discard(&self, id: RechargeId) -> Result<(), RecordError> {
        self.records
            .write()
            .map_err(poisoned)?
            .remove(&id)
            .map(|_| ())
            .ok_or(RecordError::NotFound(id.into_inner()))
    }

    async fn list(&self) -> Result<Vec<RechargeRecord>, RecordError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.values().rev().cloned().collect())
    }
}

/// In-memory certificate registry.
#[derive(Debug, Default)]
pub struct InMemoryCertificateRegistry {
    records: RwLock<BTreeMap<CertificateId, CertificateRecord>>,
}

impl InMemoryCertificateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CertificateRegistry for InMemoryCertificateRegistry {
    async fn insert(&self, record: CertificateRecord) -> Result<CertificateRecord, RecordError> {
        let mut records = self.records.write().map_err(poisoned)?;
        if records.contains_key(&record.id) {
            return Err(RecordError::Duplicate(record.id.into_inner()));
        }
        records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find(&self, id: CertificateId) -> Result<Option<CertificateRecord>, RecordError> {
        Ok(self.records.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<CertificateRecord>, RecordError> {
        let records = self.records.read().map_err(poisoned)?;
        Ok(records.values().rev().cloned().collect())
    }

    async fn change_tier(
        &self,
        id: CertificateId,
        change: &TierChange,
    ) -> Result<CertificateRecord, RecordError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let record = records
            .get_mut(&id)
            .ok_or(RecordError::NotFound(id.into_inner()))?;

        if record.total != change.prior_total {
            return Err(RecordError::Stale(id.into_inner()));
        }

        record.tier = change.tier;
        record.base_value = change.tariff.base_value;
        record.commission = change.tariff.commission;
        record.total = change.tariff.total();
        if let Some(details) = &change.details {
            record.details = details.clone();
        }
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    async fn update_details(
        &self,
        id: CertificateId,
        details: &CertificateDetails,
    ) -> Result<CertificateRecord, RecordError> {
        let mut records = self.records.write().map_err(poisoned)?;
        let record = records
            .get_mut(&id)
            .ok_or(RecordError::NotFound(id.into_inner()))?;

        record.details = details.clone();
        record.updated_at = Utc::now();
        Ok(record.clone())
    }
}
