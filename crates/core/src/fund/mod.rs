//! The bolsa fund: ledger operations plus the recharge and certificate
//! workflows built on them.

pub mod error;
pub mod memory;
pub mod records;
pub mod service;


pub use error::{FundError, RecordError};
pub use memory::{InMemoryCertificateRegistry, InMemoryRechargeRegistry};
pub use records::{
    CertificateDetails, CertificateRecord, CertificateRegistry, DetailsUpdate, RechargeRecord,
    RechargeRegistry, TierChange,
};
pub use service::{
    AuditReport, CertificateUpdate, CorrectedCertificate, FundService, IssuanceReceipt,
    IssuedCertificate, NewRecharge, RechargeReceipt,
};
