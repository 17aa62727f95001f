//! Initial database migration.
//!
//! Creates the bolsa singleton, the append-only ledger, and the recharge and
//! certificate registries.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: BALANCE & LEDGER
        // ============================================================
        db.execute_unprepared(BOLSA_SQL).await?;
        db.execute_unprepared(LEDGER_ENTRIES_SQL).await?;

        // ============================================================
        // PART 3: REGISTRIES
        // ============================================================
        db.execute_unprepared(RECHARGES_SQL).await?;
        db.execute_unprepared(CERTIFICATES_SQL).await?;

        // ============================================================
        // PART 4: TRIGGERS & FUNCTIONS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Ledger entry kind
CREATE TYPE entry_kind AS ENUM ('credit', 'debit', 'adjustment');

-- What caused a ledger entry
CREATE TYPE reference_kind AS ENUM ('recharge', 'issuance', 'correction');

-- Motorcycle displacement tier
CREATE TYPE vehicle_tier AS ENUM ('low_displacement', 'mid_displacement');
";

const BOLSA_SQL: &str = r"
CREATE TABLE bolsa (
    id SMALLINT PRIMARY KEY DEFAULT 1,
    current_amount BIGINT NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_bolsa_singleton CHECK (id = 1),
    CONSTRAINT chk_bolsa_non_negative CHECK (current_amount >= 0),
    CONSTRAINT chk_bolsa_version CHECK (version >= 0)
);

INSERT INTO bolsa (id) VALUES (1) ON CONFLICT (id) DO NOTHING;
";

const LEDGER_ENTRIES_SQL: &str = r"
CREATE TABLE ledger_entries (
    id UUID PRIMARY KEY,
    kind entry_kind NOT NULL,
    amount BIGINT NOT NULL,
    reference_kind reference_kind NOT NULL,
    reference_id UUID NOT NULL,
    resulting_balance BIGINT NOT NULL,
    version BIGINT NOT NULL,
    actor_id VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_ledger_entries_version UNIQUE (version),
    CONSTRAINT chk_le_version_positive CHECK (version > 0),
    CONSTRAINT chk_le_resulting_non_negative CHECK (resulting_balance >= 0),
    CONSTRAINT chk_le_actor_not_blank CHECK (btrim(actor_id) <> ''),
    CONSTRAINT chk_le_amount_sign CHECK (
        (kind = 'credit' AND amount > 0)
        OR (kind = 'debit' AND amount < 0)
        OR (kind = 'adjustment' AND amount <> 0)
    )
);

-- A recharge or issuance is accounted once per entry kind; corrections repeat
CREATE UNIQUE INDEX uq_ledger_entries_reference
    ON ledger_entries(kind, reference_kind, reference_id)
    WHERE reference_kind <> 'correction';

CREATE INDEX idx_le_reference ON ledger_entries(reference_kind, reference_id);
CREATE INDEX idx_le_created_at ON ledger_entries(created_at);
";

const RECHARGES_SQL: &str = r"
CREATE TABLE recharges (
    id UUID PRIMARY KEY,
    amount BIGINT NOT NULL,
    external_reference VARCHAR(100),
    notes TEXT,
    registered_by VARCHAR(255) NOT NULL,
    registered_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_recharges_amount_positive CHECK (amount > 0)
);

CREATE INDEX idx_recharges_registered_at ON recharges(registered_at DESC);
";

const CERTIFICATES_SQL: &str = r"
CREATE TABLE certificates (
    id UUID PRIMARY KEY,
    plate VARCHAR(20) NOT NULL,
    owner_document VARCHAR(30),
    owner_name VARCHAR(200),
    notes TEXT,
    tier vehicle_tier NOT NULL,
    base_value BIGINT NOT NULL,
    commission BIGINT NOT NULL,
    total BIGINT NOT NULL,
    issued_by VARCHAR(255) NOT NULL,
    issued_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_certificates_base_positive CHECK (base_value > 0),
    CONSTRAINT chk_certificates_commission CHECK (commission >= 0),
    CONSTRAINT chk_certificates_total CHECK (total = base_value + commission)
);

CREATE INDEX idx_certificates_plate ON certificates(plate);
CREATE INDEX idx_certificates_issued_at ON certificates(issued_at DESC);
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_ledger_entry_mutation
-- Ledger entries are immutable facts; fix mistakes with new entries
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_ledger_entry_mutation()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'Ledger entries are append-only. Append a correcting entry instead.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_ledger_entry_mutation
BEFORE UPDATE OR DELETE ON ledger_entries
FOR EACH ROW
EXECUTE FUNCTION prevent_ledger_entry_mutation();

-- ============================================================
-- FUNCTION: prevent_bolsa_delete
-- The singleton row is created once and only ever updated
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_bolsa_delete()
RETURNS TRIGGER AS $$
BEGIN
    RAISE EXCEPTION 'The bolsa row cannot be deleted.';
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_bolsa_delete
BEFORE DELETE ON bolsa
FOR EACH ROW
EXECUTE FUNCTION prevent_bolsa_delete();
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- ============================================================

DROP TRIGGER IF EXISTS trg_prevent_bolsa_delete ON bolsa;
DROP TRIGGER IF EXISTS trg_prevent_ledger_entry_mutation ON ledger_entries;
DROP FUNCTION IF EXISTS prevent_bolsa_delete();
DROP FUNCTION IF EXISTS prevent_ledger_entry_mutation();

DROP TABLE IF EXISTS certificates CASCADE;
DROP TABLE IF EXISTS recharges CASCADE;
DROP TABLE IF EXISTS ledger_entries CASCADE;
DROP TABLE IF EXISTS bolsa CASCADE;

DROP TYPE IF EXISTS vehicle_tier;
DROP TYPE IF EXISTS reference_kind;
DROP TYPE IF EXISTS entry_kind;
";
