//! Initial database migration.
//!
//! Creates the loan-origination tables, checks and triggers.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: BORROWERS
        // ============================================================
        db.execute_unprepared(CLIENTS_SQL).await?;

        // ============================================================
        // PART 2: LOAN TYPE CATALOG
        // ============================================================
        db.execute_unprepared(LOAN_TYPES_SQL).await?;
        db.execute_unprepared(LOAN_TYPE_APPROVERS_SQL).await?;
        db.execute_unprepared(FEE_ATTRIBUTES_SQL).await?;

        // ============================================================
        // PART 3: LOANS
        // ============================================================
        db.execute_unprepared(LOANS_SQL).await?;
        db.execute_unprepared(LOAN_FEES_SQL).await?;

        // ============================================================
        // PART 4: APPROVAL WORKFLOW
        // ============================================================
        db.execute_unprepared(APPROVAL_REQUESTS_SQL).await?;
        db.execute_unprepared(APPROVAL_STEPS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
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

const CLIENTS_SQL: &str = r"
CREATE TABLE clients (
    id UUID PRIMARY KEY,
    full_name VARCHAR(255) NOT NULL,
    id_number VARCHAR(50) NOT NULL UNIQUE,
    phone_number VARCHAR(50),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const LOAN_TYPES_SQL: &str = r"
CREATE TABLE loan_types (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    description TEXT,
    classification VARCHAR(20) NOT NULL
        CHECK (classification IN ('CASH', 'PRODUCT')),
    min_amount NUMERIC(19, 4) CHECK (min_amount > 0),
    max_amount NUMERIC(19, 4) CHECK (max_amount > 0),
    max_term_value INTEGER CHECK (max_term_value > 0),
    max_term_unit VARCHAR(10)
        CHECK (max_term_unit IN ('DAYS', 'WEEKS', 'MONTHS', 'YEARS')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_loan_type_amounts CHECK (
        min_amount IS NULL OR max_amount IS NULL OR min_amount <= max_amount
    ),
    CONSTRAINT chk_loan_type_term CHECK (
        (max_term_value IS NULL) = (max_term_unit IS NULL)
    )
);
";

const LOAN_TYPE_APPROVERS_SQL: &str = r"
CREATE TABLE loan_type_approvers (
    loan_type_id UUID NOT NULL REFERENCES loan_types(id) ON DELETE CASCADE,
    position INTEGER NOT NULL CHECK (position > 0),
    approver_id UUID NOT NULL,
    PRIMARY KEY (loan_type_id, position)
);
";

const FEE_ATTRIBUTES_SQL: &str = r"
CREATE TABLE fee_attributes (
    id UUID PRIMARY KEY,
    loan_type_id UUID NOT NULL REFERENCES loan_types(id) ON DELETE CASCADE,
    position INTEGER NOT NULL CHECK (position > 0),
    name VARCHAR(255) NOT NULL,
    value NUMERIC(19, 4) NOT NULL CHECK (value >= 0),
    is_percentage BOOLEAN NOT NULL DEFAULT FALSE,
    charge_type VARCHAR(20) NOT NULL
        CHECK (charge_type IN ('ONE_TIME', 'RECURRING_MONTHLY')),
    one_time_timing VARCHAR(20)
        CHECK (one_time_timing IN ('IMMEDIATE', 'AFTER_PERIOD')),
    one_time_period_value INTEGER,
    one_time_period_unit VARCHAR(10)
        CHECK (one_time_period_unit IN ('DAYS', 'WEEKS', 'MONTHS')),

    CONSTRAINT uq_fee_attribute_position UNIQUE (loan_type_id, position)
);
";

const LOANS_SQL: &str = r"
CREATE TABLE loans (
    id UUID PRIMARY KEY,
    loan_type_id UUID NOT NULL REFERENCES loan_types(id) ON DELETE RESTRICT,
    client_id UUID NOT NULL REFERENCES clients(id) ON DELETE RESTRICT,
    principal NUMERIC(19, 4) NOT NULL CHECK (principal > 0),
    interest_rate NUMERIC(9, 4),
    term_value INTEGER NOT NULL CHECK (term_value > 0),
    term_unit VARCHAR(10) NOT NULL
        CHECK (term_unit IN ('DAYS', 'WEEKS', 'MONTHS', 'YEARS')),
    repayment_frequency VARCHAR(10)
        CHECK (repayment_frequency IN ('DAILY', 'WEEKLY', 'MONTHLY')),
    purpose TEXT,
    creation_date DATE NOT NULL,
    start_date DATE,
    end_date DATE,
    repayment_account_id UUID,
    selected_product_id UUID,
    total_payable NUMERIC(19, 4) NOT NULL,

    -- Disbursement record, all set together
    posting_id UUID UNIQUE,
    paying_account_id UUID,
    receivable_account_id UUID,
    disbursed_amount NUMERIC(19, 4),
    disbursed_at TIMESTAMPTZ,

    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_loan_dates CHECK (
        start_date IS NULL OR end_date IS NULL OR start_date <= end_date
    ),
    CONSTRAINT chk_loan_disbursement CHECK (
        (posting_id IS NULL AND paying_account_id IS NULL AND receivable_account_id IS NULL
            AND disbursed_amount IS NULL AND disbursed_at IS NULL)
        OR
        (posting_id IS NOT NULL AND paying_account_id IS NOT NULL AND receivable_account_id IS NOT NULL
            AND disbursed_amount IS NOT NULL AND disbursed_at IS NOT NULL)
    )
);

CREATE INDEX idx_loans_created ON loans(created_at DESC, id DESC);
CREATE INDEX idx_loans_loan_type ON loans(loan_type_id);
";

const LOAN_FEES_SQL: &str = r"
CREATE TABLE loan_fees (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL REFERENCES loans(id) ON DELETE CASCADE,
    position INTEGER NOT NULL CHECK (position > 0),
    name VARCHAR(255) NOT NULL,
    amount NUMERIC(19, 4) NOT NULL,
    is_percentage BOOLEAN NOT NULL,
    original_value NUMERIC(19, 4) NOT NULL,
    charge_type VARCHAR(20) NOT NULL
        CHECK (charge_type IN ('ONE_TIME', 'RECURRING_MONTHLY')),

    CONSTRAINT uq_loan_fee_position UNIQUE (loan_id, position)
);
";

const APPROVAL_REQUESTS_SQL: &str = r"
CREATE TABLE approval_requests (
    id UUID PRIMARY KEY,
    loan_id UUID NOT NULL UNIQUE REFERENCES loans(id) ON DELETE CASCADE,
    title VARCHAR(255) NOT NULL,
    description TEXT NOT NULL,
    requested_by UUID NOT NULL,
    status VARCHAR(20) NOT NULL
        CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED', 'DISBURSED')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_approval_requests_status ON approval_requests(status);
";

const APPROVAL_STEPS_SQL: &str = r"
CREATE TABLE approval_steps (
    id UUID PRIMARY KEY,
    request_id UUID NOT NULL REFERENCES approval_requests(id) ON DELETE CASCADE,
    approver_id UUID NOT NULL,
    step_order INTEGER NOT NULL CHECK (step_order > 0),
    status VARCHAR(20) NOT NULL
        CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED')),
    action_date TIMESTAMPTZ,
    remarks TEXT,

    CONSTRAINT uq_approval_step_order UNIQUE (request_id, step_order),
    CONSTRAINT chk_step_action CHECK ((status = 'PENDING') = (action_date IS NULL))
);

CREATE INDEX idx_approval_steps_pending ON approval_steps(approver_id)
    WHERE status = 'PENDING';
";

const TRIGGERS_SQL: &str = r"
-- ============================================================
-- FUNCTION: prevent_disbursed_modification
-- A disbursed loan is frozen; its posting can only be undone in the ledger
-- ============================================================
CREATE OR REPLACE FUNCTION prevent_disbursed_modification()
RETURNS TRIGGER AS $$
BEGIN
    IF OLD.posting_id IS NOT NULL THEN
        RAISE EXCEPTION 'Cannot modify or delete disbursed loan %', OLD.id;
    END IF;

    IF TG_OP = 'DELETE' THEN
        RETURN OLD;
    END IF;
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_prevent_disbursed_mod
BEFORE UPDATE OR DELETE ON loans
FOR EACH ROW
EXECUTE FUNCTION prevent_disbursed_modification();
";

const DROP_ALL_SQL: &str = r"
DROP TRIGGER IF EXISTS trg_prevent_disbursed_mod ON loans;
DROP FUNCTION IF EXISTS prevent_disbursed_modification();

DROP TABLE IF EXISTS approval_steps CASCADE;
DROP TABLE IF EXISTS approval_requests CASCADE;
DROP TABLE IF EXISTS loan_fees CASCADE;
DROP TABLE IF EXISTS loans CASCADE;
DROP TABLE IF EXISTS fee_attributes CASCADE;
DROP TABLE IF EXISTS loan_type_approvers CASCADE;
DROP TABLE IF EXISTS loan_types CASCADE;
DROP TABLE IF EXISTS clients CASCADE;
";
