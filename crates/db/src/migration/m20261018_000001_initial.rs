//! Initial ledger schema.
//!
//! Creates the reference tables, the posting tables, the per-day account
//! balances and the shared posting id sequence.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(REFERENCE_SQL).await?;
        db.execute_unprepared(POSTING_SQL).await?;
        db.execute_unprepared(BALANCE_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const REFERENCE_SQL: &str = r"
CREATE TABLE currencies (
    currency_id BIGINT PRIMARY KEY,
    currency_code VARCHAR(8) NOT NULL UNIQUE,
    scale INTEGER NOT NULL,
    CONSTRAINT chk_currency_scale CHECK (scale BETWEEN 0 AND 28)
);

CREATE TABLE accounts (
    account_id BIGINT PRIMARY KEY,
    account_type_id BIGINT NOT NULL,
    parent_account_id BIGINT REFERENCES accounts(account_id),
    account_code VARCHAR(64) NOT NULL,
    account_name VARCHAR(255) NOT NULL,
    active_flag CHAR(1) NOT NULL DEFAULT 'Y',
    CONSTRAINT chk_account_code CHECK (length(trim(account_code)) > 0),
    CONSTRAINT chk_account_name CHECK (length(trim(account_name)) > 0),
    CONSTRAINT chk_account_active_flag CHECK (active_flag IN ('Y', 'N'))
);

CREATE INDEX idx_accounts_parent ON accounts(parent_account_id);

CREATE TABLE statements (
    statement_id BIGINT PRIMARY KEY,
    statement_date DATE NOT NULL,
    account_id BIGINT NOT NULL REFERENCES accounts(account_id),
    currency_id BIGINT NOT NULL REFERENCES currencies(currency_id),
    raw_amount BIGINT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    posted BOOLEAN NOT NULL DEFAULT false
);

CREATE INDEX idx_statements_account ON statements(account_id, statement_date);
";

const POSTING_SQL: &str = r"
-- Shared by headers and details; nextval is never rolled back
CREATE SEQUENCE posting_id_seq START WITH 1 INCREMENT BY 1;

CREATE TABLE posting_headers (
    posting_header_id BIGINT PRIMARY KEY,
    posting_date DATE NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    audit_user_id BIGINT,
    audit_ts TIMESTAMPTZ NOT NULL DEFAULT now()
);

-- Range queries by date, newest first
CREATE INDEX idx_posting_headers_date ON posting_headers(posting_date DESC, posting_header_id DESC);

CREATE TABLE posting_details (
    posting_detail_id BIGINT PRIMARY KEY,
    posting_header_id BIGINT NOT NULL REFERENCES posting_headers(posting_header_id),
    account_id BIGINT NOT NULL REFERENCES accounts(account_id),
    currency_id BIGINT NOT NULL REFERENCES currencies(currency_id),
    raw_amount BIGINT NOT NULL,
    statement_id BIGINT REFERENCES statements(statement_id),
    CONSTRAINT uq_posting_details_account UNIQUE (posting_header_id, account_id)
);

CREATE INDEX idx_posting_details_header ON posting_details(posting_header_id, posting_detail_id);
";

const BALANCE_SQL: &str = r"
CREATE TABLE account_balances (
    account_id BIGINT NOT NULL REFERENCES accounts(account_id),
    currency_id BIGINT NOT NULL REFERENCES currencies(currency_id),
    posting_date DATE NOT NULL,
    raw_amount BIGINT NOT NULL DEFAULT 0,
    reconciled CHAR(1) NOT NULL DEFAULT 'N',
    PRIMARY KEY (account_id, currency_id, posting_date),
    CONSTRAINT chk_balance_reconciled CHECK (reconciled IN ('Y', 'N'))
);

-- Closed-period guard
CREATE INDEX idx_account_balances_reconciled ON account_balances(account_id, posting_date)
    WHERE reconciled = 'Y';
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS account_balances CASCADE;
DROP TABLE IF EXISTS posting_details CASCADE;
DROP TABLE IF EXISTS posting_headers CASCADE;
DROP SEQUENCE IF EXISTS posting_id_seq;
DROP TABLE IF EXISTS statements CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS currencies CASCADE;
";
