//! In-memory posting store for tests.
//!
//! A transaction works on a private copy of the ledger and publishes it on
//! commit, so rolled back writes are never visible. A commit whose copy was
//! taken before another transaction committed fails with a serialization
//! conflict. The id sequence lives outside the copy and keeps advancing
//! across aborts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use oasis_shared::types::{AccountId, CurrencyId, PostingHeaderId, StatementId, UserId};
use rust_decimal::Decimal;

use super::error::PostingError;
use super::store::{PostingStore, PostingTransaction};
use super::types::{Currency, PostingDetail, PostingRow, Statement, ValidatedPosting};
use crate::account::{Account, ActiveFlag};

#[derive(Debug, Clone)]
struct HeaderRecord {
    posting_header_id: PostingHeaderId,
    posting_date: NaiveDate,
    description: String,
    audit_user_id: Option<UserId>,
    audit_ts: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
struct BalanceBucket {
    raw_amount: i64,
    reconciled: bool,
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    currencies: Vec<Currency>,
    accounts: HashMap<AccountId, Account>,
    statements: HashMap<StatementId, Statement>,
    balances: HashMap<(AccountId, CurrencyId, NaiveDate), BalanceBucket>,
    headers: Vec<HeaderRecord>,
    details: Vec<PostingDetail>,
    version: u64,
}

/// Shared in-memory ledger.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Arc<Mutex<Ledger>>,
    sequence: Arc<AtomicI64>,
    conflict_next_commit: Arc<AtomicBool>,
    transactions_started: AtomicUsize,
}

impl MemoryStore {
    /// Store with USD (scale 2), JPY (scale 0) and EUR (scale 2), active
    /// accounts 100, 200 and 300, inactive account 400, and statement 777
    /// for account 100 in USD.
    pub fn seeded() -> Self {
        let store = Self::default();
        {
            let mut ledger = store.ledger.lock().unwrap();
            ledger.currencies = vec![
                Currency {
                    currency_id: CurrencyId::new(1),
                    currency_code: "USD".into(),
                    scale: 2,
                },
                Currency {
                    currency_id: CurrencyId::new(2),
                    currency_code: "JPY".into(),
                    scale: 0,
                },
                Currency {
                    currency_id: CurrencyId::new(3),
                    currency_code: "EUR".into(),
                    scale: 2,
                },
            ];
            for (id, code, name) in [
                (100, "1000", "Cash"),
                (200, "1010", "Checking"),
                (300, "4000", "Revenue"),
                (400, "1090", "Closed savings"),
            ] {
                let account = Account::new(AccountId::new(id), 1, code, name).unwrap();
                let account = if id == 400 {
                    account.with_active_flag(ActiveFlag::N)
                } else {
                    account
                };
                ledger.accounts.insert(account.account_id, account);
            }
            ledger.statements.insert(
                StatementId::new(777),
                Statement {
                    statement_id: StatementId::new(777),
                    statement_date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                    account_id: AccountId::new(100),
                    currency_id: CurrencyId::new(1),
                    amount: Decimal::new(-5000, 2),
                    description: "ATM withdrawal".into(),
                    posted: false,
                },
            );
        }
        store
    }

    /// Marks the balance bucket of an account, currency and date reconciled.
    pub fn reconcile(&self, account_id: AccountId, currency_id: CurrencyId, date: NaiveDate) {
        self.ledger
            .lock()
            .unwrap()
            .balances
            .entry((account_id, currency_id, date))
            .or_default()
            .reconciled = true;
    }

    /// Makes the next commit fail as if it lost a serialization race.
    pub fn fail_next_commit_with_conflict(&self) {
        self.conflict_next_commit.store(true, Ordering::SeqCst);
    }

    /// Committed balance of an account in a currency over all dates.
    pub fn balance(&self, account_id: AccountId, currency_id: CurrencyId) -> i64 {
        self.ledger
            .lock()
            .unwrap()
            .balances
            .iter()
            .filter(|((account, currency, _), _)| *account == account_id && *currency == currency_id)
            .map(|(_, bucket)| bucket.raw_amount)
            .sum()
    }

    /// Committed statement line.
    pub fn statement(&self, statement_id: StatementId) -> Option<Statement> {
        self.ledger
            .lock()
            .unwrap()
            .statements
            .get(&statement_id)
            .cloned()
    }

    /// Number of committed headers.
    pub fn header_count(&self) -> usize {
        self.ledger.lock().unwrap().headers.len()
    }

    /// Number of committed details.
    pub fn detail_count(&self) -> usize {
        self.ledger.lock().unwrap().details.len()
    }

    /// Last id handed out by the sequence, 0 if none.
    pub fn last_id(&self) -> i64 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Number of write transactions opened.
    pub fn transactions_started(&self) -> usize {
        self.transactions_started.load(Ordering::SeqCst)
    }
}

impl PostingStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn find_currencies(
        &self,
        codes: &[String],
        currency_ids: &[CurrencyId],
    ) -> Result<Vec<Currency>, PostingError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(ledger
            .currencies
            .iter()
            .filter(|c| codes.contains(&c.currency_code) || currency_ids.contains(&c.currency_id))
            .cloned()
            .collect())
    }

    async fn find_accounts(&self, account_ids: &[AccountId]) -> Result<Vec<Account>, PostingError> {
        let ledger = self.ledger.lock().unwrap();
        Ok(account_ids
            .iter()
            .filter_map(|id| ledger.accounts.get(id).cloned())
            .collect())
    }

    async fn begin_serializable(&self) -> Result<MemoryTransaction, PostingError> {
        self.transactions_started.fetch_add(1, Ordering::SeqCst);
        let working = self.ledger.lock().unwrap().clone();
        Ok(MemoryTransaction {
            shared: Arc::clone(&self.ledger),
            sequence: Arc::clone(&self.sequence),
            conflict: Arc::clone(&self.conflict_next_commit),
            base_version: working.version,
            working,
        })
    }

    async fn find_posting_rows(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PostingRow>, PostingError> {
        let ledger = self.ledger.lock().unwrap();
        let mut rows = Vec::new();

        for header in ledger
            .headers
            .iter()
            .filter(|h| h.posting_date >= start && end.is_none_or(|end| h.posting_date < end))
        {
            for detail in ledger
                .details
                .iter()
                .filter(|d| d.posting_header_id == header.posting_header_id)
            {
                let currency = ledger
                    .currencies
                    .iter()
                    .find(|c| c.currency_id == detail.currency_id)
                    .unwrap();
                rows.push(PostingRow {
                    posting_header_id: header.posting_header_id,
                    posting_date: header.posting_date,
                    description: header.description.clone(),
                    audit_user_id: header.audit_user_id,
                    audit_ts: header.audit_ts,
                    posting_detail_id: detail.posting_detail_id,
                    account_id: detail.account_id,
                    currency_id: detail.currency_id,
                    currency_code: currency.currency_code.clone(),
                    scale: currency.scale,
                    raw_amount: detail.raw_amount,
                    statement_id: detail.statement_id,
                    statement: detail
                        .statement_id
                        .and_then(|id| ledger.statements.get(&id).cloned()),
                });
            }
        }

        rows.sort_by(|a, b| {
            b.posting_date
                .cmp(&a.posting_date)
                .then(b.posting_header_id.cmp(&a.posting_header_id))
                .then(a.posting_detail_id.cmp(&b.posting_detail_id))
        });
        Ok(rows)
    }
}

/// Transaction over a private copy of the ledger.
#[derive(Debug)]
pub struct MemoryTransaction {
    shared: Arc<Mutex<Ledger>>,
    sequence: Arc<AtomicI64>,
    conflict: Arc<AtomicBool>,
    base_version: u64,
    working: Ledger,
}

impl PostingTransaction for MemoryTransaction {
    async fn count_reconciled_balances(
        &mut self,
        account_ids: &[AccountId],
        posting_date: NaiveDate,
    ) -> Result<u64, PostingError> {
        let count = self
            .working
            .balances
            .iter()
            .filter(|((account, _, date), bucket)| {
                bucket.reconciled && account_ids.contains(account) && *date >= posting_date
            })
            .count();
        Ok(count as u64)
    }

    async fn next_id(&mut self) -> Result<i64, PostingError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn insert_header(
        &mut self,
        posting_header_id: PostingHeaderId,
        posting: &ValidatedPosting,
    ) -> Result<DateTime<Utc>, PostingError> {
        let audit_ts = Utc::now();
        self.working.headers.push(HeaderRecord {
            posting_header_id,
            posting_date: posting.posting_date,
            description: posting.description.clone(),
            audit_user_id: posting.audit_user_id,
            audit_ts,
        });
        Ok(audit_ts)
    }

    async fn insert_detail(&mut self, detail: &PostingDetail) -> Result<(), PostingError> {
        self.working.details.push(detail.clone());
        Ok(())
    }

    async fn mark_statement_posted(
        &mut self,
        statement_id: StatementId,
        account_id: AccountId,
        currency_id: CurrencyId,
    ) -> Result<bool, PostingError> {
        match self.working.statements.get_mut(&statement_id) {
            Some(statement)
                if statement.account_id == account_id && statement.currency_id == currency_id =>
            {
                statement.posted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn add_to_account_balance(
        &mut self,
        posting_date: NaiveDate,
        account_id: AccountId,
        currency_id: CurrencyId,
        raw_amount: i64,
    ) -> Result<(), PostingError> {
        let bucket = self
            .working
            .balances
            .entry((account_id, currency_id, posting_date))
            .or_default();
        bucket.raw_amount = bucket
            .raw_amount
            .checked_add(raw_amount)
            .ok_or_else(|| PostingError::Database("balance overflow".into()))?;
        Ok(())
    }

    async fn commit(mut self) -> Result<(), PostingError> {
        if self.conflict.swap(false, Ordering::SeqCst) {
            return Err(PostingError::TransactionConflict);
        }
        let mut shared = self.shared.lock().unwrap();
        if shared.version != self.base_version {
            return Err(PostingError::TransactionConflict);
        }
        self.working.version = self.base_version + 1;
        *shared = self.working;
        Ok(())
    }

    async fn rollback(self) -> Result<(), PostingError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overlapping_commit_conflicts() {
        let store = MemoryStore::seeded();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let account = AccountId::new(100);
        let usd = CurrencyId::new(1);

        let mut first = store.begin_serializable().await.unwrap();
        let mut second = store.begin_serializable().await.unwrap();
        first
            .add_to_account_balance(today, account, usd, 500)
            .await
            .unwrap();
        second
            .add_to_account_balance(today, account, usd, 700)
            .await
            .unwrap();

        assert_eq!(first.commit().await, Ok(()));
        assert_eq!(second.commit().await, Err(PostingError::TransactionConflict));
        assert_eq!(store.balance(account, usd), 500);
    }

    #[tokio::test]
    async fn test_sequential_commits_both_apply() {
        let store = MemoryStore::seeded();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let account = AccountId::new(100);
        let usd = CurrencyId::new(1);

        for raw in [500, 700] {
            let mut txn = store.begin_serializable().await.unwrap();
            txn.add_to_account_balance(today, account, usd, raw)
                .await
                .unwrap();
            txn.commit().await.unwrap();
        }

        assert_eq!(store.balance(account, usd), 1200);
    }
}
