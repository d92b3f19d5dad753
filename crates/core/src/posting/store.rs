//! Storage seams for the posting engine.
//!
//! These traits are implemented by the db crate. A [`PostingTransaction`]
//! must make all of its writes visible atomically on [`commit`] and discard
//! them on [`rollback`] or drop.
//!
//! [`commit`]: PostingTransaction::commit
//! [`rollback`]: PostingTransaction::rollback

use chrono::{DateTime, NaiveDate, Utc};
use oasis_shared::types::{AccountId, CurrencyId, PostingHeaderId, StatementId};

use super::error::PostingError;
use super::types::{Currency, PostingDetail, PostingRow, ValidatedPosting};
use crate::account::Account;

/// Read access and transaction factory for postings.
pub trait PostingStore: Send + Sync {
    /// Serializable read-write transaction type.
    type Transaction: PostingTransaction;

    /// Loads the currencies matching any of the given codes or ids.
    fn find_currencies(
        &self,
        codes: &[String],
        currency_ids: &[CurrencyId],
    ) -> impl std::future::Future<Output = Result<Vec<Currency>, PostingError>> + Send;

    /// Loads the accounts with the given ids.
    fn find_accounts(
        &self,
        account_ids: &[AccountId],
    ) -> impl std::future::Future<Output = Result<Vec<Account>, PostingError>> + Send;

    /// Starts a serializable read-write transaction.
    fn begin_serializable(
        &self,
    ) -> impl std::future::Future<Output = Result<Self::Transaction, PostingError>> + Send;

    /// Returns the joined posting rows with `start <= posting_date < end`,
    /// ordered by posting date and header id descending, then detail id.
    ///
    /// `end` of `None` leaves the range open.
    fn find_posting_rows(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> impl std::future::Future<Output = Result<Vec<PostingRow>, PostingError>> + Send;
}

/// Writes of one posting commit.
pub trait PostingTransaction: Send {
    /// Counts reconciled balances of the given accounts dated on or after
    /// `posting_date`.
    fn count_reconciled_balances(
        &mut self,
        account_ids: &[AccountId],
        posting_date: NaiveDate,
    ) -> impl std::future::Future<Output = Result<u64, PostingError>> + Send;

    /// Allocates the next id from the shared sequence.
    ///
    /// Ids must never be reissued, even if this transaction rolls back.
    fn next_id(&mut self) -> impl std::future::Future<Output = Result<i64, PostingError>> + Send;

    /// Writes the header row and returns its audit timestamp.
    fn insert_header(
        &mut self,
        posting_header_id: PostingHeaderId,
        posting: &ValidatedPosting,
    ) -> impl std::future::Future<Output = Result<DateTime<Utc>, PostingError>> + Send;

    /// Writes one detail row.
    fn insert_detail(
        &mut self,
        detail: &PostingDetail,
    ) -> impl std::future::Future<Output = Result<(), PostingError>> + Send;

    /// Flags a statement line as posted. Returns false if no line matches
    /// all three keys.
    fn mark_statement_posted(
        &mut self,
        statement_id: StatementId,
        account_id: AccountId,
        currency_id: CurrencyId,
    ) -> impl std::future::Future<Output = Result<bool, PostingError>> + Send;

    /// Adds `raw_amount` to the balance bucket of the account, currency and
    /// date, creating the bucket if needed.
    fn add_to_account_balance(
        &mut self,
        posting_date: NaiveDate,
        account_id: AccountId,
        currency_id: CurrencyId,
        raw_amount: i64,
    ) -> impl std::future::Future<Output = Result<(), PostingError>> + Send;

    /// Commits the transaction.
    fn commit(self) -> impl std::future::Future<Output = Result<(), PostingError>> + Send;

    /// Rolls the transaction back.
    fn rollback(self) -> impl std::future::Future<Output = Result<(), PostingError>> + Send;
}
