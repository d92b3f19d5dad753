//! Posting commit and query orchestration.
//!
//! A commit runs in two phases. Validation is pure and happens before any
//! transaction is opened. The write phase runs inside one serializable
//! transaction: closed-period guard, header and detail inserts, statement
//! links, then balance updates. Any failure rolls the whole transaction back.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Days, Local, Months, NaiveDate};
use oasis_shared::types::{CurrencyId, PostingDetailId, PostingHeaderId};
use tracing::{debug, error, info, warn};

use super::currency::CurrencyCatalog;
use super::error::{PostingError, PostingErrorKind};
use super::reducer::{PostingReducer, reduce_rows};
use super::store::{PostingStore, PostingTransaction};
use super::types::{NewPosting, PostingDetail, PostingHeader, PostingRow, ValidatedPosting};
use super::validation::{check_accounts, ensure_details, validate_posting};

/// Lazy sequence of posting headers produced by a query.
pub type Postings = PostingReducer<std::vec::IntoIter<PostingRow>>;

/// Commits postings and answers posting range queries.
pub struct PostingService<S> {
    store: Arc<S>,
}

impl<S> Clone for PostingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: PostingStore> PostingService<S> {
    /// Creates a service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Commits a posting dated relative to the local current date.
    ///
    /// Returns the committed header with the ids assigned by the sequence.
    pub async fn commit_posting(&self, posting: NewPosting) -> Result<PostingHeader, PostingError> {
        self.commit_posting_on(posting, Local::now().date_naive())
            .await
    }

    /// Commits a posting, checking its date range against `today`.
    pub async fn commit_posting_on(
        &self,
        posting: NewPosting,
        today: NaiveDate,
    ) -> Result<PostingHeader, PostingError> {
        let result = self.try_commit(posting, today).await;

        match &result {
            Ok(header) => info!(
                posting_header_id = %header.posting_header_id,
                posting_date = %header.posting_date,
                details = header.details.len(),
                "Posting committed"
            ),
            Err(err) if err.kind() == PostingErrorKind::Storage => {
                error!(error = %err, "Posting commit failed");
            }
            Err(err) => warn!(
                error_code = err.error_code(),
                error = %err,
                "Posting rejected"
            ),
        }

        result
    }

    /// Returns the postings dated within the last `days` days, newest first.
    pub async fn find_recent_postings(&self, days: u32) -> Result<Postings, PostingError> {
        self.find_recent_postings_on(days, Local::now().date_naive())
            .await
    }

    /// Returns the postings dated on or after `today - days`, newest first.
    pub async fn find_recent_postings_on(
        &self,
        days: u32,
        today: NaiveDate,
    ) -> Result<Postings, PostingError> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or(PostingError::InvalidWindow(days))?;

        debug!(%start, days, "Finding recent postings");
        self.find_between(start, None).await
    }

    /// Returns the postings dated in the given calendar month, newest first.
    pub async fn find_postings_for_month(
        &self,
        month: u32,
        year: i32,
    ) -> Result<Postings, PostingError> {
        let invalid = || PostingError::InvalidMonth { year, month };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or_else(invalid)?;

        debug!(%start, %end, "Finding postings for month");
        self.find_between(start, Some(end)).await
    }

    async fn find_between(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Postings, PostingError> {
        let rows = self.store.find_posting_rows(start, end).await?;
        Ok(reduce_rows(rows))
    }

    async fn try_commit(
        &self,
        posting: NewPosting,
        today: NaiveDate,
    ) -> Result<PostingHeader, PostingError> {
        ensure_details(&posting.details)?;

        let catalog = self.load_currencies(&posting).await?;
        let posting = validate_posting(posting, today, &catalog)?;

        let accounts = self
            .store
            .find_accounts(&posting.account_ids())
            .await?
            .into_iter()
            .map(|account| (account.account_id, account))
            .collect::<HashMap<_, _>>();
        check_accounts(&posting, &accounts)?;

        let mut txn = self.store.begin_serializable().await?;
        match write_posting(&mut txn, &posting).await {
            Ok(header) => {
                txn.commit().await?;
                Ok(header)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!(error = %rollback_err, "Failed to roll back posting transaction");
                }
                Err(err)
            }
        }
    }

    async fn load_currencies(&self, posting: &NewPosting) -> Result<CurrencyCatalog, PostingError> {
        let codes: Vec<String> = posting
            .details
            .iter()
            .filter_map(|detail| detail.currency.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let currency_ids: Vec<CurrencyId> = posting
            .details
            .iter()
            .filter_map(|detail| detail.currency_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if codes.is_empty() && currency_ids.is_empty() {
            return Ok(CurrencyCatalog::default());
        }

        let currencies = self.store.find_currencies(&codes, &currency_ids).await?;
        Ok(CurrencyCatalog::new(currencies))
    }
}

/// Performs every write of one posting inside `txn`.
async fn write_posting<T: PostingTransaction>(
    txn: &mut T,
    posting: &ValidatedPosting,
) -> Result<PostingHeader, PostingError> {
    let reconciled = txn
        .count_reconciled_balances(&posting.account_ids(), posting.posting_date)
        .await?;
    if reconciled > 0 {
        return Err(PostingError::ClosedPeriod {
            posting_date: posting.posting_date,
        });
    }

    let posting_header_id = PostingHeaderId::new(txn.next_id().await?);
    let audit_ts = txn.insert_header(posting_header_id, posting).await?;

    let mut details = Vec::with_capacity(posting.details.len());
    for resolved in &posting.details {
        let detail = PostingDetail {
            posting_detail_id: PostingDetailId::new(txn.next_id().await?),
            posting_header_id,
            account_id: resolved.account_id,
            currency_id: resolved.currency.currency_id,
            currency_code: resolved.currency.currency_code.clone(),
            amount: resolved.amount,
            raw_amount: resolved.raw_amount,
            statement_id: resolved.statement_id,
            statement: None,
        };
        txn.insert_detail(&detail).await?;
        details.push(detail);
    }

    for detail in &details {
        let Some(statement_id) = detail.statement_id else {
            continue;
        };
        if !txn
            .mark_statement_posted(statement_id, detail.account_id, detail.currency_id)
            .await?
        {
            return Err(PostingError::StatementLinkFailed(statement_id));
        }
    }

    for detail in &details {
        txn.add_to_account_balance(
            posting.posting_date,
            detail.account_id,
            detail.currency_id,
            detail.raw_amount,
        )
        .await?;
    }

    Ok(PostingHeader {
        posting_header_id,
        posting_date: posting.posting_date,
        description: posting.description.clone(),
        audit_user_id: posting.audit_user_id,
        audit_ts,
        details,
    })
}
