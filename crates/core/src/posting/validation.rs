//! Structural validation of postings.
//!
//! Checks run in a fixed order so that the first applicable violation is the
//! one reported:
//!
//! 1. at least one detail
//! 2. currency resolution and amount normalization, detail by detail
//! 3. posting date range
//! 4. currency count and zero balance
//! 5. account uniqueness
//!
//! Account existence is checked separately by [`check_accounts`] once the
//! referenced accounts are loaded.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use oasis_shared::types::{AccountId, CurrencyId};
use rust_decimal::Decimal;

use super::currency::{CurrencyCatalog, normalize_amount, resolve_currency};
use super::error::PostingError;
use super::types::{NewPosting, NewPostingDetail, ResolvedDetail, ValidatedPosting};
use crate::account::Account;

/// Maximum distance in calendar years between the posting date and today.
pub const MAX_POSTING_YEAR_DISTANCE: i32 = 100;

/// Maximum number of distinct currencies in one posting.
pub const MAX_CURRENCIES_PER_POSTING: usize = 2;

/// Rejects a posting without detail lines.
///
/// # Errors
///
/// Returns `MissingDetails` if `details` is empty.
pub fn ensure_details(details: &[NewPostingDetail]) -> Result<(), PostingError> {
    if details.is_empty() {
        return Err(PostingError::MissingDetails);
    }
    Ok(())
}

/// Validates a posting against every structural rule.
///
/// Trimming the description is the only change made to the input. No I/O is
/// performed; currencies come from `catalog`.
pub fn validate_posting(
    posting: NewPosting,
    today: NaiveDate,
    catalog: &CurrencyCatalog,
) -> Result<ValidatedPosting, PostingError> {
    ensure_details(&posting.details)?;

    let description = posting
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();

    let details = posting
        .details
        .into_iter()
        .map(|detail| resolve_detail(detail, catalog))
        .collect::<Result<Vec<_>, _>>()?;

    validate_posting_date(posting.posting_date, today)?;
    validate_balance(&details)?;
    validate_unique_accounts(&details)?;

    Ok(ValidatedPosting {
        posting_date: posting.posting_date,
        description,
        audit_user_id: posting.audit_user_id,
        details,
    })
}

/// Checks that every referenced account exists and is active.
///
/// The accounts are read before the commit transaction opens, so an account
/// deactivated concurrently with a commit can still receive that posting.
///
/// # Errors
///
/// Returns `UnknownAccount` or `InactiveAccount` for the first offending
/// detail.
pub fn check_accounts(
    posting: &ValidatedPosting,
    accounts: &HashMap<AccountId, Account>,
) -> Result<(), PostingError> {
    for detail in &posting.details {
        let account = accounts
            .get(&detail.account_id)
            .ok_or(PostingError::UnknownAccount(detail.account_id))?;
        if !account.is_active() {
            return Err(PostingError::InactiveAccount(detail.account_id));
        }
    }
    Ok(())
}

fn resolve_detail(
    detail: NewPostingDetail,
    catalog: &CurrencyCatalog,
) -> Result<ResolvedDetail, PostingError> {
    let currency = resolve_currency(catalog, detail.currency.as_deref(), detail.currency_id)?;
    let raw_amount = normalize_amount(detail.amount, currency)?;

    Ok(ResolvedDetail {
        account_id: detail.account_id,
        currency: currency.clone(),
        amount: detail.amount,
        raw_amount,
        statement_id: detail.statement_id,
    })
}

fn validate_posting_date(posting_date: NaiveDate, today: NaiveDate) -> Result<(), PostingError> {
    if (posting_date.year() - today.year()).abs() > MAX_POSTING_YEAR_DISTANCE {
        return Err(PostingError::PostingDateOutOfRange(posting_date));
    }
    Ok(())
}

fn validate_balance(details: &[ResolvedDetail]) -> Result<(), PostingError> {
    let currencies: HashSet<CurrencyId> = details.iter().map(|d| d.currency.currency_id).collect();

    if currencies.len() > MAX_CURRENCIES_PER_POSTING {
        return Err(PostingError::TooManyCurrencies(currencies.len()));
    }

    // Cross-currency postings balance through an exchange leg outside the ledger.
    if currencies.len() == 1 {
        let raw_total: i128 = details.iter().map(|d| i128::from(d.raw_amount)).sum();
        if raw_total != 0 {
            let scale = details[0].currency.scale;
            let total =
                Decimal::try_from_i128_with_scale(raw_total, scale).unwrap_or(if raw_total > 0 {
                    Decimal::MAX
                } else {
                    Decimal::MIN
                });
            return Err(PostingError::UnbalancedPosting { total });
        }
    }

    Ok(())
}

fn validate_unique_accounts(details: &[ResolvedDetail]) -> Result<(), PostingError> {
    let mut seen = HashSet::with_capacity(details.len());
    for detail in details {
        if !seen.insert(detail.account_id) {
            return Err(PostingError::DuplicateAccount(detail.account_id));
        }
    }
    Ok(())
}
