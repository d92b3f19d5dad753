//! Posting error types.
//!
//! Every failure names the violated rule or the unresolved reference. The
//! [`PostingErrorKind`] groups variants into the classes callers act on.

use chrono::NaiveDate;
use oasis_shared::AppError;
use oasis_shared::types::{AccountId, CurrencyId, StatementId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur while committing or querying postings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PostingError {
    // ========== Reference Errors ==========
    /// Neither a currency code nor a currency id was supplied.
    #[error("Missing currency")]
    MissingCurrency,

    /// No currency has the given code.
    #[error("Invalid currency: {0}")]
    UnknownCurrencyCode(String),

    /// No currency has the given id.
    #[error("Invalid currencyId: {0}")]
    UnknownCurrencyId(CurrencyId),

    /// The currency code and currency id name different currencies.
    #[error("Conflicting currency {code} and currencyId {currency_id}")]
    ConflictingCurrency {
        /// Code supplied by the caller.
        code: String,
        /// Id supplied by the caller.
        currency_id: CurrencyId,
    },

    /// No account has the given id.
    #[error("Invalid accountId: {0}")]
    UnknownAccount(AccountId),

    /// The account is flagged inactive.
    #[error("Account {0} is inactive")]
    InactiveAccount(AccountId),

    // ========== Amount Errors ==========
    /// The amount has more decimal digits than the currency allows.
    #[error("Invalid fractional amount for currency {currency_code}: {amount}")]
    FractionalAmount {
        /// Currency code.
        currency_code: String,
        /// Amount supplied by the caller.
        amount: Decimal,
    },

    /// The scaled amount does not fit a raw amount.
    #[error("Amount out of range for currency {currency_code}: {amount}")]
    AmountOutOfRange {
        /// Currency code.
        currency_code: String,
        /// Amount supplied by the caller.
        amount: Decimal,
    },

    // ========== Structural Errors ==========
    /// The posting has no detail lines.
    #[error("Missing posting details")]
    MissingDetails,

    /// The posting date is too far from the current date.
    #[error("Invalid posting date: {0}")]
    PostingDateOutOfRange(NaiveDate),

    /// The posting references more than two currencies.
    #[error("Invalid posting with {0} currencies")]
    TooManyCurrencies(usize),

    /// A single-currency posting does not sum to zero.
    #[error("Unbalanced posting with non zero total: {total}")]
    UnbalancedPosting {
        /// Sum of all detail amounts.
        total: Decimal,
    },

    /// An account appears on more than one detail line.
    #[error("Accounts must be unique within a single posting, account {0} is repeated")]
    DuplicateAccount(AccountId),

    /// The requested month does not exist.
    #[error("Invalid month {month} of year {year}")]
    InvalidMonth {
        /// Requested year.
        year: i32,
        /// Requested month.
        month: u32,
    },

    /// The trailing window reaches before the earliest representable date.
    #[error("Invalid trailing window of {0} days")]
    InvalidWindow(u32),

    // ========== Commit Errors ==========
    /// A target account has a reconciled balance on or after the posting date.
    #[error("Failed to post to account marked as reconciled on or after {posting_date}")]
    ClosedPeriod {
        /// Posting date that was rejected.
        posting_date: NaiveDate,
    },

    /// The referenced statement line does not exist or belongs to another
    /// account or currency.
    #[error("Failed to link posting detail to statement id {0}")]
    StatementLinkFailed(StatementId),

    /// The serializable transaction lost against a concurrent one.
    #[error("Posting conflicted with a concurrent transaction, resubmit to retry")]
    TransactionConflict,

    // ========== Storage Errors ==========
    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Classes of posting failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingErrorKind {
    /// A required reference was not supplied.
    MissingInput,
    /// A reference does not resolve.
    InvalidReference,
    /// Two references disagree.
    ConflictingInput,
    /// An amount cannot be represented at the currency scale.
    FractionalAmount,
    /// The posting breaks a structural rule.
    StructuralViolation,
    /// The posting targets a reconciled period.
    ClosedPeriod,
    /// A statement line could not be linked.
    StatementLinkFailed,
    /// The transaction lost a serialization race.
    TransactionConflict,
    /// The storage layer failed.
    Storage,
}

impl PostingError {
    /// Returns the failure class of this error.
    #[must_use]
    pub fn kind(&self) -> PostingErrorKind {
        match self {
            Self::MissingCurrency => PostingErrorKind::MissingInput,
            Self::UnknownCurrencyCode(_)
            | Self::UnknownCurrencyId(_)
            | Self::UnknownAccount(_)
            | Self::InactiveAccount(_) => PostingErrorKind::InvalidReference,
            Self::ConflictingCurrency { .. } => PostingErrorKind::ConflictingInput,
            Self::FractionalAmount { .. } | Self::AmountOutOfRange { .. } => {
                PostingErrorKind::FractionalAmount
            }
            Self::MissingDetails
            | Self::PostingDateOutOfRange(_)
            | Self::TooManyCurrencies(_)
            | Self::UnbalancedPosting { .. }
            | Self::DuplicateAccount(_)
            | Self::InvalidMonth { .. }
            | Self::InvalidWindow(_) => PostingErrorKind::StructuralViolation,
            Self::ClosedPeriod { .. } => PostingErrorKind::ClosedPeriod,
            Self::StatementLinkFailed(_) => PostingErrorKind::StatementLinkFailed,
            Self::TransactionConflict => PostingErrorKind::TransactionConflict,
            Self::Database(_) | Self::Internal(_) => PostingErrorKind::Storage,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCurrency => "MISSING_CURRENCY",
            Self::UnknownCurrencyCode(_) => "UNKNOWN_CURRENCY_CODE",
            Self::UnknownCurrencyId(_) => "UNKNOWN_CURRENCY_ID",
            Self::ConflictingCurrency { .. } => "CONFLICTING_CURRENCY",
            Self::UnknownAccount(_) => "UNKNOWN_ACCOUNT",
            Self::InactiveAccount(_) => "INACTIVE_ACCOUNT",
            Self::FractionalAmount { .. } => "FRACTIONAL_AMOUNT",
            Self::AmountOutOfRange { .. } => "AMOUNT_OUT_OF_RANGE",
            Self::MissingDetails => "MISSING_DETAILS",
            Self::PostingDateOutOfRange(_) => "POSTING_DATE_OUT_OF_RANGE",
            Self::TooManyCurrencies(_) => "TOO_MANY_CURRENCIES",
            Self::UnbalancedPosting { .. } => "UNBALANCED_POSTING",
            Self::DuplicateAccount(_) => "DUPLICATE_ACCOUNT",
            Self::InvalidMonth { .. } => "INVALID_MONTH",
            Self::InvalidWindow(_) => "INVALID_WINDOW",
            Self::ClosedPeriod { .. } => "CLOSED_PERIOD",
            Self::StatementLinkFailed(_) => "STATEMENT_LINK_FAILED",
            Self::TransactionConflict => "TRANSACTION_CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self.kind() {
            PostingErrorKind::TransactionConflict => 409,
            PostingErrorKind::Storage => 500,
            // Every other class is caused by the request.
            _ => 400,
        }
    }

    /// Returns true if resubmitting the same posting may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionConflict)
    }
}

impl From<PostingError> for AppError {
    fn from(err: PostingError) -> Self {
        let code = err.error_code();
        match err.kind() {
            PostingErrorKind::TransactionConflict => Self::Conflict {
                code,
                message: err.to_string(),
            },
            PostingErrorKind::Storage => match err {
                PostingError::Database(msg) => Self::Database(msg),
                other => Self::Internal(other.to_string()),
            },
            _ => Self::bad_request(code, err.to_string()),
        }
    }
}
