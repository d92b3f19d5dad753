//! Posting commit engine and query reducer.
//!
//! - [`currency`] resolves currency references and scales amounts
//! - [`validation`] enforces the structural rules of a posting
//! - [`service`] commits postings through a [`store::PostingTransaction`]
//!   and answers range queries
//! - [`reducer`] folds joined query rows into posting aggregates

pub mod currency;
pub mod error;
pub mod reducer;
pub mod service;
pub mod store;
pub mod types;
pub mod validation;

#[cfg(test)]
mod memory;
#[cfg(test)]
mod service_props;
#[cfg(test)]
mod validation_props;

pub use currency::{CurrencyCatalog, denormalize_amount, normalize_amount, resolve_currency};
pub use error::{PostingError, PostingErrorKind};
pub use reducer::{PostingReducer, reduce_rows};
pub use service::{PostingService, Postings};
pub use store::{PostingStore, PostingTransaction};
pub use types::{
    Currency, NewPosting, NewPostingDetail, PostingDetail, PostingHeader, PostingRow,
    ResolvedDetail, Statement, ValidatedPosting,
};
pub use validation::{check_accounts, ensure_details, validate_posting};
