//! Currency resolution and amount normalization.
//!
//! Raw amounts are exact integers in a currency's minor unit. Normalization
//! never rounds: an amount with more decimal digits than the currency scale
//! is rejected.

use std::collections::HashMap;

use oasis_shared::types::CurrencyId;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::error::PostingError;
use super::types::Currency;

/// Largest scale a `Decimal` can represent.
pub const MAX_SCALE: u32 = 28;

/// Currencies loaded for one posting, indexed by id and by code.
#[derive(Debug, Clone, Default)]
pub struct CurrencyCatalog {
    by_id: HashMap<CurrencyId, Currency>,
    by_code: HashMap<String, CurrencyId>,
}

impl CurrencyCatalog {
    /// Builds a catalog from currency records.
    pub fn new(currencies: impl IntoIterator<Item = Currency>) -> Self {
        currencies.into_iter().collect()
    }

    /// Looks up a currency by code.
    #[must_use]
    pub fn by_code(&self, code: &str) -> Option<&Currency> {
        self.by_code.get(code).and_then(|id| self.by_id.get(id))
    }

    /// Looks up a currency by id.
    #[must_use]
    pub fn by_id(&self, currency_id: CurrencyId) -> Option<&Currency> {
        self.by_id.get(&currency_id)
    }

    /// Number of currencies in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if the catalog holds no currency.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl FromIterator<Currency> for CurrencyCatalog {
    fn from_iter<T: IntoIterator<Item = Currency>>(iter: T) -> Self {
        let mut catalog = Self::default();
        for currency in iter {
            catalog
                .by_code
                .insert(currency.currency_code.clone(), currency.currency_id);
            catalog.by_id.insert(currency.currency_id, currency);
        }
        catalog
    }
}

/// Resolves a currency reference given by code, by id, or both.
///
/// The code wins when present; an id given alongside it must agree with the
/// resolved record.
///
/// # Errors
///
/// - `MissingCurrency` when neither reference is given
/// - `UnknownCurrencyCode` / `UnknownCurrencyId` when the lookup fails
/// - `ConflictingCurrency` when code and id name different currencies
pub fn resolve_currency<'a>(
    catalog: &'a CurrencyCatalog,
    code: Option<&str>,
    currency_id: Option<CurrencyId>,
) -> Result<&'a Currency, PostingError> {
    match (code, currency_id) {
        (Some(code), currency_id) => {
            let currency = catalog
                .by_code(code)
                .ok_or_else(|| PostingError::UnknownCurrencyCode(code.to_string()))?;
            match currency_id {
                Some(id) if id != currency.currency_id => Err(PostingError::ConflictingCurrency {
                    code: code.to_string(),
                    currency_id: id,
                }),
                _ => Ok(currency),
            }
        }
        (None, Some(id)) => catalog
            .by_id(id)
            .ok_or(PostingError::UnknownCurrencyId(id)),
        (None, None) => Err(PostingError::MissingCurrency),
    }
}

/// Converts a decimal amount into its raw minor-unit integer.
///
/// # Errors
///
/// - `FractionalAmount` when the scaled amount keeps a fractional part
/// - `AmountOutOfRange` when the scaled amount does not fit an `i64` or the
///   currency scale exceeds [`MAX_SCALE`]
pub fn normalize_amount(amount: Decimal, currency: &Currency) -> Result<i64, PostingError> {
    let out_of_range = || PostingError::AmountOutOfRange {
        currency_code: currency.currency_code.clone(),
        amount,
    };

    if currency.scale > MAX_SCALE {
        return Err(out_of_range());
    }

    let factor = Decimal::from_i128_with_scale(10_i128.pow(currency.scale), 0);
    let scaled = amount.checked_mul(factor).ok_or_else(out_of_range)?;

    if !scaled.fract().is_zero() {
        return Err(PostingError::FractionalAmount {
            currency_code: currency.currency_code.clone(),
            amount,
        });
    }

    scaled.trunc().to_i64().ok_or_else(out_of_range)
}

/// Converts a raw minor-unit integer back into a decimal amount.
///
/// Returns `None` if `scale` exceeds [`MAX_SCALE`].
#[must_use]
pub fn denormalize_amount(raw_amount: i64, scale: u32) -> Option<Decimal> {
    Decimal::try_new(raw_amount, scale).ok()
}
