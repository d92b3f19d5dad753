//! Property-based tests for posting validation.
//!
//! - Balanced single-currency postings validate and sum to zero
//! - Postings with three or more currencies are rejected
//! - Amounts finer than the currency scale are rejected

use chrono::NaiveDate;
use oasis_shared::types::{AccountId, CurrencyId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::currency::CurrencyCatalog;
use super::error::PostingError;
use super::types::{Currency, NewPosting, NewPostingDetail};
use super::validation::validate_posting;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

/// Catalog of currencies `C0`..`C4` with ids 1..=5 and the given scale.
fn catalog(scale: u32) -> CurrencyCatalog {
    (1..=5)
        .map(|id| Currency {
            currency_id: CurrencyId::new(id),
            currency_code: format!("C{}", id - 1),
            scale,
        })
        .collect()
}

/// Strategy for nonzero raw amounts in minor units.
fn raw_amount() -> impl Strategy<Value = i64> {
    prop_oneof![(-1_000_000_000i64..-1), (1i64..1_000_000_000)]
}

/// Helper to create a detail line by currency id.
fn make_detail(account: i64, currency: i64, amount: Decimal) -> NewPostingDetail {
    NewPostingDetail {
        account_id: AccountId::new(account),
        currency: None,
        currency_id: Some(CurrencyId::new(currency)),
        amount,
        statement_id: None,
    }
}

fn make_posting(details: Vec<NewPostingDetail>) -> NewPosting {
    NewPosting {
        posting_date: today(),
        description: None,
        audit_user_id: None,
        details,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A set of amounts closed by one offsetting line always validates, and
    /// the raw amounts sum to exactly zero.
    #[test]
    fn prop_balanced_single_currency_validates(
        raws in prop::collection::vec(raw_amount(), 1..8),
        scale in 0u32..6,
    ) {
        let offset: i64 = -raws.iter().sum::<i64>();
        let details: Vec<_> = raws
            .iter()
            .chain(std::iter::once(&offset))
            .enumerate()
            .map(|(i, raw)| make_detail(100 + i as i64, 1, Decimal::new(*raw, scale)))
            .collect();

        let validated = validate_posting(make_posting(details), today(), &catalog(scale));
        prop_assert!(validated.is_ok(), "expected success, got {:?}", validated);

        let validated = validated.unwrap();
        let total: i128 = validated.details.iter().map(|d| i128::from(d.raw_amount)).sum();
        prop_assert_eq!(total, 0);
        prop_assert_eq!(validated.details.len(), raws.len() + 1);
    }

    /// Any posting touching three or more currencies is rejected, whatever
    /// its amounts.
    #[test]
    fn prop_three_or_more_currencies_rejected(
        currency_count in 3usize..=5,
        raws in prop::collection::vec(raw_amount(), 5),
    ) {
        let details: Vec<_> = (0..currency_count)
            .map(|i| make_detail(100 + i as i64, i as i64 + 1, Decimal::new(raws[i], 2)))
            .collect();

        let result = validate_posting(make_posting(details), today(), &catalog(2));
        prop_assert_eq!(result, Err(PostingError::TooManyCurrencies(currency_count)));
    }

    /// An amount with one more decimal digit than the scale allows, and a
    /// nonzero last digit, is rejected as fractional.
    #[test]
    fn prop_sub_scale_amount_rejected(
        minor in 1i64..1_000_000,
        extra_digit in 1i64..10,
        scale in 0u32..6,
    ) {
        let amount = Decimal::new(minor * 10 + extra_digit, scale + 1);
        let details = vec![
            make_detail(100, 1, amount),
            make_detail(200, 1, -amount),
        ];

        let result = validate_posting(make_posting(details), today(), &catalog(scale));
        prop_assert!(
            matches!(result, Err(PostingError::FractionalAmount { .. })),
            "expected fractional amount error, got {:?}",
            result
        );
    }

    /// Any date within the year distance validates, any date beyond it fails.
    #[test]
    fn prop_posting_date_range(years_away in -150i32..=150, ordinal in 1u32..=365) {
        let posting_date = NaiveDate::from_yo_opt(2026 + years_away, ordinal).unwrap();
        let mut posting = make_posting(vec![
            make_detail(100, 1, Decimal::new(-1, 2)),
            make_detail(200, 1, Decimal::new(1, 2)),
        ]);
        posting.posting_date = posting_date;

        let result = validate_posting(posting, today(), &catalog(2));
        if years_away.abs() > 100 {
            prop_assert_eq!(result, Err(PostingError::PostingDateOutOfRange(posting_date)));
        } else {
            prop_assert!(result.is_ok());
        }
    }
}
