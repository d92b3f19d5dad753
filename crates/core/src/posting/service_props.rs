//! Property-based tests for PostingService against the in-memory store.
//!
//! - Balanced postings commit and their recorded raw amounts sum to zero
//! - A rejected commit fails identically on resubmission and writes nothing

use std::sync::Arc;

use chrono::NaiveDate;
use oasis_shared::types::{AccountId, CurrencyId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::PostingError;
use super::memory::MemoryStore;
use super::service::PostingService;
use super::types::{NewPosting, NewPostingDetail};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

/// Strategy for nonzero USD amounts in cents.
fn cents() -> impl Strategy<Value = i64> {
    prop_oneof![(-10_000_000i64..-1), (1i64..10_000_000)]
}

fn usd(account: i64, cents: i64) -> NewPostingDetail {
    NewPostingDetail {
        account_id: AccountId::new(account),
        currency: Some("USD".into()),
        currency_id: None,
        amount: Decimal::new(cents, 2),
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

/// Kinds of invalid postings.
#[derive(Debug, Clone, Copy)]
enum Defect {
    Unbalanced,
    Fractional,
    DuplicateAccount,
    UnknownAccount,
    ClosedPeriod,
}

fn defect() -> impl Strategy<Value = Defect> {
    prop_oneof![
        Just(Defect::Unbalanced),
        Just(Defect::Fractional),
        Just(Defect::DuplicateAccount),
        Just(Defect::UnknownAccount),
        Just(Defect::ClosedPeriod),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A balanced three-line USD posting commits and its details sum to zero.
    #[test]
    fn prop_balanced_posting_commits(a in cents(), b in cents()) {
        let store = Arc::new(MemoryStore::seeded());
        let service = PostingService::new(Arc::clone(&store));
        let posting = make_posting(vec![usd(100, a), usd(200, b), usd(300, -(a + b))]);

        let header = runtime()
            .block_on(service.commit_posting_on(posting, today()))
            .unwrap();

        prop_assert_eq!(header.raw_total(), 0);
        prop_assert_eq!(header.details.len(), 3);
        let balances: i64 = [100, 200, 300]
            .into_iter()
            .map(|id| store.balance(AccountId::new(id), CurrencyId::new(1)))
            .sum();
        prop_assert_eq!(balances, 0);
    }

    /// Resubmitting an invalid posting yields the same error and leaves no rows.
    #[test]
    fn prop_rejected_commit_is_idempotent(amount in cents(), defect in defect()) {
        let store = Arc::new(MemoryStore::seeded());
        let service = PostingService::new(Arc::clone(&store));

        let posting = match defect {
            Defect::Unbalanced => make_posting(vec![usd(100, amount), usd(200, -amount + 1)]),
            Defect::Fractional => {
                let mut fractional = usd(100, amount);
                fractional.amount = Decimal::new(amount * 10 + 5, 3);
                make_posting(vec![fractional, usd(200, -amount)])
            }
            Defect::DuplicateAccount => make_posting(vec![usd(100, amount), usd(100, -amount)]),
            Defect::UnknownAccount => make_posting(vec![usd(100, amount), usd(999, -amount)]),
            Defect::ClosedPeriod => {
                store.reconcile(AccountId::new(200), CurrencyId::new(1), today());
                make_posting(vec![usd(100, amount), usd(200, -amount)])
            }
        };

        let rt = runtime();
        let first = rt.block_on(service.commit_posting_on(posting.clone(), today()));
        let second = rt.block_on(service.commit_posting_on(posting, today()));

        prop_assert!(first.is_err(), "{:?} should be rejected", defect);
        prop_assert_eq!(&first, &second);
        prop_assert!(!matches!(first, Err(PostingError::TransactionConflict)));
        prop_assert_eq!(store.header_count(), 0);
        prop_assert_eq!(store.detail_count(), 0);
        prop_assert_eq!(store.balance(AccountId::new(100), CurrencyId::new(1)), 0);
    }
}
