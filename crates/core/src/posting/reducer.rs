//! Folds the flat joined row stream back into posting aggregates.
//!
//! Rows for one header are contiguous because the query orders by posting
//! date and header id before detail id, so a single pass with one row of
//! lookahead is enough.

use std::iter::Peekable;

use super::currency::denormalize_amount;
use super::error::PostingError;
use super::types::{PostingDetail, PostingHeader, PostingRow};

/// Lazy iterator over the headers found in an ordered row stream.
pub struct PostingReducer<I>
where
    I: Iterator<Item = PostingRow>,
{
    rows: Peekable<I>,
}

impl<I> PostingReducer<I>
where
    I: Iterator<Item = PostingRow>,
{
    /// Wraps an ordered row stream.
    pub fn new(rows: I) -> Self {
        Self {
            rows: rows.peekable(),
        }
    }
}

impl<I> Iterator for PostingReducer<I>
where
    I: Iterator<Item = PostingRow>,
{
    type Item = Result<PostingHeader, PostingError>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.rows.next()?;
        let header_id = first.posting_header_id;

        let mut header = PostingHeader {
            posting_header_id: header_id,
            posting_date: first.posting_date,
            description: first.description.clone(),
            audit_user_id: first.audit_user_id,
            audit_ts: first.audit_ts,
            details: Vec::new(),
        };

        let mut failure = None;
        let group = std::iter::once(first)
            .chain(std::iter::from_fn(|| {
                self.rows.next_if(|row| row.posting_header_id == header_id)
            }));

        for row in group {
            if failure.is_some() {
                continue;
            }
            match into_detail(row) {
                Ok(detail) => header.details.push(detail),
                Err(err) => failure = Some(err),
            }
        }

        Some(match failure {
            Some(err) => Err(err),
            None => Ok(header),
        })
    }
}

/// Reduces an ordered row stream into posting headers.
pub fn reduce_rows<I>(rows: I) -> PostingReducer<I::IntoIter>
where
    I: IntoIterator<Item = PostingRow>,
{
    PostingReducer::new(rows.into_iter())
}

fn into_detail(row: PostingRow) -> Result<PostingDetail, PostingError> {
    let amount = denormalize_amount(row.raw_amount, row.scale).ok_or_else(|| {
        PostingError::Internal(format!(
            "currency {} has unsupported scale {}",
            row.currency_code, row.scale
        ))
    })?;

    Ok(PostingDetail {
        posting_detail_id: row.posting_detail_id,
        posting_header_id: row.posting_header_id,
        account_id: row.account_id,
        currency_id: row.currency_id,
        currency_code: row.currency_code,
        amount,
        raw_amount: row.raw_amount,
        statement_id: row.statement_id,
        statement: row.statement,
    })
}
