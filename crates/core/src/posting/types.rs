//! Posting domain types.
//!
//! Input types arrive from the caller, resolved types carry currency and raw
//! amounts after validation, and [`PostingHeader`] is both the committed
//! result and the aggregate rebuilt by the query reducer.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use oasis_shared::types::{
    AccountId, CurrencyId, PostingDetailId, PostingHeaderId, StatementId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A currency with its minor-unit scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    /// Currency identity.
    pub currency_id: CurrencyId,
    /// Currency code, e.g. `USD`.
    pub currency_code: String,
    /// Number of minor-unit decimal digits.
    pub scale: u32,
}

/// A posting submitted for commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPosting {
    /// Date the posting applies to.
    pub posting_date: NaiveDate,
    /// Free text description, trimmed on commit.
    #[serde(default)]
    pub description: Option<String>,
    /// User recorded in the audit fields.
    #[serde(default)]
    pub audit_user_id: Option<UserId>,
    /// Detail lines in submission order.
    #[serde(default)]
    pub details: Vec<NewPostingDetail>,
}

/// One detail line of a [`NewPosting`].
///
/// The currency may be given by code, by id, or both; when both are given
/// they must name the same currency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPostingDetail {
    /// Account to post to.
    pub account_id: AccountId,
    /// Currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Currency id.
    #[serde(default)]
    pub currency_id: Option<CurrencyId>,
    /// Signed amount in major units.
    pub amount: Decimal,
    /// Bank statement line this detail reconciles.
    #[serde(default)]
    pub statement_id: Option<StatementId>,
}

/// A detail line with its currency resolved and raw amount computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDetail {
    /// Account to post to.
    pub account_id: AccountId,
    /// Resolved currency.
    pub currency: Currency,
    /// Signed amount in major units.
    pub amount: Decimal,
    /// `amount` scaled to the currency's minor unit.
    pub raw_amount: i64,
    /// Bank statement line this detail reconciles.
    pub statement_id: Option<StatementId>,
}

/// A posting that passed every structural check and is ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPosting {
    /// Date the posting applies to.
    pub posting_date: NaiveDate,
    /// Trimmed description, empty when none was supplied.
    pub description: String,
    /// User recorded in the audit fields.
    pub audit_user_id: Option<UserId>,
    /// Resolved detail lines in submission order.
    pub details: Vec<ResolvedDetail>,
}

impl ValidatedPosting {
    /// Returns the distinct account ids referenced, in first-seen order.
    #[must_use]
    pub fn account_ids(&self) -> Vec<AccountId> {
        let mut seen = HashSet::with_capacity(self.details.len());
        self.details
            .iter()
            .map(|d| d.account_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

/// A posting header with its detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingHeader {
    /// Header identity.
    pub posting_header_id: PostingHeaderId,
    /// Date the posting applies to.
    pub posting_date: NaiveDate,
    /// Description.
    pub description: String,
    /// User recorded in the audit fields.
    pub audit_user_id: Option<UserId>,
    /// Time the header row was written.
    pub audit_ts: DateTime<Utc>,
    /// Detail lines ordered by detail id.
    pub details: Vec<PostingDetail>,
}

impl PostingHeader {
    /// Sum of the raw amounts of all details.
    #[must_use]
    pub fn raw_total(&self) -> i128 {
        self.details.iter().map(|d| i128::from(d.raw_amount)).sum()
    }
}

/// A committed detail line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingDetail {
    /// Detail identity.
    pub posting_detail_id: PostingDetailId,
    /// Owning header.
    pub posting_header_id: PostingHeaderId,
    /// Account posted to.
    pub account_id: AccountId,
    /// Currency posted in.
    pub currency_id: CurrencyId,
    /// Code of `currency_id`.
    pub currency_code: String,
    /// Signed amount in major units.
    pub amount: Decimal,
    /// Signed amount in minor units.
    pub raw_amount: i64,
    /// Linked bank statement line.
    pub statement_id: Option<StatementId>,
    /// The linked statement line, when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<Statement>,
}

/// A bank statement line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
    /// Statement line identity.
    pub statement_id: StatementId,
    /// Date on the bank statement.
    pub statement_date: NaiveDate,
    /// Account the line belongs to.
    pub account_id: AccountId,
    /// Currency of the line.
    pub currency_id: CurrencyId,
    /// Amount in major units.
    pub amount: Decimal,
    /// Bank description.
    pub description: String,
    /// Whether a posting has been linked to this line.
    pub posted: bool,
}

/// One flat row of the header × detail × currency × statement join.
///
/// Rows arrive ordered by posting date and header id descending, then by
/// detail id ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingRow {
    /// Header identity.
    pub posting_header_id: PostingHeaderId,
    /// Header date.
    pub posting_date: NaiveDate,
    /// Header description.
    pub description: String,
    /// Header audit user.
    pub audit_user_id: Option<UserId>,
    /// Header audit time.
    pub audit_ts: DateTime<Utc>,
    /// Detail identity.
    pub posting_detail_id: PostingDetailId,
    /// Detail account.
    pub account_id: AccountId,
    /// Detail currency.
    pub currency_id: CurrencyId,
    /// Detail currency code.
    pub currency_code: String,
    /// Detail currency scale.
    pub scale: u32,
    /// Detail amount in minor units.
    pub raw_amount: i64,
    /// Detail statement link.
    pub statement_id: Option<StatementId>,
    /// Outer-joined statement line.
    pub statement: Option<Statement>,
}
