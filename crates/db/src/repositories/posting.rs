//! Postgres implementation of the posting store.
//!
//! Commits run in a `SERIALIZABLE` read-write transaction so the closed-period
//! guard and the balance updates cannot interleave with a concurrent
//! reconciliation. Ids come from the `posting_id_seq` sequence, which is not
//! rolled back with the transaction. Queries read one `REPEATABLE READ`
//! snapshot.

use chrono::{DateTime, NaiveDate, Utc};
use oasis_core::account::{Account, ActiveFlag};
use oasis_core::posting::{
    Currency, PostingDetail, PostingError, PostingRow, PostingStore, PostingTransaction,
    Statement as StatementLine, ValidatedPosting, denormalize_amount,
};
use oasis_shared::types::{
    AccountId, CurrencyId, PostingDetailId, PostingHeaderId, StatementId, UserId,
};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbBackend, EntityTrait, FromQueryResult, IsolationLevel, PaginatorTrait,
    QueryFilter, Set, Statement, TransactionTrait,
};
use tracing::debug;

use crate::entities::{
    account_balances, accounts, currencies, posting_details, posting_headers, statements,
};
use crate::error::posting_error;

const NEXT_ID_SQL: &str = "SELECT nextval('posting_id_seq') AS id";

const ADD_TO_BALANCE_SQL: &str = r"
INSERT INTO account_balances (account_id, currency_id, posting_date, raw_amount, reconciled)
VALUES ($1, $2, $3, $4, 'N')
ON CONFLICT (account_id, currency_id, posting_date)
DO UPDATE SET raw_amount = account_balances.raw_amount + EXCLUDED.raw_amount
";

const FIND_POSTING_ROWS_SQL: &str = r"
SELECT h.posting_header_id, h.posting_date, h.description, h.audit_user_id, h.audit_ts,
       d.posting_detail_id, d.account_id, d.currency_id, c.currency_code, c.scale,
       d.raw_amount, d.statement_id,
       s.statement_id AS s_statement_id, s.statement_date AS s_statement_date,
       s.account_id AS s_account_id, s.currency_id AS s_currency_id,
       s.raw_amount AS s_raw_amount, s.description AS s_description, s.posted AS s_posted
FROM posting_headers h
JOIN posting_details d ON d.posting_header_id = h.posting_header_id
JOIN currencies c ON c.currency_id = d.currency_id
LEFT JOIN statements s ON s.statement_id = d.statement_id
WHERE h.posting_date >= $1
  AND ($2::date IS NULL OR h.posting_date < $2::date)
ORDER BY h.posting_date DESC, h.posting_header_id DESC, d.posting_detail_id ASC
";

/// Posting store backed by Postgres.
#[derive(Debug, Clone)]
pub struct PostingRepository {
    db: DatabaseConnection,
}

impl PostingRepository {
    /// Creates a new posting repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl PostingStore for PostingRepository {
    type Transaction = PostingTxn;

    async fn find_currencies(
        &self,
        codes: &[String],
        currency_ids: &[CurrencyId],
    ) -> Result<Vec<Currency>, PostingError> {
        let models = currencies::Entity::find()
            .filter(
                Condition::any()
                    .add(currencies::Column::CurrencyCode.is_in(codes.iter().cloned()))
                    .add(
                        currencies::Column::CurrencyId
                            .is_in(currency_ids.iter().map(|id| id.into_inner())),
                    ),
            )
            .all(&self.db)
            .await
            .map_err(posting_error)?;

        models.into_iter().map(into_currency).collect()
    }

    async fn find_accounts(&self, account_ids: &[AccountId]) -> Result<Vec<Account>, PostingError> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::AccountId.is_in(account_ids.iter().map(|id| id.into_inner())))
            .all(&self.db)
            .await
            .map_err(posting_error)?;

        models.into_iter().map(into_account).collect()
    }

    async fn begin_serializable(&self) -> Result<PostingTxn, PostingError> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::Serializable),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(posting_error)?;

        Ok(PostingTxn { txn })
    }

    async fn find_posting_rows(
        &self,
        start: NaiveDate,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PostingRow>, PostingError> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await
            .map_err(posting_error)?;

        let rows = JoinedRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            FIND_POSTING_ROWS_SQL,
            [start.into(), end.into()],
        ))
        .all(&txn)
        .await
        .map_err(posting_error)?;

        txn.commit().await.map_err(posting_error)?;
        debug!(%start, ?end, rows = rows.len(), "Loaded posting rows");

        rows.into_iter().map(PostingRow::try_from).collect()
    }
}

/// Serializable transaction of one posting commit.
#[derive(Debug)]
pub struct PostingTxn {
    txn: DatabaseTransaction,
}

impl PostingTransaction for PostingTxn {
    async fn count_reconciled_balances(
        &mut self,
        account_ids: &[AccountId],
        posting_date: NaiveDate,
    ) -> Result<u64, PostingError> {
        account_balances::Entity::find()
            .filter(
                account_balances::Column::AccountId
                    .is_in(account_ids.iter().map(|id| id.into_inner())),
            )
            .filter(account_balances::Column::PostingDate.gte(posting_date))
            .filter(account_balances::Column::Reconciled.eq("Y"))
            .count(&self.txn)
            .await
            .map_err(posting_error)
    }

    async fn next_id(&mut self) -> Result<i64, PostingError> {
        let row = self
            .txn
            .query_one(Statement::from_string(DbBackend::Postgres, NEXT_ID_SQL))
            .await
            .map_err(posting_error)?
            .ok_or_else(|| PostingError::Internal("posting_id_seq returned no row".into()))?;

        row.try_get::<i64>("", "id").map_err(posting_error)
    }

    async fn insert_header(
        &mut self,
        posting_header_id: PostingHeaderId,
        posting: &ValidatedPosting,
    ) -> Result<DateTime<Utc>, PostingError> {
        let header = posting_headers::ActiveModel {
            posting_header_id: Set(posting_header_id.into_inner()),
            posting_date: Set(posting.posting_date),
            description: Set(posting.description.clone()),
            audit_user_id: Set(posting.audit_user_id.map(UserId::into_inner)),
            ..Default::default()
        };

        let inserted = header.insert(&self.txn).await.map_err(posting_error)?;
        Ok(inserted.audit_ts.with_timezone(&Utc))
    }

    async fn insert_detail(&mut self, detail: &PostingDetail) -> Result<(), PostingError> {
        let model = posting_details::ActiveModel {
            posting_detail_id: Set(detail.posting_detail_id.into_inner()),
            posting_header_id: Set(detail.posting_header_id.into_inner()),
            account_id: Set(detail.account_id.into_inner()),
            currency_id: Set(detail.currency_id.into_inner()),
            raw_amount: Set(detail.raw_amount),
            statement_id: Set(detail.statement_id.map(StatementId::into_inner)),
        };

        posting_details::Entity::insert(model)
            .exec_without_returning(&self.txn)
            .await
            .map_err(posting_error)?;
        Ok(())
    }

    async fn mark_statement_posted(
        &mut self,
        statement_id: StatementId,
        account_id: AccountId,
        currency_id: CurrencyId,
    ) -> Result<bool, PostingError> {
        let result = statements::Entity::update_many()
            .col_expr(statements::Column::Posted, Expr::value(true))
            .filter(statements::Column::StatementId.eq(statement_id.into_inner()))
            .filter(statements::Column::AccountId.eq(account_id.into_inner()))
            .filter(statements::Column::CurrencyId.eq(currency_id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(posting_error)?;

        Ok(result.rows_affected == 1)
    }

    async fn add_to_account_balance(
        &mut self,
        posting_date: NaiveDate,
        account_id: AccountId,
        currency_id: CurrencyId,
        raw_amount: i64,
    ) -> Result<(), PostingError> {
        self.txn
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                ADD_TO_BALANCE_SQL,
                [
                    account_id.into_inner().into(),
                    currency_id.into_inner().into(),
                    posting_date.into(),
                    raw_amount.into(),
                ],
            ))
            .await
            .map_err(posting_error)?;
        Ok(())
    }

    async fn commit(self) -> Result<(), PostingError> {
        self.txn.commit().await.map_err(posting_error)
    }

    async fn rollback(self) -> Result<(), PostingError> {
        self.txn.rollback().await.map_err(posting_error)
    }
}

/// One row of the header × detail × currency × statement join.
#[derive(Debug, FromQueryResult)]
struct JoinedRow {
    posting_header_id: i64,
    posting_date: NaiveDate,
    description: String,
    audit_user_id: Option<i64>,
    audit_ts: DateTime<Utc>,
    posting_detail_id: i64,
    account_id: i64,
    currency_id: i64,
    currency_code: String,
    scale: i32,
    raw_amount: i64,
    statement_id: Option<i64>,
    s_statement_id: Option<i64>,
    s_statement_date: Option<NaiveDate>,
    s_account_id: Option<i64>,
    s_currency_id: Option<i64>,
    s_raw_amount: Option<i64>,
    s_description: Option<String>,
    s_posted: Option<bool>,
}

impl TryFrom<JoinedRow> for PostingRow {
    type Error = PostingError;

    fn try_from(row: JoinedRow) -> Result<Self, Self::Error> {
        let scale = scale_from_db(&row.currency_code, row.scale)?;

        let statement = match (
            row.s_statement_id,
            row.s_statement_date,
            row.s_account_id,
            row.s_currency_id,
            row.s_raw_amount,
        ) {
            (Some(id), Some(date), Some(account_id), Some(currency_id), Some(raw_amount)) => {
                let amount = denormalize_amount(raw_amount, scale).ok_or_else(|| {
                    PostingError::Internal(format!("statement {id} amount out of range"))
                })?;
                Some(StatementLine {
                    statement_id: StatementId::new(id),
                    statement_date: date,
                    account_id: AccountId::new(account_id),
                    currency_id: CurrencyId::new(currency_id),
                    amount,
                    description: row.s_description.unwrap_or_default(),
                    posted: row.s_posted.unwrap_or(false),
                })
            }
            _ => None,
        };

        Ok(Self {
            posting_header_id: PostingHeaderId::new(row.posting_header_id),
            posting_date: row.posting_date,
            description: row.description,
            audit_user_id: row.audit_user_id.map(UserId::new),
            audit_ts: row.audit_ts,
            posting_detail_id: PostingDetailId::new(row.posting_detail_id),
            account_id: AccountId::new(row.account_id),
            currency_id: CurrencyId::new(row.currency_id),
            currency_code: row.currency_code,
            scale,
            raw_amount: row.raw_amount,
            statement_id: row.statement_id.map(StatementId::new),
            statement,
        })
    }
}

fn scale_from_db(currency_code: &str, scale: i32) -> Result<u32, PostingError> {
    u32::try_from(scale).map_err(|_| {
        PostingError::Internal(format!("currency {currency_code} has negative scale {scale}"))
    })
}

fn into_currency(model: currencies::Model) -> Result<Currency, PostingError> {
    let scale = scale_from_db(&model.currency_code, model.scale)?;
    Ok(Currency {
        currency_id: CurrencyId::new(model.currency_id),
        currency_code: model.currency_code,
        scale,
    })
}

fn into_account(model: accounts::Model) -> Result<Account, PostingError> {
    let invalid = |reason: String| {
        PostingError::Internal(format!("account {} is malformed: {reason}", model.account_id))
    };

    let flag = model
        .active_flag
        .trim()
        .chars()
        .next()
        .ok_or_else(|| invalid("missing active flag".into()))?;
    let active_flag = ActiveFlag::try_from(flag).map_err(|e| invalid(e.to_string()))?;

    let account = Account::new(
        AccountId::new(model.account_id),
        model.account_type_id,
        &model.account_code,
        &model.account_name,
    )
    .map_err(|e| invalid(e.to_string()))?
    .with_active_flag(active_flag);

    Ok(match model.parent_account_id {
        Some(parent) => account.with_parent(AccountId::new(parent)),
        None => account,
    })
}
