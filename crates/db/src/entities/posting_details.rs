//! `SeaORM` Entity for posting_details table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "posting_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub posting_detail_id: i64,
    pub posting_header_id: i64,
    pub account_id: i64,
    pub currency_id: i64,
    pub raw_amount: i64,
    pub statement_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::posting_headers::Entity",
        from = "Column::PostingHeaderId",
        to = "super::posting_headers::Column::PostingHeaderId"
    )]
    PostingHeaders,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::AccountId"
    )]
    Accounts,
    #[sea_orm(
        belongs_to = "super::currencies::Entity",
        from = "Column::CurrencyId",
        to = "super::currencies::Column::CurrencyId"
    )]
    Currencies,
    #[sea_orm(
        belongs_to = "super::statements::Entity",
        from = "Column::StatementId",
        to = "super::statements::Column::StatementId"
    )]
    Statements,
}

impl Related<super::posting_headers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostingHeaders.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::currencies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Currencies.def()
    }
}

impl Related<super::statements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Statements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
