//! `SeaORM` Entity for statements table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "statements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub statement_id: i64,
    pub statement_date: Date,
    pub account_id: i64,
    pub currency_id: i64,
    pub raw_amount: i64,
    pub description: String,
    pub posted: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::posting_details::Entity")]
    PostingDetails,
}

impl Related<super::posting_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostingDetails.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
