//! `SeaORM` Entity for posting_headers table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "posting_headers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub posting_header_id: i64,
    pub posting_date: Date,
    pub description: String,
    pub audit_user_id: Option<i64>,
    pub audit_ts: DateTimeWithTimeZone,
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
