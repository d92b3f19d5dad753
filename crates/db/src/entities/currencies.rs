//! `SeaORM` Entity for currencies table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "currencies")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub currency_id: i64,
    #[sea_orm(unique)]
    pub currency_code: String,
    pub scale: i32,
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
