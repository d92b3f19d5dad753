//! `SeaORM` entity definitions.

pub mod account_balances;
pub mod accounts;
pub mod currencies;
pub mod posting_details;
pub mod posting_headers;
pub mod statements;
