//! Database migration runner for the Oasis ledger.
//!
//! Usage:
//!   migrator up      - Apply pending migrations
//!   migrator down    - Revert the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop the schema and reapply every migration
//!
//! The connection string is read from `DATABASE_URL`.

use oasis_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
