//! Database migration runner for Kopa.
//!
//! Reads `DATABASE_URL` from the environment or `.env`.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Roll back the last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use kopa_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The CLI sets up its own tracing.
    cli::run_cli(Migrator).await;
}
