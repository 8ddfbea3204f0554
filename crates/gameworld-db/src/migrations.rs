//! # Database Migrations
//!
//! Embedded SQL migrations for the catalogue schema.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Service / seed startup                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Check _sqlx_migrations table (created on first run)                    │
//! │       │                                                                 │
//! │       ├── 001_initial_schema.sql ✓ (objects + extended properties)      │
//! │       └── 002_object_types.sql   ⬜ (type catalogue, seeded)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Run pending migrations in order, record checksums                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Adding New Migrations
//!
//! 1. Create a new file in `migrations/postgres/` with the next sequence number
//! 2. Name format: `NNN_description.sql`
//! 3. **NEVER** modify existing migrations, always add new ones

use sqlx::PgConnection;
use tracing::info;

use crate::error::{DbError, DbResult};

/// Embedded migrations from the `migrations/postgres` directory.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/postgres");

/// Runs all pending database migrations on one connection.
///
/// Idempotent; each migration runs in its own transaction.
pub async fn run_migrations(conn: &mut PgConnection) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(conn).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns (total_migrations, applied_migrations).
pub async fn migration_status(conn: &mut PgConnection) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    // The bookkeeping table does not exist before the first run.
    let applied: i64 = match sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(conn)
        .await
        .map_err(DbError::from)
    {
        Ok(count) => count,
        Err(e) if e.is_undefined_table() => 0,
        Err(e) => return Err(e),
    };

    Ok((total, usize::try_from(applied).unwrap_or_default()))
}
