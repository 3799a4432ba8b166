//! Embedded schema migrations.
//!
//! The SQL under `accounts/migrations` is compiled into the binary and applied
//! over a synchronous connection on the blocking thread pool.

use diesel::{Connection, PgConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::domain::ports::UserPersistenceError;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply every pending migration to the database at `database_url`.
///
/// # Errors
///
/// Returns [`UserPersistenceError::Connection`] when the database cannot be
/// reached and [`UserPersistenceError::Query`] when a migration fails.
pub fn migrate_schema(database_url: &str) -> Result<usize, UserPersistenceError> {
    let mut conn = PgConnection::establish(database_url)
        .map_err(|err| UserPersistenceError::connection(err.to_string()))?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| UserPersistenceError::query(format!("migration: {err}")))?;
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(applied.len())
}

/// Run [`migrate_schema`] on the blocking thread pool.
pub async fn migrate_schema_async(database_url: String) -> Result<usize, UserPersistenceError> {
    tokio::task::spawn_blocking(move || migrate_schema(&database_url))
        .await
        .map_err(|err| UserPersistenceError::query(format!("migration task failed: {err}")))?
}
