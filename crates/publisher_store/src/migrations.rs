//! Embedded schema migrations, run by the facade binary at startup.

use diesel::pg::PgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use publisher_error::{StoreError, StoreErrorKind};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Apply any pending migrations to bring the schema up to date.
pub fn run_pending(conn: &mut PgConnection) -> Result<(), StoreError> {
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))
}
