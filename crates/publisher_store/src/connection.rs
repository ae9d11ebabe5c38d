//! Postgres connection pool construction.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use publisher_error::{StoreError, StoreErrorKind};

/// A pooled Postgres connection manager.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Build a connection pool from a `DATABASE_URL`-style connection string.
pub fn build_pool(database_url: &str) -> Result<PgPool, StoreError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .build(manager)
        .map_err(|e| StoreError::new(StoreErrorKind::Connection(e.to_string())))
}
