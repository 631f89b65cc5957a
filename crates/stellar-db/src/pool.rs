//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2.
//! It handles pool initialization, connection customization, and running
//! migrations.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::{DbError, Result};
use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Initialize a new database pool with the given file path.
///
/// This function will:
/// - Create the SQLite database file if it doesn't exist
/// - Set up connection pooling with r2d2
/// - Enable foreign key constraints and a busy timeout on all connections
/// - Run pending database migrations
///
/// # Arguments
///
/// * `db_path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(DbPool)` - Initialized connection pool
/// * `Err(DbError)` - If pool creation or migration fails
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        // The worker and request paths write from separate connections; the
        // busy timeout keeps a short write overlap from surfacing as an error.
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
    });

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| DbError::pool(format!("Failed to create connection pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| DbError::pool(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| DbError::database(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Initialize an in-memory database pool for testing.
///
/// This creates a connection pool backed by an in-memory SQLite database.
/// The database will be lost when the pool is dropped.
pub fn init_memory_pool() -> Result<DbPool> {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
    });

    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| DbError::pool(format!("Failed to create in-memory pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| DbError::pool(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| DbError::database(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool.
///
/// Convenience wrapper around `pool.get()` that converts the r2d2 error into
/// [`DbError`].
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| DbError::pool(format!("Failed to get connection from pool: {}", e)))
}
