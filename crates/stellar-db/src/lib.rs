//! Stellar-DB: Database schema, migrations, and query operations.
//!
//! This crate provides persistence for the stellar generation pipeline using
//! SQLite with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching the database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use stellar_db::pool::{init_pool, get_conn};
//! use stellar_db::queries::resources;
//! use stellar_common::ResourceKind;
//!
//! let pool = init_pool("/var/lib/stellar/stellar.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let resource = resources::create_resource(
//!     &conn,
//!     ResourceKind::PlanetImage,
//!     None,
//!     None,
//!     "a ringed gas giant over a frozen moon",
//! )
//! .unwrap();
//! println!("Created resource: {}", resource.id);
//! ```

pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

pub use error::{DbError, Result};
