//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the clinic billing engine, using SQLx.
//!
//! # Storage Model
//!
//! Aggregates (patients, services, quotations, invoices, payments, claims)
//! are JSONB documents keyed by `(collection, id)` with a version column for
//! optimistic concurrency. Document numbers come from `number_sequences`,
//! incremented with a single atomic upsert.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresDocumentStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/clinic")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresDocumentStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;

pub use adapters::PostgresDocumentStore;
pub use error::DatabaseError;
pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool};
