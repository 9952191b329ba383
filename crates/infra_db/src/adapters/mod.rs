//! Port Adapters
//!
//! PostgreSQL implementations of the domain ports.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresDocumentStore;
//!
//! let store = PostgresDocumentStore::new(pool);
//! let invoice = store.get(Collection::Invoices, id).await?;
//! ```

pub mod document_store;

pub use document_store::PostgresDocumentStore;
