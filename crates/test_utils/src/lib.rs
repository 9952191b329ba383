//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! clinic test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built principals, instants and amounts
//! - `builders`: Builders for catalog entries and a ready-to-use billing harness
//! - `assertions`: Custom assertion helpers for billing types
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
