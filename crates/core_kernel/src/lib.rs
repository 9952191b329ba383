//! Core Kernel - Foundational types and utilities for the clinic system
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Money with precise, single-currency decimal arithmetic
//! - Strongly-typed identifiers
//! - An injectable clock
//! - Port primitives shared by the persistence adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use money::Money;
pub use temporal::{Clock, SystemClock, FixedClock};
pub use identifiers::{
    PatientId, AppointmentId, PrescriptionId, CertificateId,
    ServiceId, QuotationId, QuotationItemId, InvoiceId, PaymentId, InsuranceClaimId,
    AuditEventId,
};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth, RetryPolicy,
};
