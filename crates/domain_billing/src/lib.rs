//! Billing Domain - Quotation to payment workflow for the clinic
//!
//! This crate implements the clinic's billing workflow on top of a
//! document store:
//!
//! - **Service catalog**: billable services with HSN codes and GST slabs
//! - **Quotations**: price proposals that move Draft → Sent → Viewed →
//!   Accepted and convert into invoices
//! - **Invoices and payments**: balances that only move through recorded
//!   payments, committed together with the invoice
//! - **Insurance claims** raised against invoices
//! - **Number sequences**: `DRC-QUO-001`, `DRC-INV-001`, `DRC-PMT-001`,
//!   `DRC-CLM-001`
//!
//! # GST
//!
//! Intra-state supplies split the tax into CGST and SGST; inter-state
//! supplies carry it as IGST. Line amounts stay at full precision and
//! document totals are rounded once, when the document is built.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingEngine, BillingConfig, InMemoryDocumentStore, with_retry};
//!
//! let engine = BillingEngine::new(store, clock, BillingConfig::default())?;
//! let quotation = engine.create_quotation(&principal, request).await?;
//! engine.send_quotation(&principal, quotation.id).await?;
//! engine.accept_quotation(&principal, quotation.id).await?;
//!
//! let invoice = with_retry(engine.retry_policy(), "convert", || {
//!     engine.convert_quotation_to_invoice(&principal, quotation.id)
//! })
//! .await?;
//! ```

pub mod claim;
pub mod directory;
pub mod engine;
pub mod error;
pub mod invoice;
pub mod items;
pub mod memory;
pub mod payment;
pub mod quotation;
pub mod retry;
pub mod sequence;
pub mod service;
pub mod store;
pub mod summary;
pub mod tax;
pub mod workflow;

pub use claim::{ClaimRequest, ClaimStatus, ClaimType, InsuranceClaim};
pub use directory::{PatientDirectory, PatientRegistration};
pub use engine::{BillingConfig, BillingEngine};
pub use error::{BillingError, ErrorKind};
pub use invoice::{Invoice, InvoiceRequest, InvoiceStatus};
pub use items::{BillTotals, LineItem, LineItemRequest};
pub use memory::InMemoryDocumentStore;
pub use payment::{Payment, PaymentMethod, PaymentRequest, PaymentStatus};
pub use quotation::{Quotation, QuotationRequest, QuotationStatus};
pub use retry::with_retry;
pub use sequence::{
    format_document_number, parse_document_number, EntityType, NumberSequence,
    NumberSequenceGenerator,
};
pub use service::{NewService, Service, ServiceCategory, ServiceUpdate};
pub use store::{
    Collection, Document, DocumentQuery, DocumentStore, SortDirection, StoredDocument, Versioned,
    Write, WriteBatch,
};
pub use summary::{BillingSummary, GstReport, RateBreakdown};
pub use tax::{calculate_gst, GstBreakdown, GstRate};
pub use workflow::{ClaimFilter, InvoiceFilter, PaymentReceipt, QuotationFilter};
