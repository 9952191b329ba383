//! Payment processing
//!
//! This module handles payment recording against invoices.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InvoiceId, Money, PatientId, PaymentId};

use crate::invoice::Invoice;
use crate::store::{Collection, Document};

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    /// Unified Payments Interface
    Upi,
    BankTransfer,
    Cheque,
    /// Settled by an insurer
    Insurance,
    /// An instalment of a payment plan
    PaymentPlan,
}

/// Payment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    /// Payment is being processed
    Pending,
    /// Payment completed successfully
    Completed,
    /// Payment failed
    Failed,
    /// Payment was refunded
    Refunded,
}

/// A payment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    /// `DRC-PMT-NNN`
    pub payment_number: String,
    /// Invoice being paid
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_date: DateTime<Utc>,
    /// External reference (UPI ref, card transaction id, cheque number)
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    /// Staff member who recorded the payment
    pub processed_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

impl Payment {
    /// Creates a completed payment for `invoice`
    ///
    /// The invoice side of the payment is applied separately by
    /// [`Invoice::apply_payment`]; both are committed in one batch.
    pub fn record(
        payment_number: String,
        invoice: &Invoice,
        request: PaymentRequest,
        processed_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new_v7(),
            payment_number,
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            patient_id: invoice.patient_id,
            patient_name: invoice.patient_name.clone(),
            amount: request.amount,
            method: request.method,
            status: PaymentStatus::Completed,
            payment_date: now,
            transaction_id: request.transaction_id.filter(|t| !t.trim().is_empty()),
            notes: request.notes,
            processed_by: processed_by.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for Payment {
    const COLLECTION: Collection = Collection::Payments;

    fn document_id(&self) -> Uuid {
        *self.id.as_uuid()
    }
}
