//! Invoice management
//!
//! Invoices are created directly from catalog items or by converting an
//! accepted quotation. The balance always equals total minus paid and never
//! goes negative.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InvoiceId, Money, PatientId, QuotationId};
use domain_access::DoctorId;

use crate::error::BillingError;
use crate::items::{BillTotals, LineItem, LineItemRequest};
use crate::payment::PaymentMethod;
use crate::quotation::Quotation;
use crate::store::{Collection, Document};
use crate::tax::GstBreakdown;

/// Invoice status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Invoice is being drafted
    Draft,
    /// Invoice has been sent to the patient
    Sent,
    /// Partial payment received
    PartiallyPaid,
    /// Fully paid
    Paid,
    /// Past due date with a balance outstanding
    Overdue,
    /// Cancelled/voided
    Cancelled,
}

impl InvoiceStatus {
    /// Statuses that accept payments
    pub fn is_payable(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid | InvoiceStatus::Overdue
        )
    }
}

/// An invoice for clinic services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Unique identifier
    pub id: InvoiceId,
    /// `DRC-INV-NNN`
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub doctor_id: DoctorId,
    pub doctor_name: Option<String>,
    /// Quotation this invoice was converted from
    pub quotation_id: Option<QuotationId>,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    #[serde(flatten)]
    pub gst: GstBreakdown,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub balance_amount: Money,
    pub status: InvoiceStatus,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub paid_date: Option<NaiveDate>,
    /// Method of the most recent payment
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a directly created invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub doctor_name: Option<String>,
    pub items: Vec<LineItemRequest>,
    pub is_inter_state: Option<bool>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

/// Resolved fields of an invoice about to be created
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub doctor_id: DoctorId,
    pub doctor_name: Option<String>,
    pub quotation_id: Option<QuotationId>,
    pub items: Vec<LineItem>,
    pub totals: BillTotals,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_by: String,
}

impl Invoice {
    /// Creates a draft invoice with nothing paid
    pub fn create(
        invoice_number: String,
        new: NewInvoice,
        now: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        if new.items.is_empty() {
            return Err(BillingError::validation("An invoice needs at least one item"));
        }
        if new.due_date < new.invoice_date {
            return Err(BillingError::validation("due_date cannot be before invoice_date"));
        }

        Ok(Self {
            id: InvoiceId::new_v7(),
            invoice_number,
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            doctor_id: new.doctor_id,
            doctor_name: new.doctor_name,
            quotation_id: new.quotation_id,
            items: new.items,
            subtotal: new.totals.subtotal,
            gst: new.totals.gst,
            total_amount: new.totals.total_amount,
            paid_amount: Money::zero(),
            balance_amount: new.totals.total_amount,
            status: InvoiceStatus::Draft,
            invoice_date: new.invoice_date,
            due_date: new.due_date,
            paid_date: None,
            payment_method: None,
            notes: new.notes,
            terms: new.terms,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Builds the invoice for an accepted quotation
    ///
    /// Patient, doctor, items and the tax breakdown are copied as issued on
    /// the quotation; nothing is re-priced from the catalog.
    pub fn from_quotation(
        invoice_number: String,
        quotation: &Quotation,
        due_days: i64,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        let invoice_date = now.date_naive();
        Self::create(
            invoice_number,
            NewInvoice {
                patient_id: quotation.patient_id,
                patient_name: quotation.patient_name.clone(),
                doctor_id: quotation.doctor_id.clone(),
                doctor_name: quotation.doctor_name.clone(),
                quotation_id: Some(quotation.id),
                items: quotation.items.clone(),
                totals: quotation.totals(),
                invoice_date,
                due_date: invoice_date + Duration::days(due_days),
                notes: quotation.notes.clone(),
                terms: quotation.terms.clone(),
                created_by: created_by.into(),
            },
            now,
        )
    }

    pub fn is_inter_state(&self) -> bool {
        self.gst.is_inter_state
    }

    pub fn send(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        if self.status != InvoiceStatus::Draft {
            return Err(BillingError::invalid_state("Invoice", self.status, "send"));
        }
        self.status = InvoiceStatus::Sent;
        self.updated_at = now;
        Ok(())
    }

    /// Records a payment against the invoice
    ///
    /// Paid and balance move by the same amount. Overpayment is rejected.
    pub fn apply_payment(
        &mut self,
        amount: Money,
        method: PaymentMethod,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if !self.status.is_payable() {
            return Err(BillingError::invalid_state("Invoice", self.status, "record payment on"));
        }
        if !amount.is_positive() {
            return Err(BillingError::validation("Payment amount must be positive"));
        }
        if amount.rounded() != amount {
            return Err(BillingError::validation(
                "Payment amount cannot have more than two decimal places",
            ));
        }
        if amount > self.balance_amount {
            return Err(BillingError::validation(format!(
                "Payment of {} exceeds the outstanding balance of {}",
                amount, self.balance_amount
            )));
        }

        self.paid_amount += amount;
        self.balance_amount -= amount;
        self.payment_method = Some(method);
        self.updated_at = now;

        if self.balance_amount.is_zero() {
            self.status = InvoiceStatus::Paid;
            self.paid_date = Some(now.date_naive());
        } else if self.paid_amount.is_positive() && self.paid_amount < self.total_amount {
            self.status = InvoiceStatus::PartiallyPaid;
        }
        Ok(())
    }

    /// Checks if invoice is overdue on `today`
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        matches!(self.status, InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid)
            && today > self.due_date
            && self.balance_amount.is_positive()
    }

    pub fn mark_overdue(
        &mut self,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if !self.is_overdue_on(today) {
            return Err(BillingError::invalid_state("Invoice", self.status, "mark overdue"));
        }
        self.status = InvoiceStatus::Overdue;
        self.updated_at = now;
        Ok(())
    }

    /// Voids the invoice; refused once any payment has been recorded
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        if matches!(self.status, InvoiceStatus::Paid | InvoiceStatus::Cancelled)
            || self.paid_amount.is_positive()
        {
            return Err(BillingError::invalid_state("Invoice", self.status, "cancel"));
        }
        self.status = InvoiceStatus::Cancelled;
        self.updated_at = now;
        Ok(())
    }
}

impl Document for Invoice {
    const COLLECTION: Collection = Collection::Invoices;

    fn document_id(&self) -> Uuid {
        *self.id.as_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::{calculate_gst, GstRate};
    use core_kernel::{QuotationItemId, ServiceId};
    use rust_decimal_macros::dec;

    fn invoice(total: Money) -> Invoice {
        let item = LineItem {
            id: QuotationItemId::new_v7(),
            service_id: ServiceId::new_v7(),
            service_name: "Prosthetic fitting".to_string(),
            description: "Prosthetic fitting".to_string(),
            quantity: 1,
            unit_price: total,
            hsn_code: "9021".to_string(),
            gst_rate: GstRate::Exempt,
            total,
            gst_amount: Money::zero(),
        };
        let today = Utc::now().date_naive();
        Invoice::create(
            "DRC-INV-001".to_string(),
            NewInvoice {
                patient_id: PatientId::new_v7(),
                patient_name: "Ravi".to_string(),
                doctor_id: DoctorId::new("dr-a"),
                doctor_name: None,
                quotation_id: None,
                items: vec![item],
                totals: BillTotals {
                    subtotal: total,
                    gst: calculate_gst(total, GstRate::Exempt, false),
                    total_amount: total,
                },
                invoice_date: today,
                due_date: today + Duration::days(30),
                notes: None,
                terms: None,
                created_by: "frontdesk".to_string(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_new_invoice_is_unpaid_draft() {
        let inv = invoice(Money::new(dec!(2006)));
        assert_eq!(inv.status, InvoiceStatus::Draft);
        assert!(inv.paid_amount.is_zero());
        assert_eq!(inv.balance_amount, inv.total_amount);
    }

    #[test]
    fn test_draft_invoice_rejects_payment() {
        let mut inv = invoice(Money::new(dec!(1000)));
        let err = inv
            .apply_payment(Money::new(dec!(100)), PaymentMethod::Cash, Utc::now())
            .unwrap_err();
        assert!(matches!(err, BillingError::InvalidState { .. }));
    }

    #[test]
    fn test_partial_then_full_payment() {
        let mut inv = invoice(Money::new(dec!(1000)));
        inv.send(Utc::now()).unwrap();

        inv.apply_payment(Money::new(dec!(400)), PaymentMethod::Upi, Utc::now())
            .unwrap();
        assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(inv.balance_amount, Money::new(dec!(600)));

        inv.apply_payment(Money::new(dec!(600)), PaymentMethod::Cash, Utc::now())
            .unwrap();
        assert_eq!(inv.status, InvoiceStatus::Paid);
        assert!(inv.balance_amount.is_zero());
        assert_eq!(inv.paid_amount + inv.balance_amount, inv.total_amount);
        assert!(inv.paid_date.is_some());
    }

    #[test]
    fn test_overpayment_rejected() {
        let mut inv = invoice(Money::new(dec!(500)));
        inv.send(Utc::now()).unwrap();
        let err = inv
            .apply_payment(Money::new(dec!(500.01)), PaymentMethod::Cash, Utc::now())
            .unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
        assert_eq!(inv.balance_amount, Money::new(dec!(500)));
    }

    #[test]
    fn test_overdue_detection() {
        let mut inv = invoice(Money::new(dec!(500)));
        let after_due = inv.due_date + Duration::days(1);
        assert!(!inv.is_overdue_on(after_due));

        inv.send(Utc::now()).unwrap();
        assert!(!inv.is_overdue_on(inv.due_date));
        assert!(inv.is_overdue_on(after_due));
        inv.mark_overdue(after_due, Utc::now()).unwrap();
        assert_eq!(inv.status, InvoiceStatus::Overdue);

        // Payments are still accepted once overdue
        inv.apply_payment(Money::new(dec!(100)), PaymentMethod::Cheque, Utc::now())
            .unwrap();
        assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
    }

    #[test]
    fn test_cancel_refused_after_payment() {
        let mut inv = invoice(Money::new(dec!(500)));
        inv.send(Utc::now()).unwrap();
        inv.apply_payment(Money::new(dec!(100)), PaymentMethod::Cash, Utc::now())
            .unwrap();
        assert!(inv.cancel(Utc::now()).is_err());

        let mut unpaid = invoice(Money::new(dec!(500)));
        unpaid.cancel(Utc::now()).unwrap();
        assert_eq!(unpaid.status, InvoiceStatus::Cancelled);
        assert!(unpaid.cancel(Utc::now()).is_err());
    }
}
