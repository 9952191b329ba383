//! Quotation aggregate
//!
//! ```text
//! Draft ──send──▶ Sent ──view──▶ Viewed
//!                  │  ╲            │  ╲
//!               accept reject   accept reject
//!                  ▼     ▼         ▼     ▼
//!               Accepted  Rejected
//!                  │
//!               convert ──▶ Converted
//!
//! Sent, Viewed, Accepted ──(now > valid_until)──▶ Expired
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InvoiceId, Money, PatientId, QuotationId};
use domain_access::DoctorId;

use crate::error::BillingError;
use crate::items::{BillTotals, LineItem, LineItemRequest};
use crate::store::{Collection, Document};
use crate::tax::GstBreakdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuotationStatus {
    Draft,
    Sent,
    Viewed,
    Accepted,
    Rejected,
    Expired,
    Converted,
}

impl QuotationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QuotationStatus::Rejected | QuotationStatus::Expired | QuotationStatus::Converted
        )
    }

    /// Statuses an expiry sweep looks at
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            QuotationStatus::Sent | QuotationStatus::Viewed | QuotationStatus::Accepted
        )
    }

    pub fn can_transition_to(&self, target: QuotationStatus) -> bool {
        use QuotationStatus::*;
        matches!(
            (self, target),
            (Draft, Sent)
                | (Sent, Viewed)
                | (Sent, Accepted)
                | (Viewed, Accepted)
                | (Sent, Rejected)
                | (Viewed, Rejected)
                | (Sent, Expired)
                | (Viewed, Expired)
                | (Accepted, Expired)
                | (Accepted, Converted)
        )
    }
}

/// A price proposal for a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quotation {
    pub id: QuotationId,
    /// `DRC-QUO-NNN`
    pub quotation_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub doctor_id: DoctorId,
    pub doctor_name: Option<String>,
    pub items: Vec<LineItem>,
    pub subtotal: Money,
    #[serde(flatten)]
    pub gst: GstBreakdown,
    pub total_amount: Money,
    pub status: QuotationStatus,
    pub created_date: DateTime<Utc>,
    pub sent_date: Option<DateTime<Utc>>,
    pub viewed_date: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
    pub accepted_date: Option<DateTime<Utc>>,
    pub rejected_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub converted_to_invoice_id: Option<InvoiceId>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new quotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotationRequest {
    pub patient_id: PatientId,
    /// Required unless the caller is a doctor quoting for themselves
    pub doctor_id: Option<DoctorId>,
    pub doctor_name: Option<String>,
    pub items: Vec<LineItemRequest>,
    pub is_inter_state: Option<bool>,
    pub valid_until: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

/// Resolved fields of a quotation about to be created
#[derive(Debug, Clone)]
pub struct NewQuotation {
    pub patient_id: PatientId,
    pub patient_name: String,
    pub doctor_id: DoctorId,
    pub doctor_name: Option<String>,
    pub items: Vec<LineItem>,
    pub is_inter_state: bool,
    pub valid_until: DateTime<Utc>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_by: String,
}

impl Quotation {
    pub fn create(
        quotation_number: String,
        new: NewQuotation,
        now: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        if new.items.is_empty() {
            return Err(BillingError::validation("A quotation needs at least one item"));
        }
        if new.valid_until <= now {
            return Err(BillingError::validation("valid_until must be in the future"));
        }

        let totals = BillTotals::compute(&new.items, new.is_inter_state);
        Ok(Self {
            id: QuotationId::new_v7(),
            quotation_number,
            patient_id: new.patient_id,
            patient_name: new.patient_name,
            doctor_id: new.doctor_id,
            doctor_name: new.doctor_name,
            items: new.items,
            subtotal: totals.subtotal,
            gst: totals.gst,
            total_amount: totals.total_amount,
            status: QuotationStatus::Draft,
            created_date: now,
            sent_date: None,
            viewed_date: None,
            valid_until: new.valid_until,
            accepted_date: None,
            rejected_date: None,
            rejection_reason: None,
            converted_to_invoice_id: None,
            notes: new.notes,
            terms: new.terms,
            created_by: new.created_by,
            updated_at: now,
        })
    }

    pub fn is_inter_state(&self) -> bool {
        self.gst.is_inter_state
    }

    pub fn totals(&self) -> BillTotals {
        BillTotals {
            subtotal: self.subtotal,
            gst: self.gst,
            total_amount: self.total_amount,
        }
    }

    /// Replaces the items and recomputes totals; only while in Draft
    pub fn replace_items(
        &mut self,
        items: Vec<LineItem>,
        is_inter_state: Option<bool>,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if self.status != QuotationStatus::Draft {
            return Err(BillingError::invalid_state("Quotation", self.status, "edit"));
        }
        if items.is_empty() {
            return Err(BillingError::validation("A quotation needs at least one item"));
        }

        let totals = BillTotals::compute(&items, is_inter_state.unwrap_or(self.is_inter_state()));
        self.items = items;
        self.subtotal = totals.subtotal;
        self.gst = totals.gst;
        self.total_amount = totals.total_amount;
        self.updated_at = now;
        Ok(())
    }

    pub fn send(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.transition(QuotationStatus::Sent, "send", now)?;
        self.sent_date = Some(now);
        Ok(())
    }

    pub fn mark_viewed(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.transition(QuotationStatus::Viewed, "mark viewed", now)?;
        self.viewed_date = Some(now);
        Ok(())
    }

    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        if self.is_past_validity(now) {
            return Err(BillingError::invalid_state(
                "Quotation",
                QuotationStatus::Expired,
                "accept",
            ));
        }
        self.transition(QuotationStatus::Accepted, "accept", now)?;
        self.accepted_date = Some(now);
        Ok(())
    }

    pub fn reject(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        self.transition(QuotationStatus::Rejected, "reject", now)?;
        self.rejected_date = Some(now);
        self.rejection_reason = reason;
        Ok(())
    }

    pub fn is_past_validity(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    /// Whether an expiry sweep at `now` should expire this quotation
    pub fn is_due_for_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && self.is_past_validity(now)
    }

    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        if !self.is_past_validity(now) {
            return Err(BillingError::invalid_state("Quotation", self.status, "expire"));
        }
        self.transition(QuotationStatus::Expired, "expire", now)
    }

    /// Records the conversion; only an Accepted quotation converts
    pub fn mark_converted(
        &mut self,
        invoice_id: InvoiceId,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        self.transition(QuotationStatus::Converted, "convert", now)?;
        self.converted_to_invoice_id = Some(invoice_id);
        Ok(())
    }

    fn transition(
        &mut self,
        target: QuotationStatus,
        action: &str,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if !self.status.can_transition_to(target) {
            return Err(BillingError::invalid_state("Quotation", self.status, action));
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}

impl Document for Quotation {
    const COLLECTION: Collection = Collection::Quotations;

    fn document_id(&self) -> Uuid {
        *self.id.as_uuid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{NewService, Service, ServiceCategory};
    use crate::tax::GstRate;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn quotation(now: DateTime<Utc>) -> Quotation {
        let service = Service::create(
            NewService {
                name: "Consultation".to_string(),
                category: ServiceCategory::Consultation,
                price: Money::new(dec!(800)),
                hsn_code: "9993".to_string(),
                gst_rate: GstRate::Exempt,
                description: None,
                doctor_id: None,
            },
            now,
        )
        .unwrap();
        let item = LineItem::from_service(
            &service,
            &LineItemRequest {
                service_id: service.id,
                quantity: 1,
                description: None,
            },
        )
        .unwrap();

        Quotation::create(
            "DRC-QUO-001".to_string(),
            NewQuotation {
                patient_id: PatientId::new_v7(),
                patient_name: "Asha".to_string(),
                doctor_id: DoctorId::new("dr-a"),
                doctor_name: None,
                items: vec![item],
                is_inter_state: false,
                valid_until: now + Duration::days(30),
                notes: None,
                terms: None,
                created_by: "frontdesk".to_string(),
            },
            now,
        )
        .unwrap()
    }

    #[test]
    fn test_happy_path_to_converted() {
        let now = Utc::now();
        let mut q = quotation(now);
        q.send(now).unwrap();
        q.mark_viewed(now).unwrap();
        q.accept(now).unwrap();

        let invoice_id = InvoiceId::new_v7();
        q.mark_converted(invoice_id, now).unwrap();
        assert_eq!(q.status, QuotationStatus::Converted);
        assert_eq!(q.converted_to_invoice_id, Some(invoice_id));
        assert!(q.status.is_terminal());
    }

    #[test]
    fn test_edit_only_in_draft() {
        let now = Utc::now();
        let mut q = quotation(now);
        let items = q.items.clone();
        assert!(q.replace_items(items.clone(), None, now).is_ok());

        q.send(now).unwrap();
        assert!(matches!(
            q.replace_items(items, None, now),
            Err(BillingError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_convert_requires_accepted() {
        let now = Utc::now();
        let mut q = quotation(now);
        assert!(q.mark_converted(InvoiceId::new_v7(), now).is_err());
        assert_eq!(q.status, QuotationStatus::Draft);
    }

    #[test]
    fn test_accept_after_validity_fails() {
        let now = Utc::now();
        let mut q = quotation(now);
        q.send(now).unwrap();
        let later = now + Duration::days(31);
        assert!(matches!(q.accept(later), Err(BillingError::InvalidState { .. })));
        assert!(q.is_due_for_expiry(later));
        q.expire(later).unwrap();
        assert_eq!(q.status, QuotationStatus::Expired);
    }

    #[test]
    fn test_draft_never_expires() {
        let now = Utc::now();
        let q = quotation(now);
        assert!(!q.is_due_for_expiry(now + Duration::days(60)));
    }

    #[test]
    fn test_rejected_is_terminal() {
        let now = Utc::now();
        let mut q = quotation(now);
        q.send(now).unwrap();
        q.reject(Some("Too expensive".to_string()), now).unwrap();
        assert!(q.accept(now).is_err());
        assert_eq!(q.rejection_reason.as_deref(), Some("Too expensive"));
    }

    #[test]
    fn test_document_round_trips_flattened_gst() {
        let q = quotation(Utc::now());
        let json = serde_json::to_value(&q).unwrap();
        assert!(json.get("cgst").is_some());
        assert!(json.get("total_gst").is_some());
        let back: Quotation = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }
}
