//! Insurance claim aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{InsuranceClaimId, InvoiceId, Money, PatientId};

use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceStatus};
use crate::store::{Collection, Document};

/// Claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// Prepared, not yet sent to the insurer
    Draft,
    /// Sent to the insurer
    Submitted,
    /// Insurer asked for more information
    Pending,
    /// Under review/adjudication
    UnderReview,
    /// Approved for payment
    Approved,
    /// Denied
    Rejected,
    /// Insurer has paid out
    Paid,
}

impl ClaimStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClaimStatus::Rejected | ClaimStatus::Paid)
    }

    pub fn can_transition_to(&self, target: ClaimStatus) -> bool {
        use ClaimStatus::*;
        matches!(
            (self, target),
            (Draft, Submitted)
                | (Submitted, Pending)
                | (Submitted, UnderReview)
                | (Pending, UnderReview)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
                | (Approved, Paid)
        )
    }
}

/// Kind of treatment claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimType {
    Medical,
    Dental,
    Vision,
    Prosthetic,
    Physiotherapy,
}

/// A claim raised with a patient's insurer against an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceClaim {
    /// Unique identifier
    pub id: InsuranceClaimId,
    /// `DRC-CLM-NNN`
    pub claim_number: String,
    pub invoice_id: InvoiceId,
    pub invoice_number: String,
    pub patient_id: PatientId,
    pub patient_name: String,
    /// Insurance provider name
    pub provider: String,
    pub policy_number: String,
    pub claim_type: ClaimType,
    pub submitted_amount: Money,
    pub approved_amount: Option<Money>,
    pub status: ClaimStatus,
    pub submitted_date: Option<DateTime<Utc>>,
    pub review_date: Option<DateTime<Utc>>,
    pub approved_date: Option<DateTime<Utc>>,
    pub rejected_date: Option<DateTime<Utc>>,
    pub paid_date: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub invoice_id: InvoiceId,
    pub provider: String,
    pub policy_number: String,
    pub claim_type: ClaimType,
    pub submitted_amount: Money,
    pub notes: Option<String>,
}

impl InsuranceClaim {
    /// Drafts a claim against `invoice`
    pub fn draft(
        claim_number: String,
        invoice: &Invoice,
        request: ClaimRequest,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, BillingError> {
        if invoice.status == InvoiceStatus::Cancelled {
            return Err(BillingError::invalid_state("Invoice", invoice.status, "claim against"));
        }
        if request.provider.trim().is_empty() {
            return Err(BillingError::validation("Insurance provider is required"));
        }
        if request.policy_number.trim().is_empty() {
            return Err(BillingError::validation("Policy number is required"));
        }
        if !request.submitted_amount.is_positive() {
            return Err(BillingError::validation("Submitted amount must be positive"));
        }
        if request.submitted_amount > invoice.total_amount {
            return Err(BillingError::validation(format!(
                "Submitted amount {} exceeds invoice total {}",
                request.submitted_amount, invoice.total_amount
            )));
        }

        Ok(Self {
            id: InsuranceClaimId::new_v7(),
            claim_number,
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number.clone(),
            patient_id: invoice.patient_id,
            patient_name: invoice.patient_name.clone(),
            provider: request.provider.trim().to_string(),
            policy_number: request.policy_number.trim().to_string(),
            claim_type: request.claim_type,
            submitted_amount: request.submitted_amount,
            approved_amount: None,
            status: ClaimStatus::Draft,
            submitted_date: None,
            review_date: None,
            approved_date: None,
            rejected_date: None,
            paid_date: None,
            rejection_reason: None,
            notes: request.notes,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.update_status(ClaimStatus::Submitted, now)?;
        self.submitted_date = Some(now);
        Ok(())
    }

    /// Puts a submitted claim on hold awaiting information
    pub fn hold(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.update_status(ClaimStatus::Pending, now)
    }

    pub fn start_review(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.update_status(ClaimStatus::UnderReview, now)?;
        self.review_date = Some(now);
        Ok(())
    }

    pub fn approve(
        &mut self,
        approved_amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if !approved_amount.is_positive() {
            return Err(BillingError::validation("Approved amount must be positive"));
        }
        if approved_amount > self.submitted_amount {
            return Err(BillingError::validation(format!(
                "Approved amount {} exceeds submitted amount {}",
                approved_amount, self.submitted_amount
            )));
        }
        self.update_status(ClaimStatus::Approved, now)?;
        self.approved_amount = Some(approved_amount);
        self.approved_date = Some(now);
        Ok(())
    }

    pub fn reject(
        &mut self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        self.update_status(ClaimStatus::Rejected, now)?;
        self.rejection_reason = reason;
        self.rejected_date = Some(now);
        Ok(())
    }

    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> Result<(), BillingError> {
        self.update_status(ClaimStatus::Paid, now)?;
        self.paid_date = Some(now);
        Ok(())
    }

    /// Ordering key for listings: submission time, else creation time
    pub fn listed_at(&self) -> DateTime<Utc> {
        self.submitted_date.unwrap_or(self.created_at)
    }

    fn update_status(
        &mut self,
        status: ClaimStatus,
        now: DateTime<Utc>,
    ) -> Result<(), BillingError> {
        if !self.status.can_transition_to(status) {
            return Err(BillingError::invalid_state(
                "InsuranceClaim",
                self.status,
                format!("move to {:?}", status),
            ));
        }
        self.status = status;
        self.updated_at = now;
        Ok(())
    }
}

impl Document for InsuranceClaim {
    const COLLECTION: Collection = Collection::InsuranceClaims;

    fn document_id(&self) -> Uuid {
        *self.id.as_uuid()
    }
}
