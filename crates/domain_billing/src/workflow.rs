//! Quotation, invoice, payment and claim operations of the [`BillingEngine`]

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{InsuranceClaimId, InvoiceId, Money, PatientId, QuotationId};
use domain_access::{AccessFilter, DoctorId, Principal, Role};

use crate::claim::{ClaimRequest, ClaimStatus, InsuranceClaim};
use crate::directory::visible_patient;
use crate::engine::{BillingEngine, BILLING_CLERKS, QUOTATION_ROLES};
use crate::error::BillingError;
use crate::invoice::{Invoice, InvoiceRequest, InvoiceStatus, NewInvoice};
use crate::items::{BillTotals, LineItemRequest};
use crate::payment::{Payment, PaymentRequest};
use crate::quotation::{NewQuotation, Quotation, QuotationRequest, QuotationStatus};
use crate::sequence::EntityType;
use crate::store::{DocumentQuery, SortDirection, Versioned, WriteBatch};

/// Optional equality filters for quotation listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuotationFilter {
    pub status: Option<QuotationStatus>,
    pub patient_id: Option<PatientId>,
    pub doctor_id: Option<DoctorId>,
}

/// Optional equality filters for invoice listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub patient_id: Option<PatientId>,
    pub doctor_id: Option<DoctorId>,
}

/// Optional equality filters for claim listings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub invoice_id: Option<InvoiceId>,
}

/// A recorded payment and the invoice it was applied to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub invoice: Invoice,
}

impl BillingEngine {
    // ---- quotations ----

    #[instrument(
        skip(self, principal, request),
        fields(role = %principal.role, patient_id = %request.patient_id)
    )]
    pub async fn create_quotation(
        &self,
        principal: &Principal,
        request: QuotationRequest,
    ) -> Result<Quotation, BillingError> {
        self.require_role(principal, &QUOTATION_ROLES, "create quotations")?;
        let doctor_id = match (request.doctor_id, principal.scoped_doctor()) {
            (Some(doctor_id), _) if !doctor_id.is_blank() => doctor_id,
            (_, Some(own)) if principal.role == Role::Doctor => own.clone(),
            _ => return Err(BillingError::validation("doctor_id is required")),
        };
        self.require_owner(principal, &doctor_id, "Doctor", &doctor_id)?;

        let patient = visible_patient(self.store.as_ref(), principal, request.patient_id).await?;
        let items = self.resolve_items(principal, &request.items).await?;
        let now = self.now();

        let mut quotation = Quotation::create(
            String::new(),
            NewQuotation {
                patient_id: patient.id,
                patient_name: patient.name,
                doctor_id,
                doctor_name: request.doctor_name,
                items,
                is_inter_state: request.is_inter_state.unwrap_or(self.config.inter_state_default),
                valid_until: request
                    .valid_until
                    .unwrap_or(now + Duration::days(self.config.quotation_validity_days)),
                notes: request.notes,
                terms: request.terms,
                created_by: principal.id.clone(),
            },
            now,
        )?;
        quotation.quotation_number = self.sequences.next_number(EntityType::Quotation).await?;

        self.store.commit(WriteBatch::new().insert(&quotation)?).await?;
        info!(
            quotation_id = %quotation.id,
            quotation_number = %quotation.quotation_number,
            total = %quotation.total_amount,
            "Created quotation"
        );
        Ok(quotation)
    }

    /// Replaces the items of a draft quotation
    #[instrument(skip(self, principal, items), fields(role = %principal.role, quotation_id = %id))]
    pub async fn update_quotation_items(
        &self,
        principal: &Principal,
        id: QuotationId,
        items: Vec<LineItemRequest>,
        is_inter_state: Option<bool>,
    ) -> Result<Quotation, BillingError> {
        self.require_role(principal, &QUOTATION_ROLES, "edit quotations")?;
        let Versioned { value: mut quotation, version } = self.load_quotation(principal, id).await?;
        if quotation.status != QuotationStatus::Draft {
            warn!(status = ?quotation.status, "Refusing to edit a sent quotation");
            return Err(BillingError::invalid_state("Quotation", quotation.status, "edit"));
        }
        let items = self.resolve_items(principal, &items).await?;
        quotation.replace_items(items, is_inter_state, self.now())?;
        self.save(&quotation, version).await?;
        info!(total = %quotation.total_amount, "Updated quotation items");
        Ok(quotation)
    }

    pub async fn send_quotation(
        &self,
        principal: &Principal,
        id: QuotationId,
    ) -> Result<Quotation, BillingError> {
        self.transition_quotation(principal, id, "send", |q, now| q.send(now)).await
    }

    pub async fn mark_quotation_viewed(
        &self,
        principal: &Principal,
        id: QuotationId,
    ) -> Result<Quotation, BillingError> {
        self.transition_quotation(principal, id, "mark viewed", |q, now| q.mark_viewed(now))
            .await
    }

    pub async fn accept_quotation(
        &self,
        principal: &Principal,
        id: QuotationId,
    ) -> Result<Quotation, BillingError> {
        self.transition_quotation(principal, id, "accept", |q, now| q.accept(now)).await
    }

    pub async fn reject_quotation(
        &self,
        principal: &Principal,
        id: QuotationId,
        reason: Option<String>,
    ) -> Result<Quotation, BillingError> {
        self.transition_quotation(principal, id, "reject", move |q, now| q.reject(reason, now))
            .await
    }

    /// Expires every open quotation past its validity
    ///
    /// Each quotation is written on its own; one that changed underneath the
    /// sweep is skipped and picked up by the next run.
    #[instrument(skip(self, principal), fields(role = %principal.role))]
    pub async fn expire_quotations(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Quotation>, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "expire quotations")?;
        let now = self.now();
        let mut expired = Vec::new();

        let all = DocumentQuery::of::<Quotation>();
        for Versioned { value: mut quotation, version } in
            crate::store::fetch_all::<Quotation>(self.store.as_ref(), &all).await?
        {
            if !quotation.is_due_for_expiry(now) {
                continue;
            }
            quotation.expire(now)?;
            match self.save(&quotation, version).await {
                Ok(()) => expired.push(quotation),
                Err(BillingError::ConcurrencyConflict(reason)) => {
                    warn!(
                        quotation_id = %quotation.id,
                        %reason,
                        "Skipping quotation changed during sweep"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        info!(count = expired.len(), "Expired quotations");
        Ok(expired)
    }

    /// Converts an accepted quotation into a draft invoice
    ///
    /// The new invoice and the quotation's Converted status are committed in
    /// one batch; the quotation update is version checked, so a quotation can
    /// be converted at most once.
    #[instrument(skip(self, principal), fields(role = %principal.role, quotation_id = %id))]
    pub async fn convert_quotation_to_invoice(
        &self,
        principal: &Principal,
        id: QuotationId,
    ) -> Result<Invoice, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "convert quotations")?;
        let Versioned { value: mut quotation, version } = self.load_quotation(principal, id).await?;
        if quotation.status != QuotationStatus::Accepted {
            warn!(status = ?quotation.status, "Refusing to convert quotation");
            return Err(BillingError::invalid_state("Quotation", quotation.status, "convert"));
        }

        let now = self.now();
        let mut invoice = Invoice::from_quotation(
            String::new(),
            &quotation,
            self.config.invoice_due_days,
            principal.id.clone(),
            now,
        )?;
        quotation.mark_converted(invoice.id, now)?;
        invoice.invoice_number = self.sequences.next_number(EntityType::Invoice).await?;

        let batch = WriteBatch::new()
            .insert(&invoice)?
            .update(&quotation, version)?;
        self.store.commit(batch).await?;

        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            quotation_number = %quotation.quotation_number,
            "Converted quotation to invoice"
        );
        Ok(invoice)
    }

    pub async fn get_quotation(
        &self,
        principal: &Principal,
        id: QuotationId,
    ) -> Result<Quotation, BillingError> {
        self.require_role(principal, &QUOTATION_ROLES, "view quotations")?;
        Ok(self.load_quotation(principal, id).await?.value)
    }

    /// Quotations visible to the principal, newest first
    pub async fn list_quotations(
        &self,
        principal: &Principal,
        filter: QuotationFilter,
    ) -> Result<Vec<Quotation>, BillingError> {
        self.require_role(principal, &QUOTATION_ROLES, "view quotations")?;
        let mut query = DocumentQuery::of::<Quotation>()
            .order_by("created_date", SortDirection::Descending);
        if let Some(status) = filter.status {
            query = query.where_eq("status", status);
        }
        if let Some(patient_id) = filter.patient_id {
            query = query.where_eq("patient_id", patient_id);
        }
        if let Some(doctor_id) = filter.doctor_id {
            query = query.where_eq("doctor_id", doctor_id);
        }
        let access = AccessFilter::new(principal);
        Ok(self
            .load_all::<Quotation>(&query)
            .await?
            .into_iter()
            .filter(|quotation| access.owns_doctor_document(&quotation.doctor_id))
            .collect())
    }

    async fn load_quotation(
        &self,
        principal: &Principal,
        id: QuotationId,
    ) -> Result<Versioned<Quotation>, BillingError> {
        let versioned = self.load::<Quotation>("Quotation", *id.as_uuid()).await?;
        self.require_owner(principal, &versioned.value.doctor_id, "Quotation", id)?;
        Ok(versioned)
    }

    #[instrument(skip(self, principal, change), fields(role = %principal.role, quotation_id = %id))]
    async fn transition_quotation<F>(
        &self,
        principal: &Principal,
        id: QuotationId,
        action: &str,
        change: F,
    ) -> Result<Quotation, BillingError>
    where
        F: FnOnce(&mut Quotation, DateTime<Utc>) -> Result<(), BillingError>,
    {
        self.require_role(principal, &QUOTATION_ROLES, action)?;
        let Versioned { value: mut quotation, version } = self.load_quotation(principal, id).await?;
        let from = quotation.status;
        if let Err(err) = change(&mut quotation, self.now()) {
            warn!(status = ?from, action, error = %err, "Quotation transition rejected");
            return Err(err);
        }
        self.save(&quotation, version).await?;
        info!(from = ?from, to = ?quotation.status, "Quotation status changed");
        Ok(quotation)
    }

    // ---- invoices ----

    /// Creates a draft invoice straight from catalog items
    #[instrument(
        skip(self, principal, request),
        fields(role = %principal.role, patient_id = %request.patient_id)
    )]
    pub async fn create_invoice(
        &self,
        principal: &Principal,
        request: InvoiceRequest,
    ) -> Result<Invoice, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "create invoices")?;
        if request.doctor_id.is_blank() {
            return Err(BillingError::validation("doctor_id is required"));
        }
        let patient = visible_patient(self.store.as_ref(), principal, request.patient_id).await?;
        let items = self.resolve_items(principal, &request.items).await?;
        let is_inter_state = request.is_inter_state.unwrap_or(self.config.inter_state_default);
        let now = self.now();
        let invoice_date = request.invoice_date.unwrap_or_else(|| now.date_naive());

        let mut invoice = Invoice::create(
            String::new(),
            NewInvoice {
                patient_id: patient.id,
                patient_name: patient.name,
                doctor_id: request.doctor_id,
                doctor_name: request.doctor_name,
                quotation_id: None,
                totals: BillTotals::compute(&items, is_inter_state),
                items,
                invoice_date,
                due_date: request
                    .due_date
                    .unwrap_or(invoice_date + Duration::days(self.config.invoice_due_days)),
                notes: request.notes,
                terms: request.terms,
                created_by: principal.id.clone(),
            },
            now,
        )?;
        invoice.invoice_number = self.sequences.next_number(EntityType::Invoice).await?;

        self.store.commit(WriteBatch::new().insert(&invoice)?).await?;
        info!(
            invoice_id = %invoice.id,
            invoice_number = %invoice.invoice_number,
            total = %invoice.total_amount,
            "Created invoice"
        );
        Ok(invoice)
    }

    pub async fn send_invoice(
        &self,
        principal: &Principal,
        id: InvoiceId,
    ) -> Result<Invoice, BillingError> {
        self.transition_invoice(principal, id, "send", |invoice, now| invoice.send(now))
            .await
    }

    /// Voids an invoice that has no payments against it
    pub async fn cancel_invoice(
        &self,
        principal: &Principal,
        id: InvoiceId,
    ) -> Result<Invoice, BillingError> {
        self.transition_invoice(principal, id, "cancel", |invoice, now| invoice.cancel(now))
            .await
    }

    /// Marks every sent invoice past its due date with a balance as Overdue
    #[instrument(skip(self, principal), fields(role = %principal.role))]
    pub async fn mark_overdue_invoices(
        &self,
        principal: &Principal,
    ) -> Result<Vec<Invoice>, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "mark invoices overdue")?;
        let now = self.now();
        let today = now.date_naive();
        let mut overdue = Vec::new();

        let all = DocumentQuery::of::<Invoice>();
        for Versioned { value: mut invoice, version } in
            crate::store::fetch_all::<Invoice>(self.store.as_ref(), &all).await?
        {
            if !invoice.is_overdue_on(today) {
                continue;
            }
            invoice.mark_overdue(today, now)?;
            match self.save(&invoice, version).await {
                Ok(()) => overdue.push(invoice),
                Err(BillingError::ConcurrencyConflict(reason)) => {
                    warn!(
                        invoice_id = %invoice.id,
                        %reason,
                        "Skipping invoice changed during sweep"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        info!(count = overdue.len(), "Marked invoices overdue");
        Ok(overdue)
    }

    pub async fn get_invoice(
        &self,
        principal: &Principal,
        id: InvoiceId,
    ) -> Result<Invoice, BillingError> {
        self.require_staff(principal, "view invoices")?;
        Ok(self.load_invoice(principal, id).await?.value)
    }

    /// Invoices visible to the principal, newest first
    pub async fn list_invoices(
        &self,
        principal: &Principal,
        filter: InvoiceFilter,
    ) -> Result<Vec<Invoice>, BillingError> {
        self.require_staff(principal, "view invoices")?;
        let mut query = DocumentQuery::of::<Invoice>()
            .order_by("created_at", SortDirection::Descending);
        if let Some(status) = filter.status {
            query = query.where_eq("status", status);
        }
        if let Some(patient_id) = filter.patient_id {
            query = query.where_eq("patient_id", patient_id);
        }
        if let Some(doctor_id) = filter.doctor_id {
            query = query.where_eq("doctor_id", doctor_id);
        }
        let access = AccessFilter::new(principal);
        Ok(self
            .load_all::<Invoice>(&query)
            .await?
            .into_iter()
            .filter(|invoice| access.owns_doctor_document(&invoice.doctor_id))
            .collect())
    }

    async fn load_invoice(
        &self,
        principal: &Principal,
        id: InvoiceId,
    ) -> Result<Versioned<Invoice>, BillingError> {
        let versioned = self.load::<Invoice>("Invoice", *id.as_uuid()).await?;
        self.require_owner(principal, &versioned.value.doctor_id, "Invoice", id)?;
        Ok(versioned)
    }

    #[instrument(skip(self, principal, change), fields(role = %principal.role, invoice_id = %id))]
    async fn transition_invoice<F>(
        &self,
        principal: &Principal,
        id: InvoiceId,
        action: &str,
        change: F,
    ) -> Result<Invoice, BillingError>
    where
        F: FnOnce(&mut Invoice, DateTime<Utc>) -> Result<(), BillingError>,
    {
        self.require_role(principal, &BILLING_CLERKS, action)?;
        let Versioned { value: mut invoice, version } = self.load_invoice(principal, id).await?;
        let from = invoice.status;
        if let Err(err) = change(&mut invoice, self.now()) {
            warn!(status = ?from, action, error = %err, "Invoice transition rejected");
            return Err(err);
        }
        self.save(&invoice, version).await?;
        info!(from = ?from, to = ?invoice.status, "Invoice status changed");
        Ok(invoice)
    }

    // ---- payments ----

    /// Records a payment and applies it to its invoice in one batch
    ///
    /// The invoice update is checked against the version it was read at.
    /// Two payments racing on the same invoice cannot both commit; the loser
    /// fails with [`BillingError::ConcurrencyConflict`] and may be retried.
    #[instrument(
        skip(self, principal, request),
        fields(role = %principal.role, invoice_id = %request.invoice_id, amount = %request.amount)
    )]
    pub async fn record_payment(
        &self,
        principal: &Principal,
        request: PaymentRequest,
    ) -> Result<PaymentReceipt, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "record payments")?;
        let Versioned { value: mut invoice, version } =
            self.load_invoice(principal, request.invoice_id).await?;
        let now = self.now();

        if let Err(err) = invoice.apply_payment(request.amount, request.method, now) {
            warn!(
                status = ?invoice.status,
                balance = %invoice.balance_amount,
                error = %err,
                "Payment rejected"
            );
            return Err(err);
        }
        let mut payment = Payment::record(
            String::new(),
            &invoice,
            request,
            principal.id.clone(),
            now,
        );
        payment.payment_number = self.sequences.next_number(EntityType::Payment).await?;

        let batch = WriteBatch::new()
            .insert(&payment)?
            .update(&invoice, version)?;
        self.store.commit(batch).await?;

        info!(
            payment_number = %payment.payment_number,
            invoice_number = %invoice.invoice_number,
            balance = %invoice.balance_amount,
            status = ?invoice.status,
            "Recorded payment"
        );
        Ok(PaymentReceipt { payment, invoice })
    }

    /// Payments, newest first, optionally for one invoice
    pub async fn list_payments(
        &self,
        principal: &Principal,
        invoice_id: Option<InvoiceId>,
    ) -> Result<Vec<Payment>, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "view payments")?;
        let mut query = DocumentQuery::of::<Payment>()
            .order_by("payment_date", SortDirection::Descending);
        if let Some(invoice_id) = invoice_id {
            query = query.where_eq("invoice_id", invoice_id);
        }
        self.load_all::<Payment>(&query).await
    }

    // ---- insurance claims ----

    #[instrument(
        skip(self, principal, request),
        fields(role = %principal.role, invoice_id = %request.invoice_id)
    )]
    pub async fn create_claim(
        &self,
        principal: &Principal,
        request: ClaimRequest,
    ) -> Result<InsuranceClaim, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "file insurance claims")?;
        let invoice = self.load_invoice(principal, request.invoice_id).await?.value;

        let mut claim = InsuranceClaim::draft(
            String::new(),
            &invoice,
            request,
            principal.id.clone(),
            self.now(),
        )?;
        claim.claim_number = self.sequences.next_number(EntityType::Claim).await?;

        self.store.commit(WriteBatch::new().insert(&claim)?).await?;
        info!(
            claim_id = %claim.id,
            claim_number = %claim.claim_number,
            submitted = %claim.submitted_amount,
            "Created insurance claim"
        );
        Ok(claim)
    }

    pub async fn submit_claim(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
    ) -> Result<InsuranceClaim, BillingError> {
        self.transition_claim(principal, id, "submit", |claim, now| claim.submit(now))
            .await
    }

    pub async fn start_claim_review(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
    ) -> Result<InsuranceClaim, BillingError> {
        self.transition_claim(principal, id, "review", |claim, now| claim.start_review(now))
            .await
    }

    pub async fn hold_claim(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
    ) -> Result<InsuranceClaim, BillingError> {
        self.transition_claim(principal, id, "hold", |claim, now| claim.hold(now))
            .await
    }

    pub async fn approve_claim(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
        approved_amount: Money,
    ) -> Result<InsuranceClaim, BillingError> {
        self.transition_claim(principal, id, "approve", move |claim, now| {
            claim.approve(approved_amount, now)
        })
        .await
    }

    pub async fn reject_claim(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
        reason: Option<String>,
    ) -> Result<InsuranceClaim, BillingError> {
        self.transition_claim(principal, id, "reject", move |claim, now| claim.reject(reason, now))
            .await
    }

    pub async fn mark_claim_paid(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
    ) -> Result<InsuranceClaim, BillingError> {
        self.transition_claim(principal, id, "mark paid", |claim, now| claim.mark_paid(now))
            .await
    }

    pub async fn get_claim(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
    ) -> Result<InsuranceClaim, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "view insurance claims")?;
        Ok(self
            .load::<InsuranceClaim>("InsuranceClaim", *id.as_uuid())
            .await?
            .value)
    }

    /// Claims ordered by submission date, newest first; drafts by creation
    pub async fn list_claims(
        &self,
        principal: &Principal,
        filter: ClaimFilter,
    ) -> Result<Vec<InsuranceClaim>, BillingError> {
        self.require_role(principal, &BILLING_CLERKS, "view insurance claims")?;
        let mut query = DocumentQuery::of::<InsuranceClaim>();
        if let Some(status) = filter.status {
            query = query.where_eq("status", status);
        }
        if let Some(invoice_id) = filter.invoice_id {
            query = query.where_eq("invoice_id", invoice_id);
        }
        let mut claims = self.load_all::<InsuranceClaim>(&query).await?;
        claims.sort_by(|a, b| b.listed_at().cmp(&a.listed_at()));
        Ok(claims)
    }

    #[instrument(skip(self, principal, change), fields(role = %principal.role, claim_id = %id))]
    async fn transition_claim<F>(
        &self,
        principal: &Principal,
        id: InsuranceClaimId,
        action: &str,
        change: F,
    ) -> Result<InsuranceClaim, BillingError>
    where
        F: FnOnce(&mut InsuranceClaim, DateTime<Utc>) -> Result<(), BillingError>,
    {
        self.require_role(principal, &BILLING_CLERKS, action)?;
        let Versioned { value: mut claim, version } =
            self.load::<InsuranceClaim>("InsuranceClaim", *id.as_uuid()).await?;
        let from = claim.status;
        if let Err(err) = change(&mut claim, self.now()) {
            warn!(status = ?from, action, error = %err, "Claim transition rejected");
            return Err(err);
        }
        self.save(&claim, version).await?;
        info!(from = ?from, to = ?claim.status, "Claim status changed");
        Ok(claim)
    }
}
