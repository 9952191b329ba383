//! Quotation, invoice and payment DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{InvoiceId, Money, PatientId, ServiceId};
use domain_access::{DoctorId, Section};
use domain_billing::{
    InvoiceRequest, LineItemRequest, PaymentMethod, PaymentRequest, QuotationRequest,
};

use super::positive_amount;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LineItemDto {
    pub service_id: ServiceId,
    #[validate(range(min = 1, max = 10000))]
    pub quantity: u32,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl From<LineItemDto> for LineItemRequest {
    fn from(item: LineItemDto) -> Self {
        LineItemRequest {
            service_id: item.service_id,
            quantity: item.quantity,
            description: item.description,
        }
    }
}

fn line_items(items: Vec<LineItemDto>) -> Vec<LineItemRequest> {
    items.into_iter().map(LineItemRequest::from).collect()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuotationRequest {
    pub patient_id: PatientId,
    /// Defaults to the caller's own scope for doctors
    pub doctor_id: Option<String>,
    pub doctor_name: Option<String>,
    #[validate(length(min = 1), nested)]
    pub items: Vec<LineItemDto>,
    pub is_inter_state: Option<bool>,
    pub valid_until: Option<DateTime<Utc>>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(max = 2000))]
    pub terms: Option<String>,
}

impl From<CreateQuotationRequest> for QuotationRequest {
    fn from(request: CreateQuotationRequest) -> Self {
        QuotationRequest {
            patient_id: request.patient_id,
            doctor_id: request.doctor_id.map(DoctorId::new),
            doctor_name: request.doctor_name,
            items: line_items(request.items),
            is_inter_state: request.is_inter_state,
            valid_until: request.valid_until,
            notes: request.notes,
            terms: request.terms,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateItemsRequest {
    #[validate(length(min = 1), nested)]
    pub items: Vec<LineItemDto>,
}

impl UpdateItemsRequest {
    pub fn into_items(self) -> Vec<LineItemRequest> {
        line_items(self.items)
    }
}

/// Optional reason given when rejecting a quotation or claim
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ReasonRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub patient_id: PatientId,
    #[validate(length(min = 1))]
    pub doctor_id: String,
    pub doctor_name: Option<String>,
    #[validate(length(min = 1), nested)]
    pub items: Vec<LineItemDto>,
    pub is_inter_state: Option<bool>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(max = 2000))]
    pub terms: Option<String>,
}

impl From<CreateInvoiceRequest> for InvoiceRequest {
    fn from(request: CreateInvoiceRequest) -> Self {
        InvoiceRequest {
            patient_id: request.patient_id,
            doctor_id: DoctorId::new(request.doctor_id),
            doctor_name: request.doctor_name,
            items: line_items(request.items),
            is_inter_state: request.is_inter_state,
            invoice_date: request.invoice_date,
            due_date: request.due_date,
            notes: request.notes,
            terms: request.terms,
        }
    }
}

/// Payment against the invoice named in the path
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(custom(function = "positive_amount"))]
    pub amount: Money,
    pub method: PaymentMethod,
    #[validate(length(max = 100))]
    pub transaction_id: Option<String>,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl RecordPaymentRequest {
    pub fn for_invoice(self, invoice_id: InvoiceId) -> PaymentRequest {
        PaymentRequest {
            invoice_id,
            amount: self.amount,
            method: self.method,
            transaction_id: self.transaction_id,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentListQuery {
    pub invoice_id: Option<InvoiceId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GstReportQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// Result of a sweep such as expiring quotations
#[derive(Debug, Serialize)]
pub struct SweepResponse<T> {
    pub updated: usize,
    pub documents: Vec<T>,
}

impl<T> From<Vec<T>> for SweepResponse<T> {
    fn from(documents: Vec<T>) -> Self {
        Self {
            updated: documents.len(),
            documents,
        }
    }
}

/// A dashboard section the caller may enter
#[derive(Debug, Serialize)]
pub struct SectionResponse {
    pub section: Section,
    pub title: &'static str,
    pub path: &'static str,
}

impl From<Section> for SectionResponse {
    fn from(section: Section) -> Self {
        Self {
            section,
            title: section.title(),
            path: section.path(),
        }
    }
}
