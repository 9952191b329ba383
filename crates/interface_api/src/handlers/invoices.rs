//! Invoice and payment handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::InvoiceId;
use domain_access::Principal;
use domain_billing::{Invoice, InvoiceFilter, InvoiceRequest, Payment, PaymentReceipt};

use super::retrying;
use crate::dto::billing::{
    CreateInvoiceRequest, PaymentListQuery, RecordPaymentRequest, SweepResponse,
};
use crate::{error::ApiError, AppState};

/// Lists invoices, newest first
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<InvoiceFilter>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
    Ok(Json(state.engine.list_invoices(&principal, filter).await?))
}

/// Creates a draft invoice directly from catalog lines
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    request.validate()?;
    let request = InvoiceRequest::from(request);
    let invoice = retrying(&state, "create_invoice", || {
        state.engine.create_invoice(&principal, request.clone())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, ApiError> {
    Ok(Json(state.engine.get_invoice(&principal, id).await?))
}

pub async fn send_invoice(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = retrying(&state, "send_invoice", || {
        state.engine.send_invoice(&principal, id)
    })
    .await?;
    Ok(Json(invoice))
}

pub async fn cancel_invoice(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Invoice>, ApiError> {
    let invoice = retrying(&state, "cancel_invoice", || {
        state.engine.cancel_invoice(&principal, id)
    })
    .await?;
    Ok(Json(invoice))
}

/// Marks every payable invoice past its due date as overdue
pub async fn mark_overdue(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SweepResponse<Invoice>>, ApiError> {
    let overdue = state.engine.mark_overdue_invoices(&principal).await?;
    Ok(Json(overdue.into()))
}

/// Records a payment against an invoice
///
/// Concurrent payments on the same invoice are serialized by the invoice
/// version; the loser is retried against the fresh balance.
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InvoiceId>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentReceipt>), ApiError> {
    request.validate()?;
    let request = request.for_invoice(id);
    let receipt = retrying(&state, "record_payment", || {
        state.engine.record_payment(&principal, request.clone())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Lists the payments recorded against one invoice
pub async fn list_invoice_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InvoiceId>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.engine.list_payments(&principal, Some(id)).await?))
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    Ok(Json(state.engine.list_payments(&principal, query.invoice_id).await?))
}
