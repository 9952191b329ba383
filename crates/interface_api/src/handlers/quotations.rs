//! Quotation handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::QuotationId;
use domain_access::Principal;
use domain_billing::{Invoice, Quotation, QuotationFilter, QuotationRequest};

use super::retrying;
use crate::dto::billing::{CreateQuotationRequest, ReasonRequest, SweepResponse, UpdateItemsRequest};
use crate::{error::ApiError, AppState};

/// Lists quotations, newest first
pub async fn list_quotations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<QuotationFilter>,
) -> Result<Json<Vec<Quotation>>, ApiError> {
    Ok(Json(state.engine.list_quotations(&principal, filter).await?))
}

/// Creates a draft quotation and assigns its DRC-QUO number
pub async fn create_quotation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateQuotationRequest>,
) -> Result<(StatusCode, Json<Quotation>), ApiError> {
    request.validate()?;
    let request = QuotationRequest::from(request);
    let quotation = retrying(&state, "create_quotation", || {
        state.engine.create_quotation(&principal, request.clone())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(quotation)))
}

pub async fn get_quotation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuotationId>,
) -> Result<Json<Quotation>, ApiError> {
    Ok(Json(state.engine.get_quotation(&principal, id).await?))
}

/// Replaces the lines of a draft quotation
pub async fn update_items(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuotationId>,
    Json(request): Json<UpdateItemsRequest>,
) -> Result<Json<Quotation>, ApiError> {
    request.validate()?;
    let items = request.into_items();
    let quotation = retrying(&state, "update_quotation_items", || {
        state.engine.update_quotation_items(&principal, id, items.clone(), None)
    })
    .await?;
    Ok(Json(quotation))
}

pub async fn send_quotation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuotationId>,
) -> Result<Json<Quotation>, ApiError> {
    let quotation = retrying(&state, "send_quotation", || {
        state.engine.send_quotation(&principal, id)
    })
    .await?;
    Ok(Json(quotation))
}

pub async fn mark_viewed(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuotationId>,
) -> Result<Json<Quotation>, ApiError> {
    let quotation = retrying(&state, "mark_quotation_viewed", || {
        state.engine.mark_quotation_viewed(&principal, id)
    })
    .await?;
    Ok(Json(quotation))
}

pub async fn accept_quotation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuotationId>,
) -> Result<Json<Quotation>, ApiError> {
    let quotation = retrying(&state, "accept_quotation", || {
        state.engine.accept_quotation(&principal, id)
    })
    .await?;
    Ok(Json(quotation))
}

pub async fn reject_quotation(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuotationId>,
    body: Option<Json<ReasonRequest>>,
) -> Result<Json<Quotation>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    request.validate()?;
    let quotation = retrying(&state, "reject_quotation", || {
        state.engine.reject_quotation(&principal, id, request.reason.clone())
    })
    .await?;
    Ok(Json(quotation))
}

/// Converts an accepted quotation into a draft invoice
pub async fn convert_to_invoice(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<QuotationId>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    let invoice = retrying(&state, "convert_quotation_to_invoice", || {
        state.engine.convert_quotation_to_invoice(&principal, id)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Marks every open quotation past its validity date as expired
pub async fn expire_quotations(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<SweepResponse<Quotation>>, ApiError> {
    let expired = state.engine.expire_quotations(&principal).await?;
    Ok(Json(expired.into()))
}
