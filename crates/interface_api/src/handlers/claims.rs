//! Insurance claim handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::InsuranceClaimId;
use domain_access::Principal;
use domain_billing::{ClaimFilter, ClaimRequest, InsuranceClaim};

use super::retrying;
use crate::dto::billing::ReasonRequest;
use crate::dto::claims::{ApproveClaimRequest, CreateClaimRequest};
use crate::{error::ApiError, AppState};

/// Lists claims, most recently submitted first
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(filter): Query<ClaimFilter>,
) -> Result<Json<Vec<InsuranceClaim>>, ApiError> {
    Ok(Json(state.engine.list_claims(&principal, filter).await?))
}

/// Drafts a claim against an invoice
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<InsuranceClaim>), ApiError> {
    request.validate()?;
    let request = ClaimRequest::from(request);
    let claim = retrying(&state, "create_claim", || {
        state.engine.create_claim(&principal, request.clone())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(claim)))
}

pub async fn get_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InsuranceClaimId>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    Ok(Json(state.engine.get_claim(&principal, id).await?))
}

pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InsuranceClaimId>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    let claim = retrying(&state, "submit_claim", || {
        state.engine.submit_claim(&principal, id)
    })
    .await?;
    Ok(Json(claim))
}

pub async fn start_review(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InsuranceClaimId>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    let claim = retrying(&state, "start_claim_review", || {
        state.engine.start_claim_review(&principal, id)
    })
    .await?;
    Ok(Json(claim))
}

/// Parks a submitted claim while the insurer asks for more information
pub async fn hold_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InsuranceClaimId>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    let claim = retrying(&state, "hold_claim", || state.engine.hold_claim(&principal, id)).await?;
    Ok(Json(claim))
}

pub async fn approve_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InsuranceClaimId>,
    Json(request): Json<ApproveClaimRequest>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    request.validate()?;
    let claim = retrying(&state, "approve_claim", || {
        state.engine.approve_claim(&principal, id, request.approved_amount)
    })
    .await?;
    Ok(Json(claim))
}

pub async fn reject_claim(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InsuranceClaimId>,
    body: Option<Json<ReasonRequest>>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    request.validate()?;
    let claim = retrying(&state, "reject_claim", || {
        state.engine.reject_claim(&principal, id, request.reason.clone())
    })
    .await?;
    Ok(Json(claim))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<InsuranceClaimId>,
) -> Result<Json<InsuranceClaim>, ApiError> {
    let claim = retrying(&state, "mark_claim_paid", || {
        state.engine.mark_claim_paid(&principal, id)
    })
    .await?;
    Ok(Json(claim))
}
