//! Service catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::ServiceId;
use domain_access::Principal;
use domain_billing::{NewService, Service, ServiceUpdate};

use super::retrying;
use crate::dto::services::{CreateServiceRequest, ServiceListQuery, UpdateServiceRequest};
use crate::{error::ApiError, AppState};

/// Lists catalog entries, optionally only active or inactive ones
pub async fn list_services(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
    Ok(Json(state.engine.list_services(&principal, query.active).await?))
}

pub async fn create_service(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    request.validate()?;
    let new = NewService::from(request);
    let service = retrying(&state, "create_service", || {
        state.engine.create_service(&principal, new.clone())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn get_service(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<ServiceId>,
) -> Result<Json<Service>, ApiError> {
    Ok(Json(state.engine.get_service(&principal, id).await?))
}

/// Applies a partial update; lines already on documents keep their prices
pub async fn update_service(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<ServiceId>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Service>, ApiError> {
    request.validate()?;
    let update = ServiceUpdate::from(request);
    let service = retrying(&state, "update_service", || {
        state.engine.update_service(&principal, id, update.clone())
    })
    .await?;
    Ok(Json(service))
}

pub async fn deactivate_service(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<ServiceId>,
) -> Result<Json<Service>, ApiError> {
    let service = retrying(&state, "deactivate_service", || {
        state.engine.deactivate_service(&principal, id)
    })
    .await?;
    Ok(Json(service))
}
