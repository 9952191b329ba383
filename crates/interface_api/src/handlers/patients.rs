//! Patient handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use validator::Validate;

use core_kernel::PatientId;
use domain_access::{DoctorId, PatientRecord, Principal};
use domain_billing::PatientRegistration;

use super::retrying;
use crate::dto::patients::{AddConsultingDoctorRequest, RegisterPatientRequest};
use crate::{error::ApiError, AppState};

/// Lists the patients visible to the caller
pub async fn list_patients(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<PatientRecord>>, ApiError> {
    Ok(Json(state.directory.list_patients(&principal).await?))
}

/// Registers a new patient
pub async fn register_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<PatientRecord>), ApiError> {
    request.validate()?;
    let registration = PatientRegistration::from(request);
    let patient = retrying(&state, "register_patient", || {
        state.directory.register_patient(&principal, registration.clone())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(patient)))
}

/// Gets a patient by ID
pub async fn get_patient(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<PatientId>,
) -> Result<Json<PatientRecord>, ApiError> {
    Ok(Json(state.directory.get_patient(&principal, id).await?))
}

/// Refers a patient to another doctor
pub async fn add_consulting_doctor(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<PatientId>,
    Json(request): Json<AddConsultingDoctorRequest>,
) -> Result<Json<PatientRecord>, ApiError> {
    request.validate()?;
    let doctor = DoctorId::new(request.doctor_id);
    let patient = retrying(&state, "add_consulting_doctor", || {
        state.directory.add_consulting_doctor(&principal, id, doctor.clone())
    })
    .await?;
    Ok(Json(patient))
}
