//! Patient directory
//!
//! Patients live in the same document store as billing documents. Every read
//! goes through the [`AccessFilter`], so a doctor only ever sees patients
//! assigned or referred to them.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use core_kernel::{Clock, PatientId};
use domain_access::{AccessFilter, DoctorId, Gender, InsuranceInfo, PatientRecord, Principal, Role};

use crate::error::BillingError;
use crate::store::{
    fetch, fetch_all, Collection, Document, DocumentQuery, SortDirection, WriteBatch,
};
use crate::store::DocumentStore;

const REGISTRARS: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::FrontDeskStaff];

impl Document for PatientRecord {
    const COLLECTION: Collection = Collection::Patients;

    fn document_id(&self) -> Uuid {
        *self.id.as_uuid()
    }
}

/// Input for registering a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRegistration {
    pub name: String,
    pub assigned_doctor_id: DoctorId,
    pub primary_doctor_id: Option<DoctorId>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub insurance: Option<InsuranceInfo>,
}

/// Registers and looks up patients
#[derive(Clone)]
pub struct PatientDirectory {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl PatientDirectory {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    #[instrument(skip(self, principal, registration), fields(role = %principal.role))]
    pub async fn register_patient(
        &self,
        principal: &Principal,
        registration: PatientRegistration,
    ) -> Result<PatientRecord, BillingError> {
        if !REGISTRARS.contains(&principal.role) {
            return Err(BillingError::access_denied(format!(
                "{} cannot register patients",
                principal.role
            )));
        }
        let name = registration.name.trim();
        if name.is_empty() {
            return Err(BillingError::validation("Patient name is required"));
        }
        if registration.assigned_doctor_id.is_blank() {
            return Err(BillingError::validation("An assigned doctor is required"));
        }

        let now = self.clock.now();
        let mut patient = PatientRecord::new(name, registration.assigned_doctor_id);
        patient.primary_doctor_id = registration.primary_doctor_id.filter(|id| !id.is_blank());
        patient.email = registration.email;
        patient.phone = registration.phone;
        patient.date_of_birth = registration.date_of_birth;
        patient.gender = registration.gender;
        patient.address = registration.address;
        patient.insurance = registration.insurance;
        patient.created_at = now;
        patient.updated_at = now;

        self.store.commit(WriteBatch::new().insert(&patient)?).await?;
        info!(patient_id = %patient.id, "Registered patient");
        Ok(patient)
    }

    pub async fn get_patient(
        &self,
        principal: &Principal,
        id: PatientId,
    ) -> Result<PatientRecord, BillingError> {
        visible_patient(self.store.as_ref(), principal, id).await
    }

    /// Patients visible to the principal, ordered by name
    pub async fn list_patients(
        &self,
        principal: &Principal,
    ) -> Result<Vec<PatientRecord>, BillingError> {
        let query = DocumentQuery::of::<PatientRecord>().order_by("name", SortDirection::Ascending);
        let patients = fetch_all::<PatientRecord>(self.store.as_ref(), &query)
            .await?
            .into_iter()
            .map(|versioned| versioned.value);
        Ok(AccessFilter::new(principal).filter(patients))
    }

    /// Refers a patient to another doctor
    #[instrument(skip(self, principal), fields(role = %principal.role, patient_id = %id))]
    pub async fn add_consulting_doctor(
        &self,
        principal: &Principal,
        id: PatientId,
        doctor: DoctorId,
    ) -> Result<PatientRecord, BillingError> {
        if doctor.is_blank() {
            return Err(BillingError::validation("Consulting doctor id is required"));
        }
        let versioned = fetch::<PatientRecord>(self.store.as_ref(), *id.as_uuid())
            .await?
            .ok_or_else(|| BillingError::not_found("Patient", id))?;
        let mut patient = versioned.value;
        if !AccessFilter::new(principal).can_access_patient(&patient) {
            return Err(BillingError::access_denied(format!("Patient {} is not visible", id)));
        }
        if principal.role == Role::Patient {
            return Err(BillingError::access_denied("Patients cannot refer"));
        }

        if patient.add_consulting_doctor(doctor.clone()) {
            patient.updated_at = self.clock.now();
            self.store
                .commit(WriteBatch::new().update(&patient, versioned.version)?)
                .await?;
            info!(doctor_id = %doctor, "Added consulting doctor");
        }
        Ok(patient)
    }
}

/// Loads a patient and checks the principal may see it
pub(crate) async fn visible_patient(
    store: &dyn DocumentStore,
    principal: &Principal,
    id: PatientId,
) -> Result<PatientRecord, BillingError> {
    let patient = fetch::<PatientRecord>(store, *id.as_uuid())
        .await?
        .ok_or_else(|| BillingError::not_found("Patient", id))?
        .value;
    if !AccessFilter::new(principal).can_access_patient(&patient) {
        return Err(BillingError::access_denied(format!("Patient {} is not visible", id)));
    }
    Ok(patient)
}
