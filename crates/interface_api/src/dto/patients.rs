//! Patient DTOs

use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use domain_access::{DoctorId, Gender, InsuranceInfo};
use domain_billing::PatientRegistration;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterPatientRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 1))]
    pub assigned_doctor_id: String,
    pub primary_doctor_id: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 7, max = 20))]
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(length(max = 500))]
    pub address: Option<String>,
    pub insurance: Option<InsuranceInfo>,
}

impl From<RegisterPatientRequest> for PatientRegistration {
    fn from(request: RegisterPatientRequest) -> Self {
        PatientRegistration {
            name: request.name,
            assigned_doctor_id: DoctorId::new(request.assigned_doctor_id),
            primary_doctor_id: request.primary_doctor_id.map(DoctorId::new),
            email: request.email,
            phone: request.phone,
            date_of_birth: request.date_of_birth,
            gender: request.gender,
            address: request.address,
            insurance: request.insurance,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddConsultingDoctorRequest {
    #[validate(length(min = 1))]
    pub doctor_id: String,
}
