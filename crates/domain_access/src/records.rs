//! Clinical records subject to visibility rules
//!
//! Each record carries the doctor ids that own it. Ownership fields are
//! optional so that a record missing one can still be represented; a missing
//! field simply contributes no owner and therefore grants nothing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{AppointmentId, CertificateId, PatientId, PrescriptionId};

use crate::principal::DoctorId;

/// Kinds of record the access filter decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Patient,
    Appointment,
    Prescription,
    MedicalCertificate,
}

/// A record whose visibility is scoped to owning doctors
pub trait Restricted {
    /// Kind used to pick the row of the rule table
    const KIND: RecordKind;

    /// Doctor ids that own this record, blanks included
    fn owning_doctors(&self) -> Vec<&DoctorId>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoverageType {
    #[serde(rename = "PPO")]
    Ppo,
    #[serde(rename = "HMO")]
    Hmo,
    #[serde(rename = "EPO")]
    Epo,
    #[serde(rename = "POS")]
    Pos,
}

/// Insurance details held on a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceInfo {
    pub provider: String,
    pub policy_number: String,
    pub group_number: Option<String>,
    pub coverage_type: CoverageType,
    pub valid_until: Option<NaiveDate>,
}

/// A registered patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub id: PatientId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub insurance: Option<InsuranceInfo>,
    /// Doctor the patient belongs to
    pub assigned_doctor_id: Option<DoctorId>,
    pub primary_doctor_id: Option<DoctorId>,
    /// Doctors the patient was referred to
    #[serde(default)]
    pub consulting_doctors: Vec<DoctorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PatientRecord {
    /// Creates a patient assigned to `doctor`
    pub fn new(name: impl Into<String>, doctor: DoctorId) -> Self {
        let now = Utc::now();
        Self {
            id: PatientId::new_v7(),
            name: name.into(),
            email: None,
            phone: None,
            date_of_birth: None,
            gender: None,
            address: None,
            insurance: None,
            assigned_doctor_id: Some(doctor),
            primary_doctor_id: None,
            consulting_doctors: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_primary_doctor(mut self, doctor: DoctorId) -> Self {
        self.primary_doctor_id = Some(doctor);
        self
    }

    pub fn with_consulting_doctor(mut self, doctor: DoctorId) -> Self {
        self.add_consulting_doctor(doctor);
        self
    }

    /// Adds a referral; duplicates are ignored
    pub fn add_consulting_doctor(&mut self, doctor: DoctorId) -> bool {
        if self.consulting_doctors.contains(&doctor) {
            return false;
        }
        self.consulting_doctors.push(doctor);
        self.updated_at = Utc::now();
        true
    }
}

impl Restricted for PatientRecord {
    const KIND: RecordKind = RecordKind::Patient;

    fn owning_doctors(&self) -> Vec<&DoctorId> {
        self.assigned_doctor_id
            .iter()
            .chain(self.primary_doctor_id.iter())
            .chain(self.consulting_doctors.iter())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    /// Primary doctor for the appointment
    pub doctor_id: Option<DoctorId>,
    /// Set when the patient was referred to another doctor
    pub consulting_doctor_id: Option<DoctorId>,
    pub appointment_date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Restricted for AppointmentRecord {
    const KIND: RecordKind = RecordKind::Appointment;

    fn owning_doctors(&self) -> Vec<&DoctorId> {
        self.doctor_id
            .iter()
            .chain(self.consulting_doctor_id.iter())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionRecord {
    pub id: PrescriptionId,
    pub patient_id: PatientId,
    /// Doctor who issued the prescription
    pub doctor_id: Option<DoctorId>,
    #[serde(default)]
    pub medications: Vec<Medication>,
    pub issued_date: NaiveDate,
    pub valid_until: NaiveDate,
    pub status: PrescriptionStatus,
}

impl Restricted for PrescriptionRecord {
    const KIND: RecordKind = RecordKind::Prescription;

    fn owning_doctors(&self) -> Vec<&DoctorId> {
        self.doctor_id.iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    Fitness,
    Disability,
    MedicalLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Active,
    Expired,
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicalCertificateRecord {
    pub id: CertificateId,
    pub patient_id: PatientId,
    /// Doctor who issued the certificate
    pub doctor_id: Option<DoctorId>,
    pub certificate_type: CertificateType,
    pub issued_date: NaiveDate,
    pub valid_until: Option<NaiveDate>,
    pub status: CertificateStatus,
}

impl Restricted for MedicalCertificateRecord {
    const KIND: RecordKind = RecordKind::MedicalCertificate;

    fn owning_doctors(&self) -> Vec<&DoctorId> {
        self.doctor_id.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_owners_cover_all_doctor_fields() {
        let patient = PatientRecord::new("Asha", DoctorId::new("dr-a"))
            .with_primary_doctor(DoctorId::new("dr-b"))
            .with_consulting_doctor(DoctorId::new("dr-c"));

        let owners: Vec<&str> = patient.owning_doctors().iter().map(|d| d.as_str()).collect();
        assert_eq!(owners, vec!["dr-a", "dr-b", "dr-c"]);
    }

    #[test]
    fn test_add_consulting_doctor_ignores_duplicates() {
        let mut patient = PatientRecord::new("Asha", DoctorId::new("dr-a"));
        assert!(patient.add_consulting_doctor(DoctorId::new("dr-c")));
        assert!(!patient.add_consulting_doctor(DoctorId::new("dr-c")));
        assert_eq!(patient.consulting_doctors.len(), 1);
    }

    #[test]
    fn test_patient_deserializes_without_consulting_doctors() {
        let patient = PatientRecord::new("Asha", DoctorId::new("dr-a"));
        let mut json = serde_json::to_value(&patient).unwrap();
        json.as_object_mut().unwrap().remove("consulting_doctors");

        let back: PatientRecord = serde_json::from_value(json).unwrap();
        assert!(back.consulting_doctors.is_empty());
    }
}
