//! Access Domain - Role-based visibility for clinic records
//!
//! This crate decides what a principal may see:
//! - Roles, principals and doctor scoping
//! - Patient, appointment, prescription and medical certificate records
//! - The [`AccessFilter`] rule table and list filters
//! - Dashboard sections per role
//!
//! Everything here is pure. Nothing performs I/O and every decision is a
//! function of the principal and the record passed in.

pub mod error;
pub mod filter;
pub mod navigation;
pub mod principal;
pub mod records;

pub use error::AccessError;
pub use filter::{is_permitted, AccessFilter};
pub use navigation::{sections_for, Section};
pub use principal::{DoctorId, Principal, Role};
pub use records::{
    AppointmentRecord, AppointmentStatus, CertificateStatus, CertificateType, CoverageType,
    Gender, InsuranceInfo, MedicalCertificateRecord, Medication, PatientRecord,
    PrescriptionRecord, PrescriptionStatus, RecordKind, Restricted,
};
