//! Access Filter Engine
//!
//! A pure decision function over (principal, record). The rule table is
//! evaluated top to bottom and the first matching row wins:
//!
//! | role             | patient | appointment | prescription | certificate |
//! |------------------|---------|-------------|--------------|-------------|
//! | superadmin/admin | yes     | yes         | yes          | yes         |
//! | frontdesk_staff  | yes     | yes         | yes          | no          |
//! | doctor           | owner   | owner       | owner        | owner       |
//! | anyone else      | no      | no          | no           | no          |
//!
//! "owner" means the principal's doctor id equals one of the record's
//! ownership fields. Missing or blank ids on either side deny.

use crate::navigation::Section;
use crate::principal::{DoctorId, Principal, Role};
use crate::records::{
    AppointmentRecord, MedicalCertificateRecord, PatientRecord, PrescriptionRecord, RecordKind,
    Restricted,
};

/// Evaluates the rule table for one record
pub fn is_permitted(principal: &Principal, kind: RecordKind, owners: &[&DoctorId]) -> bool {
    match principal.role {
        Role::SuperAdmin | Role::Admin => true,
        Role::FrontDeskStaff => !matches!(kind, RecordKind::MedicalCertificate),
        Role::Doctor => match principal.scoped_doctor() {
            Some(me) => owners.iter().any(|owner| owner.matches(me)),
            None => false,
        },
        Role::Patient => false,
    }
}

impl<R: Restricted> Restricted for &R {
    const KIND: RecordKind = R::KIND;

    fn owning_doctors(&self) -> Vec<&DoctorId> {
        (**self).owning_doctors()
    }
}

/// Record visibility for one principal
///
/// Borrowing the principal keeps every decision tied to the caller that was
/// passed in rather than to any session-wide state.
#[derive(Debug, Clone, Copy)]
pub struct AccessFilter<'p> {
    principal: &'p Principal,
}

impl<'p> AccessFilter<'p> {
    pub fn new(principal: &'p Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &'p Principal {
        self.principal
    }

    /// Decides whether the principal may view or act on `record`
    pub fn can_access<R: Restricted>(&self, record: &R) -> bool {
        is_permitted(self.principal, R::KIND, &record.owning_doctors())
    }

    /// Keeps the records the principal may access, preserving input order
    pub fn filter<R, I>(&self, records: I) -> Vec<R>
    where
        R: Restricted,
        I: IntoIterator<Item = R>,
    {
        records
            .into_iter()
            .filter(|record| self.can_access(record))
            .collect()
    }

    pub fn can_access_patient(&self, patient: &PatientRecord) -> bool {
        self.can_access(patient)
    }

    pub fn filter_patients(&self, patients: Vec<PatientRecord>) -> Vec<PatientRecord> {
        self.filter(patients)
    }

    pub fn can_access_appointment(&self, appointment: &AppointmentRecord) -> bool {
        self.can_access(appointment)
    }

    pub fn filter_appointments(
        &self,
        appointments: Vec<AppointmentRecord>,
    ) -> Vec<AppointmentRecord> {
        self.filter(appointments)
    }

    pub fn can_access_prescription(&self, prescription: &PrescriptionRecord) -> bool {
        self.can_access(prescription)
    }

    pub fn filter_prescriptions(
        &self,
        prescriptions: Vec<PrescriptionRecord>,
    ) -> Vec<PrescriptionRecord> {
        self.filter(prescriptions)
    }

    pub fn can_access_medical_certificate(&self, certificate: &MedicalCertificateRecord) -> bool {
        self.can_access(certificate)
    }

    pub fn filter_medical_certificates(
        &self,
        certificates: Vec<MedicalCertificateRecord>,
    ) -> Vec<MedicalCertificateRecord> {
        self.filter(certificates)
    }

    /// Visibility of billing documents and services scoped to a doctor
    ///
    /// Privileged roles and the front desk see everything. A doctor sees
    /// documents carrying their own id; `None` means "not doctor specific",
    /// which doctors may see as well.
    pub fn can_access_doctor_scoped(&self, owner: Option<&DoctorId>) -> bool {
        match self.principal.role {
            Role::SuperAdmin | Role::Admin | Role::FrontDeskStaff => true,
            Role::Doctor => match (self.principal.scoped_doctor(), owner) {
                (Some(_), None) => true,
                (Some(me), Some(owner)) => owner.matches(me),
                (None, _) => false,
            },
            Role::Patient => false,
        }
    }

    /// Like [`can_access_doctor_scoped`](Self::can_access_doctor_scoped) but
    /// the document must name its doctor for a doctor to see it.
    pub fn owns_doctor_document(&self, owner: &DoctorId) -> bool {
        match self.principal.role {
            Role::SuperAdmin | Role::Admin | Role::FrontDeskStaff => true,
            Role::Doctor => self
                .principal
                .scoped_doctor()
                .is_some_and(|me| owner.matches(me)),
            Role::Patient => false,
        }
    }

    /// Whether the principal may open a dashboard section
    pub fn can_enter(&self, section: Section) -> bool {
        section.allowed_roles().contains(&self.principal.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor(id: &str) -> Principal {
        Principal::doctor(format!("user-{id}"), id)
    }

    #[test]
    fn test_rule_table_precedence() {
        let owners = [&DoctorId::new("dr-a")];
        let admin = Principal::new("a", Role::Admin);
        let desk = Principal::new("f", Role::FrontDeskStaff);
        let patient = Principal::new("p", Role::Patient);

        for kind in [
            RecordKind::Patient,
            RecordKind::Appointment,
            RecordKind::Prescription,
            RecordKind::MedicalCertificate,
        ] {
            assert!(is_permitted(&admin, kind, &owners));
            assert!(!is_permitted(&patient, kind, &owners));
            assert!(is_permitted(&doctor("dr-a"), kind, &owners));
            assert!(!is_permitted(&doctor("dr-b"), kind, &owners));
        }

        assert!(is_permitted(&desk, RecordKind::Prescription, &owners));
        assert!(!is_permitted(&desk, RecordKind::MedicalCertificate, &owners));
    }

    #[test]
    fn test_doctor_without_scope_is_denied() {
        let mut principal = doctor("dr-a");
        principal.doctor_id = None;
        assert!(!is_permitted(&principal, RecordKind::Patient, &[&DoctorId::new("dr-a")]));

        principal.doctor_id = Some(DoctorId::new(""));
        assert!(!is_permitted(&principal, RecordKind::Patient, &[&DoctorId::new("")]));
    }

    #[test]
    fn test_doctor_scoped_documents() {
        let me = doctor("dr-a");
        let filter = AccessFilter::new(&me);
        assert!(filter.can_access_doctor_scoped(None));
        assert!(filter.can_access_doctor_scoped(Some(&DoctorId::new("dr-a"))));
        assert!(!filter.can_access_doctor_scoped(Some(&DoctorId::new("dr-b"))));
        assert!(filter.owns_doctor_document(&DoctorId::new("dr-a")));
        assert!(!filter.owns_doctor_document(&DoctorId::new("dr-b")));

        let patient = Principal::new("p", Role::Patient);
        assert!(!AccessFilter::new(&patient).can_access_doctor_scoped(None));
    }

    #[test]
    fn test_filter_accepts_references() {
        let me = doctor("dr-a");
        let patients = vec![
            PatientRecord::new("Asha", DoctorId::new("dr-a")),
            PatientRecord::new("Ravi", DoctorId::new("dr-b")),
        ];

        let visible: Vec<&PatientRecord> = AccessFilter::new(&me).filter(patients.iter());
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Asha");
    }
}
