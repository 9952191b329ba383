//! Access filter tests
//!
//! Property tests pin the visibility rules: privileged roles see all,
//! doctors see exactly what they own, the front desk never sees
//! certificates, and everything else is denied.

use chrono::{NaiveDate, Utc};
use core_kernel::{AppointmentId, CertificateId, PatientId, PrescriptionId};
use domain_access::*;
use proptest::prelude::*;

fn doctor_id() -> impl Strategy<Value = DoctorId> {
    prop_oneof![
        Just(DoctorId::new("dr-a")),
        Just(DoctorId::new("dr-b")),
        Just(DoctorId::new("dr-c")),
        Just(DoctorId::new("")),
    ]
}

fn role() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

fn principal() -> impl Strategy<Value = Principal> {
    (role(), prop::option::of(doctor_id())).prop_map(|(role, doctor_id)| Principal {
        id: "user".to_string(),
        role,
        doctor_id,
        name: None,
    })
}

fn patient() -> impl Strategy<Value = PatientRecord> {
    (
        prop::option::of(doctor_id()),
        prop::option::of(doctor_id()),
        prop::collection::vec(doctor_id(), 0..3),
    )
        .prop_map(|(assigned, primary, consulting)| {
            let mut record = PatientRecord::new("Patient", DoctorId::new("placeholder"));
            record.assigned_doctor_id = assigned;
            record.primary_doctor_id = primary;
            record.consulting_doctors = consulting;
            record
        })
}

fn certificate(doctor: Option<DoctorId>) -> MedicalCertificateRecord {
    MedicalCertificateRecord {
        id: CertificateId::new_v7(),
        patient_id: PatientId::new_v7(),
        doctor_id: doctor,
        certificate_type: CertificateType::Fitness,
        issued_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        valid_until: None,
        status: CertificateStatus::Active,
    }
}

fn prescription(doctor: Option<DoctorId>) -> PrescriptionRecord {
    PrescriptionRecord {
        id: PrescriptionId::new_v7(),
        patient_id: PatientId::new_v7(),
        doctor_id: doctor,
        medications: vec![Medication {
            name: "Ibuprofen".to_string(),
            dosage: "400mg".to_string(),
            frequency: "twice daily".to_string(),
        }],
        issued_date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
        valid_until: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
        status: PrescriptionStatus::Active,
    }
}

fn appointment(doctor: Option<DoctorId>, consulting: Option<DoctorId>) -> AppointmentRecord {
    AppointmentRecord {
        id: AppointmentId::new_v7(),
        patient_id: PatientId::new_v7(),
        doctor_id: doctor,
        consulting_doctor_id: consulting,
        appointment_date: Utc::now(),
        status: AppointmentStatus::Scheduled,
        created_at: Utc::now(),
    }
}

mod property_tests {
    use super::*;

    proptest! {
        #[test]
        fn prop_can_access_is_deterministic(p in principal(), record in patient()) {
            let filter = AccessFilter::new(&p);
            prop_assert_eq!(filter.can_access_patient(&record), filter.can_access_patient(&record));
        }

        #[test]
        fn prop_doctor_sees_patient_iff_owner(id in doctor_id(), record in patient()) {
            let p = Principal::doctor("user", id.clone());
            let expected = !id.is_blank()
                && (record.assigned_doctor_id.as_ref() == Some(&id)
                    || record.primary_doctor_id.as_ref() == Some(&id)
                    || record.consulting_doctors.contains(&id));
            prop_assert_eq!(AccessFilter::new(&p).can_access_patient(&record), expected);
        }

        #[test]
        fn prop_front_desk_never_sees_certificates(
            doctor in prop::option::of(doctor_id()),
            record in patient()
        ) {
            let p = Principal::new("desk", Role::FrontDeskStaff);
            let filter = AccessFilter::new(&p);
            prop_assert!(filter.can_access_patient(&record));
            prop_assert!(filter.can_access_prescription(&prescription(doctor.clone())));
            prop_assert!(filter.can_access_appointment(&appointment(doctor.clone(), None)));
            prop_assert!(!filter.can_access_medical_certificate(&certificate(doctor)));
        }

        #[test]
        fn prop_privileged_roles_see_everything(admin in prop::bool::ANY, record in patient()) {
            let role = if admin { Role::Admin } else { Role::SuperAdmin };
            let p = Principal::new("root", role);
            let filter = AccessFilter::new(&p);
            prop_assert!(filter.can_access_patient(&record));
            prop_assert!(filter.can_access_medical_certificate(&certificate(None)));
        }

        #[test]
        fn prop_non_owner_non_privileged_is_denied(p in principal()) {
            // A record without any ownership field
            let mut record = PatientRecord::new("Orphan", DoctorId::new(""));
            record.assigned_doctor_id = None;
            let allowed = AccessFilter::new(&p).can_access_patient(&record);
            let expected = matches!(p.role, Role::SuperAdmin | Role::Admin | Role::FrontDeskStaff);
            prop_assert_eq!(allowed, expected);
        }

        #[test]
        fn prop_filter_is_stable_subsequence(
            p in principal(),
            records in prop::collection::vec(patient(), 0..12)
        ) {
            let filter = AccessFilter::new(&p);
            let expected: Vec<PatientRecord> = records
                .iter()
                .filter(|r| filter.can_access_patient(r))
                .cloned()
                .collect();
            let filtered = filter.filter_patients(records.clone());
            prop_assert_eq!(&filtered, &expected);

            // Filtering is idempotent
            prop_assert_eq!(filter.filter_patients(filtered.clone()), filtered);
        }
    }
}

mod record_kind_tests {
    use super::*;

    #[test]
    fn test_appointment_consulting_doctor_grants_access() {
        let consultant = Principal::doctor("u2", "dr-b");
        let record = appointment(Some(DoctorId::new("dr-a")), Some(DoctorId::new("dr-b")));
        assert!(AccessFilter::new(&consultant).can_access_appointment(&record));

        let other = Principal::doctor("u3", "dr-c");
        assert!(!AccessFilter::new(&other).can_access_appointment(&record));
    }

    #[test]
    fn test_doctor_sees_only_own_certificates() {
        let me = Principal::doctor("u1", "dr-a");
        let filter = AccessFilter::new(&me);
        let certificates = vec![
            certificate(Some(DoctorId::new("dr-a"))),
            certificate(Some(DoctorId::new("dr-b"))),
            certificate(None),
        ];

        let visible = filter.filter_medical_certificates(certificates.clone());
        assert_eq!(visible, vec![certificates[0].clone()]);
    }

    #[test]
    fn test_patient_principal_sees_nothing() {
        let p = Principal::new("pt", Role::Patient);
        let filter = AccessFilter::new(&p);
        assert!(!filter.can_access_prescription(&prescription(Some(DoctorId::new("dr-a")))));
        assert!(filter.filter_appointments(vec![appointment(None, None)]).is_empty());
    }

    #[test]
    fn test_filter_prescriptions_keeps_order() {
        let me = Principal::doctor("u1", "dr-a");
        let records = vec![
            prescription(Some(DoctorId::new("dr-a"))),
            prescription(Some(DoctorId::new("dr-b"))),
            prescription(Some(DoctorId::new("dr-a"))),
        ];
        let visible = AccessFilter::new(&me).filter_prescriptions(records.clone());
        assert_eq!(visible, vec![records[0].clone(), records[2].clone()]);
    }
}

mod principal_tests {
    use super::*;

    #[test]
    fn test_login_derived_doctor_scope() {
        let p = Principal::from_email("uid-1", "doctor@dakshinrehab.com", Role::Doctor).unwrap();
        let mine = PatientRecord::new("Asha", DoctorId::new("doctor"));
        assert!(AccessFilter::new(&p).can_access_patient(&mine));
    }

    #[test]
    fn test_sections_gate_routes() {
        let desk = Principal::new("desk", Role::FrontDeskStaff);
        let filter = AccessFilter::new(&desk);
        assert!(filter.can_enter(Section::Billing));
        assert!(!filter.can_enter(Section::MedicalCertificates));

        let section = Section::from_path("/settings/system").unwrap();
        assert!(!filter.can_enter(section));
    }
}
