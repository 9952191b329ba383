//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults,
//! plus [`BillingHarness`], an engine wired to an in-memory store and a
//! frozen clock.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use core_kernel::{FixedClock, Money, RetryPolicy};
use domain_access::{DoctorId, PatientRecord, Principal};
use domain_billing::{
    BillingConfig, BillingEngine, InMemoryDocumentStore, Invoice, LineItemRequest, NewService,
    PatientDirectory, PatientRegistration, Quotation, QuotationRequest, Service, ServiceCategory,
    GstRate,
};
use rust_decimal::Decimal;

use crate::fixtures::{IdFixtures, PrincipalFixtures, TemporalFixtures};

/// Builder for catalog entries
pub struct TestServiceBuilder {
    name: String,
    category: ServiceCategory,
    price: Money,
    hsn_code: String,
    gst_rate: GstRate,
    doctor_id: Option<DoctorId>,
}

impl Default for TestServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServiceBuilder {
    pub fn new() -> Self {
        Self {
            name: "Physiotherapy session".to_string(),
            category: ServiceCategory::Physiotherapy,
            price: Money::new(Decimal::from(500)),
            hsn_code: "9993".to_string(),
            gst_rate: GstRate::Eighteen,
            doctor_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_category(mut self, category: ServiceCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Money::new(price);
        self
    }

    pub fn with_gst_rate(mut self, rate: GstRate) -> Self {
        self.gst_rate = rate;
        self
    }

    pub fn with_doctor(mut self, doctor: DoctorId) -> Self {
        self.doctor_id = Some(doctor);
        self
    }

    pub fn build(self) -> NewService {
        NewService {
            name: self.name,
            category: self.category,
            price: self.price,
            hsn_code: self.hsn_code,
            gst_rate: self.gst_rate,
            description: None,
            doctor_id: self.doctor_id,
        }
    }
}

/// Billing engine over an in-memory store with a frozen clock
pub struct BillingHarness {
    pub store: Arc<InMemoryDocumentStore>,
    pub clock: Arc<FixedClock>,
    pub engine: BillingEngine,
    pub directory: PatientDirectory,
}

impl Default for BillingHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl BillingHarness {
    /// Harness with a fast retry policy (5 attempts, 1ms base delay)
    pub fn new() -> Self {
        Self::with_config(BillingConfig {
            retry: RetryPolicy::new(5, StdDuration::from_millis(1)),
            ..BillingConfig::default()
        })
    }

    pub fn with_config(config: BillingConfig) -> Self {
        let store = Arc::new(InMemoryDocumentStore::new());
        let clock = Arc::new(FixedClock::at(TemporalFixtures::clinic_open()));
        let engine = BillingEngine::new(store.clone(), clock.clone(), config)
            .expect("test billing config is valid");
        let directory = PatientDirectory::new(store.clone(), clock.clone());
        Self {
            store,
            clock,
            engine,
            directory,
        }
    }

    /// Registers a patient assigned to `doctor`
    pub async fn patient(&self, name: &str, doctor: DoctorId) -> PatientRecord {
        self.directory
            .register_patient(
                &PrincipalFixtures::front_desk(),
                PatientRegistration {
                    name: name.to_string(),
                    assigned_doctor_id: doctor,
                    primary_doctor_id: None,
                    email: None,
                    phone: None,
                    date_of_birth: None,
                    gender: None,
                    address: None,
                    insurance: None,
                },
            )
            .await
            .expect("patient registers")
    }

    /// Adds a catalog entry at `price` and 18% GST
    pub async fn service(&self, name: &str, price: Decimal) -> Service {
        self.service_from(TestServiceBuilder::new().with_name(name).with_price(price))
            .await
    }

    pub async fn service_from(&self, builder: TestServiceBuilder) -> Service {
        self.engine
            .create_service(&PrincipalFixtures::admin(), builder.build())
            .await
            .expect("service is created")
    }

    /// Draft quotation for `patient`, owned by doctor A
    pub async fn draft_quotation(
        &self,
        patient: &PatientRecord,
        lines: &[(&Service, u32)],
    ) -> Quotation {
        self.engine
            .create_quotation(&PrincipalFixtures::front_desk(), quotation_request(patient, lines))
            .await
            .expect("quotation is created")
    }

    /// Quotation taken through Sent to Accepted
    pub async fn accepted_quotation(
        &self,
        patient: &PatientRecord,
        lines: &[(&Service, u32)],
    ) -> Quotation {
        let staff = PrincipalFixtures::front_desk();
        let quotation = self.draft_quotation(patient, lines).await;
        self.engine
            .send_quotation(&staff, quotation.id)
            .await
            .expect("quotation is sent");
        self.engine
            .accept_quotation(&staff, quotation.id)
            .await
            .expect("quotation is accepted")
    }

    /// Invoice converted from an accepted quotation and sent
    pub async fn sent_invoice(
        &self,
        patient: &PatientRecord,
        lines: &[(&Service, u32)],
    ) -> Invoice {
        let staff = PrincipalFixtures::front_desk();
        let quotation = self.accepted_quotation(patient, lines).await;
        let invoice = self
            .engine
            .convert_quotation_to_invoice(&staff, quotation.id)
            .await
            .expect("quotation converts");
        self.engine
            .send_invoice(&staff, invoice.id)
            .await
            .expect("invoice is sent")
    }

    pub fn principal_for(&self, doctor: &DoctorId) -> Principal {
        Principal::doctor(format!("user-{}", doctor), doctor.clone())
    }
}

/// Quotation request for `patient` owned by doctor A
pub fn quotation_request(patient: &PatientRecord, lines: &[(&Service, u32)]) -> QuotationRequest {
    QuotationRequest {
        patient_id: patient.id,
        doctor_id: Some(IdFixtures::doctor_a()),
        doctor_name: Some("Dr. Anand".to_string()),
        items: line_requests(lines),
        is_inter_state: None,
        valid_until: None,
        notes: None,
        terms: None,
    }
}

pub fn line_requests(lines: &[(&Service, u32)]) -> Vec<LineItemRequest> {
    lines
        .iter()
        .map(|(service, quantity)| LineItemRequest {
            service_id: service.id,
            quantity: *quantity,
            description: None,
        })
        .collect()
}
