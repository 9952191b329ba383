//! HTTP tests for the clinic API
//!
//! Each test builds the router over an in-memory store and a frozen clock
//! and drives it through `axum-test` with signed bearer tokens.

use std::future::IntoFuture;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use core_kernel::FixedClock;
use domain_access::{PatientRecord, Principal};
use domain_billing::{
    Invoice, InvoiceStatus, PaymentReceipt, Quotation, QuotationStatus, Service,
};
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState};
use test_utils::{assert_invoice_balanced, assert_money_eq, PrincipalFixtures, TemporalFixtures};

const SECRET: &str = "api-test-secret";

struct TestApi {
    server: TestServer,
}

impl TestApi {
    fn new() -> Self {
        let config = ApiConfig {
            jwt_secret: SECRET.to_string(),
            retry_max_attempts: 5,
            retry_base_delay_ms: 1,
            ..ApiConfig::default()
        };
        let store = Arc::new(domain_billing::InMemoryDocumentStore::new());
        let clock = Arc::new(FixedClock::at(TemporalFixtures::clinic_open()));
        let state = AppState::with_clock(store, clock, config).unwrap();
        let server = TestServer::new(create_router(state)).unwrap();
        Self { server }
    }

    fn token(principal: &Principal) -> String {
        create_token(principal, None, SECRET, 3600).unwrap()
    }

    async fn create_service(&self, name: &str, price: &str) -> Service {
        let response = self
            .server
            .post("/api/v1/services")
            .authorization_bearer(Self::token(&PrincipalFixtures::admin()))
            .json(&json!({
                "name": name,
                "category": "Physiotherapy",
                "price": price,
                "hsn_code": "9993",
                "gst_rate": 18
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Service>()
    }

    async fn register_patient(&self, name: &str, doctor: &str) -> PatientRecord {
        let response = self
            .server
            .post("/api/v1/patients")
            .authorization_bearer(Self::token(&PrincipalFixtures::front_desk()))
            .json(&json!({
                "name": name,
                "assigned_doctor_id": doctor,
                "phone": "9876543210"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<PatientRecord>()
    }

    async fn create_quotation(
        &self,
        patient: &PatientRecord,
        services: &[(&Service, u32)],
    ) -> Quotation {
        let items: Vec<Value> = services
            .iter()
            .map(|(service, quantity)| json!({"service_id": service.id, "quantity": quantity}))
            .collect();
        let response = self
            .server
            .post("/api/v1/quotations")
            .authorization_bearer(Self::token(&PrincipalFixtures::front_desk()))
            .json(&json!({
                "patient_id": patient.id,
                "doctor_id": "dr-anand",
                "items": items
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json::<Quotation>()
    }

    async fn post_as(&self, principal: &Principal, path: &str) -> axum_test::TestResponse {
        self.server
            .post(path)
            .authorization_bearer(Self::token(principal))
            .await
    }

    /// Quotation for 1 x 500 + 2 x 600 at 18% GST, taken to a sent invoice
    async fn sent_invoice(&self) -> Invoice {
        let staff = PrincipalFixtures::front_desk();
        let gait = self.create_service("Gait training", "500").await;
        let brace = self.create_service("Ankle brace", "600").await;
        let patient = self.register_patient("Meena Rao", "dr-anand").await;
        let quotation = self.create_quotation(&patient, &[(&gait, 1), (&brace, 2)]).await;

        for step in ["send", "accept"] {
            self.post_as(&staff, &format!("/api/v1/quotations/{}/{}", quotation.id.as_uuid(), step))
                .await
                .assert_status_ok();
        }
        let converted = self
            .post_as(&staff, &format!("/api/v1/quotations/{}/convert", quotation.id.as_uuid()))
            .await;
        converted.assert_status(StatusCode::CREATED);
        let invoice = converted.json::<Invoice>();

        let sent = self
            .post_as(&staff, &format!("/api/v1/invoices/{}/send", invoice.id.as_uuid()))
            .await;
        sent.assert_status_ok();
        sent.json::<Invoice>()
    }
}

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_is_public() {
        let api = TestApi::new();
        let response = api.server.get("/health").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "healthy");
    }

    #[tokio::test]
    async fn test_readiness_reports_store_health() {
        let api = TestApi::new();
        let response = api.server.get("/health/ready").await;
        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "ready");
        assert_eq!(body["store"]["adapter_id"], "in-memory-document-store");
    }
}

mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let api = TestApi::new();
        api.server
            .get("/api/v1/quotations")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_signed_with_other_secret_is_unauthorized() {
        let api = TestApi::new();
        let token = create_token(&PrincipalFixtures::admin(), None, "wrong", 60).unwrap();
        api.server
            .get("/api/v1/quotations")
            .authorization_bearer(token)
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_patient_role_is_forbidden_from_billing() {
        let api = TestApi::new();
        api.server
            .get("/api/v1/invoices")
            .authorization_bearer(TestApi::token(&PrincipalFixtures::patient()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sections_follow_role() {
        let api = TestApi::new();

        let patient = api
            .server
            .get("/api/v1/me/sections")
            .authorization_bearer(TestApi::token(&PrincipalFixtures::patient()))
            .await
            .json::<Vec<Value>>();
        assert_eq!(patient.len(), 1);
        assert_eq!(patient[0]["section"], "dashboard");

        let doctor = api
            .server
            .get("/api/v1/me/sections")
            .authorization_bearer(TestApi::token(&PrincipalFixtures::doctor_a()))
            .await
            .json::<Vec<Value>>();
        let names: Vec<&str> = doctor.iter().filter_map(|s| s["section"].as_str()).collect();
        assert!(names.contains(&"quotations"));
        assert!(!names.contains(&"billing"));
    }
}

mod quotation_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_quotation_computes_gst() {
        let api = TestApi::new();
        let gait = api.create_service("Gait training", "500").await;
        let brace = api.create_service("Ankle brace", "600").await;
        let patient = api.register_patient("Meena Rao", "dr-anand").await;

        let quotation = api.create_quotation(&patient, &[(&gait, 1), (&brace, 2)]).await;

        assert_eq!(quotation.quotation_number, "DRC-QUO-001");
        assert_eq!(quotation.status, QuotationStatus::Draft);
        assert_money_eq(quotation.subtotal, dec!(1700));
        assert_money_eq(quotation.gst.total_gst, dec!(306));
        assert_money_eq(quotation.total_amount, dec!(2006));
    }

    #[tokio::test]
    async fn test_empty_items_fail_validation() {
        let api = TestApi::new();
        let patient = api.register_patient("Meena Rao", "dr-anand").await;

        let response = api
            .server
            .post("/api/v1/quotations")
            .authorization_bearer(TestApi::token(&PrincipalFixtures::front_desk()))
            .json(&json!({"patient_id": patient.id, "doctor_id": "dr-anand", "items": []}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.json::<Value>()["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_converting_draft_is_conflict() {
        let api = TestApi::new();
        let gait = api.create_service("Gait training", "500").await;
        let patient = api.register_patient("Meena Rao", "dr-anand").await;
        let quotation = api.create_quotation(&patient, &[(&gait, 1)]).await;

        let response = api
            .post_as(
                &PrincipalFixtures::front_desk(),
                &format!("/api/v1/quotations/{}/convert", quotation.id.as_uuid()),
            )
            .await;

        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "invalid_state");
    }

    #[tokio::test]
    async fn test_other_doctor_cannot_read_quotation() {
        let api = TestApi::new();
        let gait = api.create_service("Gait training", "500").await;
        let patient = api.register_patient("Meena Rao", "dr-anand").await;
        let quotation = api.create_quotation(&patient, &[(&gait, 1)]).await;
        let path = format!("/api/v1/quotations/{}", quotation.id.as_uuid());

        api.server
            .get(&path)
            .authorization_bearer(TestApi::token(&PrincipalFixtures::doctor_a()))
            .await
            .assert_status_ok();
        api.server
            .get(&path)
            .authorization_bearer(TestApi::token(&PrincipalFixtures::doctor_b()))
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_reject_without_body() {
        let api = TestApi::new();
        let staff = PrincipalFixtures::front_desk();
        let gait = api.create_service("Gait training", "500").await;
        let patient = api.register_patient("Meena Rao", "dr-anand").await;
        let quotation = api.create_quotation(&patient, &[(&gait, 1)]).await;
        let base = format!("/api/v1/quotations/{}", quotation.id.as_uuid());

        api.post_as(&staff, &format!("{}/send", base)).await.assert_status_ok();
        let rejected = api.post_as(&staff, &format!("{}/reject", base)).await;

        rejected.assert_status_ok();
        assert_eq!(rejected.json::<Quotation>().status, QuotationStatus::Rejected);
    }
}

mod invoice_tests {
    use super::*;

    #[tokio::test]
    async fn test_payments_settle_invoice() {
        let api = TestApi::new();
        let staff = PrincipalFixtures::front_desk();
        let invoice = api.sent_invoice().await;
        assert_eq!(invoice.invoice_number, "DRC-INV-001");
        let path = format!("/api/v1/invoices/{}/payments", invoice.id.as_uuid());

        let first = api
            .server
            .post(&path)
            .authorization_bearer(TestApi::token(&staff))
            .json(&json!({"amount": "1000.00", "method": "Cash"}))
            .await;
        first.assert_status(StatusCode::CREATED);
        let receipt = first.json::<PaymentReceipt>();
        assert_eq!(receipt.payment.payment_number, "DRC-PMT-001");
        assert_eq!(receipt.invoice.status, InvoiceStatus::PartiallyPaid);
        assert_invoice_balanced(&receipt.invoice);

        let second = api
            .server
            .post(&path)
            .authorization_bearer(TestApi::token(&staff))
            .json(&json!({"amount": "1006", "method": "Upi", "transaction_id": "UPI-42"}))
            .await;
        second.assert_status(StatusCode::CREATED);
        let receipt = second.json::<PaymentReceipt>();
        assert_eq!(receipt.invoice.status, InvoiceStatus::Paid);
        assert_money_eq(receipt.invoice.balance_amount, dec!(0));

        let payments = api
            .server
            .get(&path)
            .authorization_bearer(TestApi::token(&staff))
            .await
            .json::<Vec<Value>>();
        assert_eq!(payments.len(), 2);
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected() {
        let api = TestApi::new();
        let invoice = api.sent_invoice().await;

        api.server
            .post(&format!("/api/v1/invoices/{}/payments", invoice.id.as_uuid()))
            .authorization_bearer(TestApi::token(&PrincipalFixtures::front_desk()))
            .json(&json!({"amount": "5000", "method": "Cash"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_concurrent_payments_both_apply() {
        let api = TestApi::new();
        let invoice = api.sent_invoice().await;
        let path = format!("/api/v1/invoices/{}/payments", invoice.id.as_uuid());
        let token = TestApi::token(&PrincipalFixtures::front_desk());

        let (a, b) = tokio::join!(
            api.server
                .post(&path)
                .authorization_bearer(token.clone())
                .json(&json!({"amount": "1000", "method": "Cash"}))
                .into_future(),
            api.server
                .post(&path)
                .authorization_bearer(token.clone())
                .json(&json!({"amount": "1006", "method": "Cash"}))
                .into_future(),
        );
        a.assert_status(StatusCode::CREATED);
        b.assert_status(StatusCode::CREATED);

        let settled = api
            .server
            .get(&format!("/api/v1/invoices/{}", invoice.id.as_uuid()))
            .authorization_bearer(token)
            .await
            .json::<Invoice>();
        assert_eq!(settled.status, InvoiceStatus::Paid);
        assert_invoice_balanced(&settled);
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_not_found() {
        let api = TestApi::new();
        api.server
            .get(&format!("/api/v1/invoices/{}", uuid::Uuid::now_v7()))
            .authorization_bearer(TestApi::token(&PrincipalFixtures::admin()))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod claim_tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_lifecycle_over_http() {
        let api = TestApi::new();
        let staff = PrincipalFixtures::front_desk();
        let invoice = api.sent_invoice().await;

        let created = api
            .server
            .post("/api/v1/claims")
            .authorization_bearer(TestApi::token(&staff))
            .json(&json!({
                "invoice_id": invoice.id,
                "provider": "Star Health",
                "policy_number": "SH-1001",
                "claim_type": "Prosthetic",
                "submitted_amount": "2006"
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let claim = created.json::<Value>();
        assert_eq!(claim["claim_number"], "DRC-CLM-001");
        let base = format!("/api/v1/claims/{}", claim["id"].as_str().unwrap());

        api.post_as(&staff, &format!("{}/submit", base)).await.assert_status_ok();
        api.post_as(&staff, &format!("{}/review", base)).await.assert_status_ok();

        let approved = api
            .server
            .post(&format!("{}/approve", base))
            .authorization_bearer(TestApi::token(&staff))
            .json(&json!({"approved_amount": "1800"}))
            .await;
        approved.assert_status_ok();
        assert_eq!(approved.json::<Value>()["status"], "Approved");

        let paid = api.post_as(&staff, &format!("{}/paid", base)).await;
        paid.assert_status_ok();
        assert_eq!(paid.json::<Value>()["status"], "Paid");
    }
}

mod report_tests {
    use super::*;

    #[tokio::test]
    async fn test_gst_report_requires_admin() {
        let api = TestApi::new();
        api.sent_invoice().await;
        let path = "/api/v1/reports/gst?from=2024-04-01&to=2024-04-30";

        api.server
            .get(path)
            .authorization_bearer(TestApi::token(&PrincipalFixtures::front_desk()))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        let report = api
            .server
            .get(path)
            .authorization_bearer(TestApi::token(&PrincipalFixtures::admin()))
            .await;
        report.assert_status_ok();
        let body = report.json::<Value>();
        assert_eq!(body["invoice_count"], 1);
    }

    #[tokio::test]
    async fn test_summary_counts_invoices() {
        let api = TestApi::new();
        api.sent_invoice().await;

        let summary = api
            .server
            .get("/api/v1/reports/summary")
            .authorization_bearer(TestApi::token(&PrincipalFixtures::admin()))
            .await;
        summary.assert_status_ok();
        let body = summary.json::<Value>();
        assert_eq!(body["total_invoices"], 1);
        assert_eq!(body["total_quotations"], 1);
        assert_eq!(body["accepted_quotations"], 1);
    }
}
