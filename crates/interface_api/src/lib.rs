//! HTTP API Layer
//!
//! This crate exposes the clinic's patient directory and billing engine as a
//! REST API using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per resource
//! - **Middleware**: JWT authentication into a `Principal`, audit logging
//! - **DTOs**: Validated request bodies and small response envelopes
//! - **Error Handling**: Billing errors mapped onto status codes
//!
//! Authorization is not decided here: every handler passes the caller's
//! principal to the engine, which applies the role and doctor-scope rules.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{Clock, SystemClock};
use domain_billing::{BillingEngine, BillingError, DocumentStore, PatientDirectory};

use crate::config::ApiConfig;
use crate::handlers::{claims, health, invoices, patients, quotations, reports, services};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: BillingEngine,
    pub directory: PatientDirectory,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the engines to `store` with the system clock
    pub fn new(store: Arc<dyn DocumentStore>, config: ApiConfig) -> Result<Self, BillingError> {
        Self::with_clock(store, Arc::new(SystemClock), config)
    }

    pub fn with_clock(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: ApiConfig,
    ) -> Result<Self, BillingError> {
        let engine = BillingEngine::new(store.clone(), clock.clone(), config.billing_config())?;
        let directory = PatientDirectory::new(store, clock);
        Ok(Self {
            engine,
            directory,
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let patient_routes = Router::new()
        .route("/", get(patients::list_patients).post(patients::register_patient))
        .route("/:id", get(patients::get_patient))
        .route("/:id/consulting-doctors", post(patients::add_consulting_doctor));

    let service_routes = Router::new()
        .route("/", get(services::list_services).post(services::create_service))
        .route("/:id", get(services::get_service).put(services::update_service))
        .route("/:id/deactivate", post(services::deactivate_service));

    let quotation_routes = Router::new()
        .route("/", get(quotations::list_quotations).post(quotations::create_quotation))
        .route("/expire", post(quotations::expire_quotations))
        .route("/:id", get(quotations::get_quotation))
        .route("/:id/items", put(quotations::update_items))
        .route("/:id/send", post(quotations::send_quotation))
        .route("/:id/view", post(quotations::mark_viewed))
        .route("/:id/accept", post(quotations::accept_quotation))
        .route("/:id/reject", post(quotations::reject_quotation))
        .route("/:id/convert", post(quotations::convert_to_invoice));

    let invoice_routes = Router::new()
        .route("/", get(invoices::list_invoices).post(invoices::create_invoice))
        .route("/overdue", post(invoices::mark_overdue))
        .route("/:id", get(invoices::get_invoice))
        .route("/:id/send", post(invoices::send_invoice))
        .route("/:id/cancel", post(invoices::cancel_invoice))
        .route(
            "/:id/payments",
            get(invoices::list_invoice_payments).post(invoices::record_payment),
        );

    let claim_routes = Router::new()
        .route("/", get(claims::list_claims).post(claims::create_claim))
        .route("/:id", get(claims::get_claim))
        .route("/:id/submit", post(claims::submit_claim))
        .route("/:id/review", post(claims::start_review))
        .route("/:id/hold", post(claims::hold_claim))
        .route("/:id/approve", post(claims::approve_claim))
        .route("/:id/reject", post(claims::reject_claim))
        .route("/:id/paid", post(claims::mark_paid));

    let report_routes = Router::new()
        .route("/summary", get(reports::billing_summary))
        .route("/gst", get(reports::gst_report));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/patients", patient_routes)
        .nest("/services", service_routes)
        .nest("/quotations", quotation_routes)
        .nest("/invoices", invoice_routes)
        .route("/payments", get(invoices::list_payments))
        .nest("/claims", claim_routes)
        .nest("/reports", report_routes)
        .route("/me/sections", get(reports::my_sections))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
