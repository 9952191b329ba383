//! Billing engine
//!
//! [`BillingEngine`] is the entry point for every billing operation. It holds
//! no mutable state of its own: each call takes the acting [`Principal`],
//! reads what it needs from the [`DocumentStore`], validates, and commits
//! its writes in a single [`WriteBatch`]. Updates carry the version they
//! were read at, so a competing writer surfaces as
//! [`BillingError::ConcurrencyConflict`] rather than a lost update.
//!
//! Document numbers are issued only after every precondition has passed, so
//! a rejected request never consumes a number. A commit that fails after
//! numbering leaves a gap in the sequence; numbers are never reused.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use core_kernel::{Clock, CoreError, RetryPolicy, ServiceId};
use domain_access::{AccessFilter, DoctorId, Principal, Role};

use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::items::{LineItem, LineItemRequest};
use crate::quotation::Quotation;
use crate::sequence::NumberSequenceGenerator;
use crate::service::{NewService, Service, ServiceUpdate};
use crate::store::{fetch, fetch_all, Document, DocumentQuery, DocumentStore, Versioned, WriteBatch};
use crate::summary::{BillingSummary, GstReport};

/// Roles that maintain the service catalog
pub const CATALOG_MANAGERS: [Role; 2] = [Role::SuperAdmin, Role::Admin];

/// Roles that prepare quotations
pub const QUOTATION_ROLES: [Role; 4] = [
    Role::SuperAdmin,
    Role::Admin,
    Role::FrontDeskStaff,
    Role::Doctor,
];

/// Roles that issue invoices, take payments and file claims
pub const BILLING_CLERKS: [Role; 3] = [Role::SuperAdmin, Role::Admin, Role::FrontDeskStaff];

/// Roles that see tax reports
pub const REPORT_ROLES: [Role; 2] = [Role::SuperAdmin, Role::Admin];

/// Business settings for the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Default validity of a new quotation
    pub quotation_validity_days: i64,
    /// Days between invoice date and due date
    pub invoice_due_days: i64,
    /// Whether documents default to IGST
    pub inter_state_default: bool,
    /// Retry policy callers apply around mutating operations
    pub retry: RetryPolicy,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            quotation_validity_days: 30,
            invoice_due_days: 30,
            inter_state_default: false,
            retry: RetryPolicy::default(),
        }
    }
}

impl BillingConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.quotation_validity_days <= 0 {
            return Err(CoreError::configuration("quotation_validity_days must be positive"));
        }
        if self.invoice_due_days < 0 {
            return Err(CoreError::configuration("invoice_due_days cannot be negative"));
        }
        if self.retry.max_attempts == 0 {
            return Err(CoreError::configuration("retry max_attempts must be at least 1"));
        }
        Ok(())
    }
}

/// Service catalog → quotation → invoice → payment → claim workflow
#[derive(Clone)]
pub struct BillingEngine {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) sequences: NumberSequenceGenerator,
    pub(crate) config: BillingConfig,
}

impl BillingEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        config: BillingConfig,
    ) -> Result<Self, BillingError> {
        config.validate()?;
        Ok(Self {
            sequences: NumberSequenceGenerator::new(store.clone()),
            store,
            clock,
            config,
        })
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    // ---- shared helpers ----

    pub(crate) fn require_role(
        &self,
        principal: &Principal,
        allowed: &[Role],
        action: &str,
    ) -> Result<(), BillingError> {
        principal.validate()?;
        if !allowed.contains(&principal.role) {
            warn!(principal = %principal.id, role = %principal.role, action, "Access denied");
            return Err(BillingError::access_denied(format!(
                "{} cannot {}",
                principal.role, action
            )));
        }
        Ok(())
    }

    pub(crate) fn require_staff(
        &self,
        principal: &Principal,
        action: &str,
    ) -> Result<(), BillingError> {
        principal.validate()?;
        if !principal.role.is_staff() {
            return Err(BillingError::access_denied(format!(
                "{} cannot {}",
                principal.role, action
            )));
        }
        Ok(())
    }

    /// Fails unless the principal may see a document owned by `owner`
    pub(crate) fn require_owner(
        &self,
        principal: &Principal,
        owner: &DoctorId,
        entity: &str,
        id: impl std::fmt::Display,
    ) -> Result<(), BillingError> {
        if !AccessFilter::new(principal).owns_doctor_document(owner) {
            return Err(BillingError::access_denied(format!("{} {} is not visible", entity, id)));
        }
        Ok(())
    }

    pub(crate) async fn load<T: Document>(
        &self,
        entity: &str,
        id: Uuid,
    ) -> Result<Versioned<T>, BillingError> {
        fetch::<T>(self.store.as_ref(), id)
            .await?
            .ok_or_else(|| BillingError::not_found(entity, id))
    }

    pub(crate) async fn load_all<T: Document>(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<T>, BillingError> {
        Ok(fetch_all::<T>(self.store.as_ref(), query)
            .await?
            .into_iter()
            .map(|versioned| versioned.value)
            .collect())
    }

    /// Writes back a document read at `version`
    pub(crate) async fn save<T: Document>(
        &self,
        document: &T,
        version: u64,
    ) -> Result<(), BillingError> {
        self.store
            .commit(WriteBatch::new().update(document, version)?)
            .await?;
        Ok(())
    }

    /// Prices each requested line from the active catalog
    /// Prices requested lines from the catalog. A doctor may only bill
    /// services open to everyone or scoped to themselves.
    pub(crate) async fn resolve_items(
        &self,
        principal: &Principal,
        requests: &[LineItemRequest],
    ) -> Result<Vec<LineItem>, BillingError> {
        if requests.is_empty() {
            return Err(BillingError::validation("At least one item is required"));
        }
        let filter = AccessFilter::new(principal);
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            let service = self
                .load::<Service>("Service", *request.service_id.as_uuid())
                .await?
                .value;
            if !filter.can_access_doctor_scoped(service.doctor_id.as_ref()) {
                return Err(BillingError::access_denied(format!(
                    "Service {} is not visible",
                    service.id
                )));
            }
            items.push(LineItem::from_service(&service, request)?);
        }
        Ok(items)
    }

    // ---- service catalog ----

    #[instrument(skip(self, principal, new), fields(role = %principal.role))]
    pub async fn create_service(
        &self,
        principal: &Principal,
        new: NewService,
    ) -> Result<Service, BillingError> {
        self.require_role(principal, &CATALOG_MANAGERS, "manage services")?;
        let service = Service::create(new, self.now())?;
        self.store.commit(WriteBatch::new().insert(&service)?).await?;
        info!(service_id = %service.id, name = %service.name, "Created service");
        Ok(service)
    }

    /// Changes a catalog entry; lines already issued keep their copied price
    #[instrument(skip(self, principal, update), fields(role = %principal.role, service_id = %id))]
    pub async fn update_service(
        &self,
        principal: &Principal,
        id: ServiceId,
        update: ServiceUpdate,
    ) -> Result<Service, BillingError> {
        self.require_role(principal, &CATALOG_MANAGERS, "manage services")?;
        let Versioned { value: mut service, version } =
            self.load::<Service>("Service", *id.as_uuid()).await?;
        service.apply(update, self.now())?;
        self.save(&service, version).await?;
        info!("Updated service");
        Ok(service)
    }

    #[instrument(skip(self, principal), fields(role = %principal.role, service_id = %id))]
    pub async fn deactivate_service(
        &self,
        principal: &Principal,
        id: ServiceId,
    ) -> Result<Service, BillingError> {
        self.require_role(principal, &CATALOG_MANAGERS, "manage services")?;
        let Versioned { value: mut service, version } =
            self.load::<Service>("Service", *id.as_uuid()).await?;
        service.deactivate(self.now());
        self.save(&service, version).await?;
        info!("Deactivated service");
        Ok(service)
    }

    pub async fn get_service(
        &self,
        principal: &Principal,
        id: ServiceId,
    ) -> Result<Service, BillingError> {
        self.require_staff(principal, "view services")?;
        let service = self.load::<Service>("Service", *id.as_uuid()).await?.value;
        if !AccessFilter::new(principal).can_access_doctor_scoped(service.doctor_id.as_ref()) {
            return Err(BillingError::access_denied(format!("Service {} is not visible", id)));
        }
        Ok(service)
    }

    /// Catalog entries ordered by category, then name
    ///
    /// `active` filters on the active flag when given. Doctors see services
    /// open to everyone plus their own.
    pub async fn list_services(
        &self,
        principal: &Principal,
        active: Option<bool>,
    ) -> Result<Vec<Service>, BillingError> {
        self.require_staff(principal, "view services")?;
        let mut query = DocumentQuery::of::<Service>();
        if let Some(active) = active {
            query = query.where_eq("is_active", active);
        }
        let filter = AccessFilter::new(principal);
        let mut services: Vec<Service> = self
            .load_all::<Service>(&query)
            .await?
            .into_iter()
            .filter(|service| filter.can_access_doctor_scoped(service.doctor_id.as_ref()))
            .collect();
        services.sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
        Ok(services)
    }

    // ---- reports ----

    /// Summary over the invoices and quotations visible to the principal
    pub async fn billing_summary(
        &self,
        principal: &Principal,
    ) -> Result<BillingSummary, BillingError> {
        self.require_staff(principal, "view the billing summary")?;
        let filter = AccessFilter::new(principal);
        let invoices: Vec<Invoice> = self
            .load_all::<Invoice>(&DocumentQuery::of::<Invoice>())
            .await?
            .into_iter()
            .filter(|invoice| filter.owns_doctor_document(&invoice.doctor_id))
            .collect();
        let quotations: Vec<Quotation> = self
            .load_all::<Quotation>(&DocumentQuery::of::<Quotation>())
            .await?
            .into_iter()
            .filter(|quotation| filter.owns_doctor_document(&quotation.doctor_id))
            .collect();
        Ok(BillingSummary::compute(&invoices, &quotations, self.today()))
    }

    /// GST collected on invoices dated `from..=to`
    pub async fn gst_report(
        &self,
        principal: &Principal,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<GstReport, BillingError> {
        self.require_role(principal, &REPORT_ROLES, "view GST reports")?;
        if from > to {
            return Err(BillingError::validation("Report period starts after it ends"));
        }
        let invoices = self.load_all::<Invoice>(&DocumentQuery::of::<Invoice>()).await?;
        Ok(GstReport::compute(&invoices, from, to))
    }
}
