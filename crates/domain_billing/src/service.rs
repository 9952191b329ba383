//! Service catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{Money, ServiceId};
use domain_access::DoctorId;

use crate::error::BillingError;
use crate::store::{Collection, Document};
use crate::tax::GstRate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ServiceCategory {
    Consultation,
    Physiotherapy,
    Prosthetics,
    Orthotics,
    MobilityAid,
    MedicalDevice,
    MedicalEquipment,
    MedicalSupply,
    Wellness,
}

/// A billable catalog entry
///
/// Quotation and invoice lines copy the price and tax fields, so editing a
/// service never changes documents already issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub category: ServiceCategory,
    pub price: Money,
    /// HSN/SAC classification code
    pub hsn_code: String,
    pub gst_rate: GstRate,
    pub description: Option<String>,
    pub is_active: bool,
    /// Set when only this doctor offers the service
    pub doctor_id: Option<DoctorId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for a new catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub category: ServiceCategory,
    pub price: Money,
    pub hsn_code: String,
    pub gst_rate: GstRate,
    pub description: Option<String>,
    pub doctor_id: Option<DoctorId>,
}

/// Partial update of a catalog entry; `None` leaves a field unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub category: Option<ServiceCategory>,
    pub price: Option<Money>,
    pub hsn_code: Option<String>,
    pub gst_rate: Option<GstRate>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl Service {
    pub fn create(new: NewService, now: DateTime<Utc>) -> Result<Self, BillingError> {
        let service = Self {
            id: ServiceId::new_v7(),
            name: new.name.trim().to_string(),
            category: new.category,
            price: new.price,
            hsn_code: new.hsn_code.trim().to_string(),
            gst_rate: new.gst_rate,
            description: new.description,
            is_active: true,
            doctor_id: new.doctor_id.filter(|id| !id.is_blank()),
            created_at: now,
            updated_at: now,
        };
        service.validate()?;
        Ok(service)
    }

    pub fn apply(&mut self, update: ServiceUpdate, now: DateTime<Utc>) -> Result<(), BillingError> {
        let mut next = self.clone();
        if let Some(name) = update.name {
            next.name = name.trim().to_string();
        }
        if let Some(category) = update.category {
            next.category = category;
        }
        if let Some(price) = update.price {
            next.price = price;
        }
        if let Some(hsn_code) = update.hsn_code {
            next.hsn_code = hsn_code.trim().to_string();
        }
        if let Some(gst_rate) = update.gst_rate {
            next.gst_rate = gst_rate;
        }
        if let Some(description) = update.description {
            next.description = Some(description);
        }
        if let Some(is_active) = update.is_active {
            next.is_active = is_active;
        }
        next.validate()?;
        next.updated_at = now;
        *self = next;
        Ok(())
    }

    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = now;
    }

    fn validate(&self) -> Result<(), BillingError> {
        if self.name.is_empty() {
            return Err(BillingError::validation("Service name is required"));
        }
        if self.price.is_negative() {
            return Err(BillingError::validation("Service price cannot be negative"));
        }
        if self.price.rounded() != self.price {
            return Err(BillingError::validation(
                "Service price cannot have more than two decimal places",
            ));
        }
        let code_ok = (4..=8).contains(&self.hsn_code.len())
            && self.hsn_code.bytes().all(|b| b.is_ascii_digit());
        if !code_ok {
            return Err(BillingError::validation(format!(
                "HSN code must be 4 to 8 digits (got {:?})",
                self.hsn_code
            )));
        }
        Ok(())
    }
}

impl Document for Service {
    const COLLECTION: Collection = Collection::Services;

    fn document_id(&self) -> Uuid {
        *self.id.as_uuid()
    }
}
