//! Service catalog DTOs

use serde::Deserialize;
use validator::Validate;

use core_kernel::Money;
use domain_access::DoctorId;
use domain_billing::{GstRate, NewService, ServiceCategory, ServiceUpdate};

use super::non_negative_amount;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub category: ServiceCategory,
    #[validate(custom(function = "non_negative_amount"))]
    pub price: Money,
    #[validate(length(min = 4, max = 8))]
    pub hsn_code: String,
    pub gst_rate: GstRate,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub doctor_id: Option<String>,
}

impl From<CreateServiceRequest> for NewService {
    fn from(request: CreateServiceRequest) -> Self {
        NewService {
            name: request.name,
            category: request.category,
            price: request.price,
            hsn_code: request.hsn_code,
            gst_rate: request.gst_rate,
            description: request.description,
            doctor_id: request.doctor_id.map(DoctorId::new),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub category: Option<ServiceCategory>,
    #[validate(custom(function = "non_negative_amount"))]
    pub price: Option<Money>,
    #[validate(length(min = 4, max = 8))]
    pub hsn_code: Option<String>,
    pub gst_rate: Option<GstRate>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateServiceRequest> for ServiceUpdate {
    fn from(request: UpdateServiceRequest) -> Self {
        ServiceUpdate {
            name: request.name,
            category: request.category,
            price: request.price,
            hsn_code: request.hsn_code,
            gst_rate: request.gst_rate,
            description: request.description,
            is_active: request.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceListQuery {
    pub active: Option<bool>,
}
