//! Insurance claim DTOs

use serde::Deserialize;
use validator::Validate;

use core_kernel::{InvoiceId, Money};
use domain_billing::{ClaimRequest, ClaimType};

use super::positive_amount;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClaimRequest {
    pub invoice_id: InvoiceId,
    #[validate(length(min = 1, max = 200))]
    pub provider: String,
    #[validate(length(min = 1, max = 100))]
    pub policy_number: String,
    pub claim_type: ClaimType,
    #[validate(custom(function = "positive_amount"))]
    pub submitted_amount: Money,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<CreateClaimRequest> for ClaimRequest {
    fn from(request: CreateClaimRequest) -> Self {
        ClaimRequest {
            invoice_id: request.invoice_id,
            provider: request.provider,
            policy_number: request.policy_number,
            claim_type: request.claim_type,
            submitted_amount: request.submitted_amount,
            notes: request.notes,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ApproveClaimRequest {
    #[validate(custom(function = "positive_amount"))]
    pub approved_amount: Money,
}
