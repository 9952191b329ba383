//! Request handlers
//!
//! Every mutating handler runs its engine call through [`with_retry`], so a
//! request that loses a compare-and-swap re-reads and tries again before the
//! client ever sees a conflict.

pub mod claims;
pub mod health;
pub mod invoices;
pub mod patients;
pub mod quotations;
pub mod reports;
pub mod services;

use std::future::Future;

use domain_billing::{with_retry, BillingError};

use crate::error::ApiError;
use crate::AppState;

pub(crate) async fn retrying<T, F, Fut>(
    state: &AppState,
    operation: &str,
    f: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BillingError>>,
{
    Ok(with_retry(state.engine.retry_policy(), operation, f).await?)
}
