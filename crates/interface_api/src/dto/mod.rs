//! Request and response bodies
//!
//! Requests are validated with `validator` before reaching the engine, which
//! still enforces every business rule itself.

pub mod billing;
pub mod claims;
pub mod patients;
pub mod services;

use core_kernel::Money;
use validator::ValidationError;

pub(crate) fn positive_amount(amount: &Money) -> Result<(), ValidationError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

pub(crate) fn non_negative_amount(amount: &Money) -> Result<(), ValidationError> {
    if amount.is_negative() {
        Err(ValidationError::new("must_not_be_negative"))
    } else {
        Ok(())
    }
}
