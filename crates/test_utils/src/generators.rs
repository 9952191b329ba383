//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random test data
//! that maintains domain invariants.

use core_kernel::Money;
use domain_access::{DoctorId, Principal, Role};
use domain_billing::GstRate;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for every role
pub fn role_strategy() -> impl Strategy<Value = Role> {
    prop::sample::select(Role::ALL.to_vec())
}

/// Strategy for doctor ids drawn from a small pool, so collisions happen
pub fn doctor_id_strategy() -> impl Strategy<Value = DoctorId> {
    prop::sample::select(vec!["dr-a", "dr-b", "dr-c", "dr-d"]).prop_map(DoctorId::new)
}

/// Strategy for principals of any role, doctors always scoped
pub fn principal_strategy() -> impl Strategy<Value = Principal> {
    (role_strategy(), doctor_id_strategy()).prop_map(|(role, doctor)| match role {
        Role::Doctor => Principal::doctor(format!("user-{}", doctor), doctor),
        other => Principal::new(format!("user-{}", other), other),
    })
}

/// Strategy for GST slabs
pub fn gst_rate_strategy() -> impl Strategy<Value = GstRate> {
    prop::sample::select(GstRate::ALL.to_vec())
}

/// Strategy for amounts in paise
pub fn paise_strategy() -> impl Strategy<Value = i64> {
    0i64..100_000_000i64
}

/// Strategy for non-negative prices with at most two decimal places
pub fn price_strategy() -> impl Strategy<Value = Money> {
    paise_strategy().prop_map(Money::from_minor)
}

/// Strategy for positive prices with at most two decimal places
pub fn positive_price_strategy() -> impl Strategy<Value = Money> {
    (1i64..100_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for a decimal with up to four places, e.g. unrounded amounts
pub fn fine_decimal_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 4))
}
