//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data shared across the clinic crates.
//! These fixtures are designed to be consistent and predictable for unit tests.

use chrono::{DateTime, TimeZone, Utc};
use core_kernel::Money;
use domain_access::{DoctorId, Principal, Role};
use rust_decimal_macros::dec;

/// Fixture for principals of every role
pub struct PrincipalFixtures;

impl PrincipalFixtures {
    pub fn superadmin() -> Principal {
        Principal::new("user-superadmin", Role::SuperAdmin).with_name("Super Admin")
    }

    pub fn admin() -> Principal {
        Principal::new("user-admin", Role::Admin).with_name("Clinic Admin")
    }

    pub fn front_desk() -> Principal {
        Principal::new("user-frontdesk", Role::FrontDeskStaff).with_name("Front Desk")
    }

    /// Doctor scoped to [`IdFixtures::doctor_a`]
    pub fn doctor_a() -> Principal {
        Principal::doctor("user-dr-a", IdFixtures::doctor_a()).with_name("Dr. Anand")
    }

    /// Doctor scoped to [`IdFixtures::doctor_b`]
    pub fn doctor_b() -> Principal {
        Principal::doctor("user-dr-b", IdFixtures::doctor_b()).with_name("Dr. Bhat")
    }

    pub fn patient() -> Principal {
        Principal::new("user-patient", Role::Patient)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn doctor_a() -> DoctorId {
        DoctorId::new("dr-anand")
    }

    pub fn doctor_b() -> DoctorId {
        DoctorId::new("dr-bhat")
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Instant the test clock starts at (Apr 1, 2024, 09:00 UTC)
    pub fn clinic_open() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()
    }
}

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn consultation_fee() -> Money {
        Money::new(dec!(500))
    }

    pub fn brace_price() -> Money {
        Money::new(dec!(600))
    }

    pub fn prosthesis_price() -> Money {
        Money::new(dec!(45000))
    }
}
