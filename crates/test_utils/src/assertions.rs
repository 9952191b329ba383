//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for billing types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_billing::{parse_document_number, BillingError, EntityType, ErrorKind, Invoice};
use rust_decimal::Decimal;

/// Asserts that a result failed with the given error kind
pub fn assert_error_kind<T: std::fmt::Debug>(result: Result<T, BillingError>, expected: ErrorKind) {
    match result {
        Ok(value) => panic!("Expected {:?} error, got Ok({:?})", expected, value),
        Err(err) => assert_eq!(
            err.kind(),
            expected,
            "Expected {:?} error, got {:?}: {}",
            expected,
            err.kind(),
            err
        ),
    }
}

/// Asserts the invoice balance invariant: paid + balance = total, balance ≥ 0
pub fn assert_invoice_balanced(invoice: &Invoice) {
    assert!(
        !invoice.balance_amount.is_negative(),
        "Invoice {} has negative balance {}",
        invoice.invoice_number,
        invoice.balance_amount
    );
    assert_eq!(
        invoice.paid_amount + invoice.balance_amount,
        invoice.total_amount,
        "Invoice {} does not balance: paid={}, balance={}, total={}",
        invoice.invoice_number,
        invoice.paid_amount,
        invoice.balance_amount,
        invoice.total_amount
    );
}

/// Asserts that `number` is a well-formed document number for `entity`
pub fn assert_document_number(number: &str, entity: EntityType) -> u64 {
    match parse_document_number(number) {
        Ok((parsed, n)) => {
            assert_eq!(parsed, entity, "{} is not a {} number", number, entity);
            n
        }
        Err(err) => panic!("{} is not a document number: {}", number, err),
    }
}

/// Asserts that a Money value equals a decimal amount
pub fn assert_money_eq(actual: Money, expected: Decimal) {
    assert_eq!(
        actual.amount(),
        expected,
        "Money mismatch: actual={}, expected={}",
        actual,
        expected
    );
}
