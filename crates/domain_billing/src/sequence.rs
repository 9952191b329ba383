//! Document number sequences
//!
//! Every numbered entity type has one counter. Counters only move through
//! [`DocumentStore::next_sequence_value`], which increments and reads
//! atomically, so concurrent callers never observe the same value. Numbers
//! are never reused, and a failed operation may leave a gap.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BillingError;
use crate::store::DocumentStore;

/// Entity types that receive a document number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Quotation,
    Invoice,
    Payment,
    Claim,
}

impl EntityType {
    pub const ALL: [EntityType; 4] = [
        EntityType::Quotation,
        EntityType::Invoice,
        EntityType::Payment,
        EntityType::Claim,
    ];

    /// Fixed number prefix for the entity type
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityType::Quotation => "DRC-QUO",
            EntityType::Invoice => "DRC-INV",
            EntityType::Payment => "DRC-PMT",
            EntityType::Claim => "DRC-CLM",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Quotation => "quotation",
            EntityType::Invoice => "invoice",
            EntityType::Payment => "payment",
            EntityType::Claim => "claim",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|entity| entity.as_str() == s)
            .ok_or_else(|| BillingError::validation(format!("Unknown entity type: {s}")))
    }
}

/// Counter state for one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberSequence {
    pub entity_type: EntityType,
    pub prefix: String,
    /// Last number issued
    pub current_number: u64,
    pub last_updated: DateTime<Utc>,
}

impl NumberSequence {
    /// A counter that has not issued anything yet
    pub fn start(entity_type: EntityType, now: DateTime<Utc>) -> Self {
        Self {
            entity_type,
            prefix: entity_type.prefix().to_string(),
            current_number: 0,
            last_updated: now,
        }
    }

    /// Advances the counter and returns the new value
    pub fn advance(&mut self, now: DateTime<Utc>) -> u64 {
        self.current_number += 1;
        self.last_updated = now;
        self.current_number
    }

    /// Formatted form of the last issued number
    pub fn formatted(&self) -> String {
        format_document_number(self.entity_type, self.current_number)
    }
}

/// Formats `{prefix}-{n:03}`; widens past 999 instead of wrapping
pub fn format_document_number(entity: EntityType, number: u64) -> String {
    format!("{}-{:03}", entity.prefix(), number)
}

/// Splits a document number back into its entity type and counter
pub fn parse_document_number(value: &str) -> Result<(EntityType, u64), BillingError> {
    let invalid = || BillingError::validation(format!("Invalid document number: {value}"));

    let (prefix, digits) = value.rsplit_once('-').ok_or_else(invalid)?;
    let entity = EntityType::ALL
        .into_iter()
        .find(|entity| entity.prefix() == prefix)
        .ok_or_else(invalid)?;

    if digits.len() < 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let number: u64 = digits.parse().map_err(|_| invalid())?;
    if number == 0 {
        return Err(invalid());
    }
    Ok((entity, number))
}

/// Issues formatted document numbers from the store's counters
#[derive(Clone)]
pub struct NumberSequenceGenerator {
    store: Arc<dyn DocumentStore>,
}

impl NumberSequenceGenerator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Returns the next number for `entity`, e.g. `DRC-INV-007`
    pub async fn next_number(&self, entity: EntityType) -> Result<String, BillingError> {
        let sequence = self.store.next_sequence_value(entity).await?;
        let number = sequence.formatted();
        debug!(entity = %entity, number = %number, "Issued document number");
        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three_digits() {
        assert_eq!(format_document_number(EntityType::Quotation, 1), "DRC-QUO-001");
        assert_eq!(format_document_number(EntityType::Claim, 42), "DRC-CLM-042");
        assert_eq!(format_document_number(EntityType::Invoice, 1000), "DRC-INV-1000");
    }

    #[test]
    fn test_parse_round_trip() {
        assert_eq!(
            parse_document_number("DRC-PMT-007").unwrap(),
            (EntityType::Payment, 7)
        );
        assert_eq!(
            parse_document_number("DRC-QUO-1000").unwrap(),
            (EntityType::Quotation, 1000)
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for value in ["DRC-QUO-7", "DRC-XYZ-001", "DRC-INV-000", "DRC-INV-0a1", "INV001"] {
            assert!(parse_document_number(value).is_err(), "{value}");
        }
    }

    #[test]
    fn test_sequence_advance() {
        let now = Utc::now();
        let mut seq = NumberSequence::start(EntityType::Invoice, now);
        assert_eq!(seq.advance(now), 1);
        assert_eq!(seq.advance(now), 2);
        assert_eq!(seq.formatted(), "DRC-INV-002");
    }
}
