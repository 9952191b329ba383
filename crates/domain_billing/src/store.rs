//! Document Store Port
//!
//! The billing engine persists every aggregate as a JSON document in a named
//! collection. The port offers exactly what the workflows need:
//!
//! - point reads and equality-filtered queries with ordering and a limit
//! - all-or-nothing batch commits, where updates carry the version they were
//!   read at (compare-and-swap)
//! - an atomic increment-and-read for number sequences
//!
//! # Adapters
//!
//! - [`InMemoryDocumentStore`](crate::memory::InMemoryDocumentStore) for
//!   tests and database-less deployments
//! - `PostgresDocumentStore` in `infra_db`

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckable, PortError};

use crate::sequence::{EntityType, NumberSequence};

/// Named collections held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    Patients,
    Services,
    Quotations,
    Invoices,
    Payments,
    InsuranceClaims,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Patients,
        Collection::Services,
        Collection::Quotations,
        Collection::Invoices,
        Collection::Payments,
        Collection::InsuranceClaims,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Patients => "patients",
            Collection::Services => "services",
            Collection::Quotations => "quotations",
            Collection::Invoices => "invoices",
            Collection::Payments => "payments",
            Collection::InsuranceClaims => "insurance-claims",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw document as held by the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    /// Starts at 1 and increases by one on every committed update
    pub version: u64,
    pub body: Value,
}

impl StoredDocument {
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, PortError> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            PortError::transformation(format!("Failed to decode document {}: {}", self.id, e))
        })
    }
}

/// An aggregate stored as a document
pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn document_id(&self) -> Uuid;
}

/// A decoded document together with the version it was read at
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Equality-filtered query over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub collection: Collection,
    /// Top-level field equality filters, all of which must hold
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl DocumentQuery {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
            limit: None,
        }
    }

    pub fn of<T: Document>() -> Self {
        Self::new(T::COLLECTION)
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.filters.push((field.into(), value));
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether a document body satisfies every filter
    pub fn matches(&self, body: &Value) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| body.get(field).unwrap_or(&Value::Null) == expected)
    }

    /// JSON object of the filters, for stores that support containment
    pub fn filter_object(&self) -> Value {
        Value::Object(self.filters.iter().cloned().collect())
    }

    /// Orders and truncates already-filtered documents
    ///
    /// The sort is stable, so documents comparing equal keep the order the
    /// store produced them in.
    pub fn arrange(&self, mut documents: Vec<StoredDocument>) -> Vec<StoredDocument> {
        if let Some((field, direction)) = &self.order_by {
            documents.sort_by(|a, b| {
                let ordering = compare_values(
                    a.body.get(field).unwrap_or(&Value::Null),
                    b.body.get(field).unwrap_or(&Value::Null),
                );
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }
        if let Some(limit) = self.limit {
            documents.truncate(limit);
        }
        documents
    }
}

/// Orders JSON scalars: nulls first, then numbers, timestamps and strings
///
/// Decimal amounts are serialized as strings, so strings that parse as
/// numbers compare numerically. RFC 3339 timestamps compare as instants.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            if let (Ok(x), Ok(y)) = (
                DateTime::<FixedOffset>::parse_from_rfc3339(x),
                DateTime::<FixedOffset>::parse_from_rfc3339(y),
            ) {
                return x.cmp(&y);
            }
            if let (Ok(x), Ok(y)) = (x.parse::<Decimal>(), y.parse::<Decimal>()) {
                return x.cmp(&y);
            }
            x.cmp(y)
        }
        _ => Ordering::Equal,
    }
}

/// One mutation inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Creates a document; fails if the id already exists
    Insert {
        collection: Collection,
        id: Uuid,
        body: Value,
    },
    /// Replaces a document; fails unless it is still at `expected_version`
    Update {
        collection: Collection,
        id: Uuid,
        expected_version: u64,
        body: Value,
    },
}

impl Write {
    pub fn collection(&self) -> Collection {
        match self {
            Write::Insert { collection, .. } | Write::Update { collection, .. } => *collection,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Write::Insert { id, .. } | Write::Update { id, .. } => *id,
        }
    }
}

/// Writes applied together or not at all
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub writes: Vec<Write>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Document>(mut self, document: &T) -> Result<Self, PortError> {
        self.writes.push(Write::Insert {
            collection: T::COLLECTION,
            id: document.document_id(),
            body: encode(document)?,
        });
        Ok(self)
    }

    pub fn update<T: Document>(
        mut self,
        document: &T,
        expected_version: u64,
    ) -> Result<Self, PortError> {
        self.writes.push(Write::Update {
            collection: T::COLLECTION,
            id: document.document_id(),
            expected_version,
            body: encode(document)?,
        });
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

fn encode<T: Serialize>(document: &T) -> Result<Value, PortError> {
    serde_json::to_value(document)
        .map_err(|e| PortError::transformation(format!("Failed to encode document: {}", e)))
}

/// Persistence collaborator for the billing engine
#[async_trait]
pub trait DocumentStore: DomainPort + HealthCheckable {
    /// Reads one document, `None` when absent
    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, PortError>;

    /// Runs an equality-filtered query
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<StoredDocument>, PortError>;

    /// Applies every write or none of them
    ///
    /// Fails with [`PortError::Conflict`] when an insert hits an existing id
    /// or an update's expected version no longer matches.
    async fn commit(&self, batch: WriteBatch) -> Result<(), PortError>;

    /// Atomically increments the counter for `entity` and returns it
    ///
    /// The first call for an entity type yields 1.
    async fn next_sequence_value(&self, entity: EntityType) -> Result<NumberSequence, PortError>;
}

/// Reads and decodes one document
pub async fn fetch<T: Document>(
    store: &dyn DocumentStore,
    id: Uuid,
) -> Result<Option<Versioned<T>>, PortError> {
    match store.get(T::COLLECTION, id).await? {
        Some(document) => Ok(Some(Versioned {
            value: document.decode()?,
            version: document.version,
        })),
        None => Ok(None),
    }
}

/// Runs a query and decodes every result
pub async fn fetch_all<T: Document>(
    store: &dyn DocumentStore,
    query: &DocumentQuery,
) -> Result<Vec<Versioned<T>>, PortError> {
    store
        .query(query)
        .await?
        .iter()
        .map(|document| -> Result<Versioned<T>, PortError> {
            Ok(Versioned {
                value: document.decode()?,
                version: document.version,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(body: Value) -> StoredDocument {
        StoredDocument {
            id: Uuid::now_v7(),
            version: 1,
            body,
        }
    }

    #[test]
    fn test_query_matches_all_filters() {
        let query = DocumentQuery::new(Collection::Invoices)
            .where_eq("status", "Sent")
            .where_eq("doctor_id", "dr-a");

        assert!(query.matches(&json!({"status": "Sent", "doctor_id": "dr-a", "x": 1})));
        assert!(!query.matches(&json!({"status": "Sent", "doctor_id": "dr-b"})));
        assert!(!query.matches(&json!({"status": "Sent"})));
        assert_eq!(query.filter_object(), json!({"status": "Sent", "doctor_id": "dr-a"}));
    }

    #[test]
    fn test_arrange_orders_timestamps_as_instants() {
        let query = DocumentQuery::new(Collection::Quotations)
            .order_by("created_date", SortDirection::Descending)
            .limit(2);
        let docs = vec![
            doc(json!({"created_date": "2024-01-01T10:00:00Z"})),
            doc(json!({"created_date": "2024-01-01T10:00:00.500Z"})),
            doc(json!({"created_date": "2023-12-31T10:00:00Z"})),
        ];

        let arranged = query.arrange(docs);
        assert_eq!(arranged.len(), 2);
        assert_eq!(arranged[0].body["created_date"], "2024-01-01T10:00:00.500Z");
        assert_eq!(arranged[1].body["created_date"], "2024-01-01T10:00:00Z");
    }

    #[test]
    fn test_compare_decimal_strings_numerically() {
        assert_eq!(compare_values(&json!("900.00"), &json!("1000")), Ordering::Less);
        assert_eq!(compare_values(&json!("Asha"), &json!("Ravi")), Ordering::Less);
        assert_eq!(compare_values(&Value::Null, &json!("a")), Ordering::Less);
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Collection::InsuranceClaims.as_str(), "insurance-claims");
        assert_eq!(
            serde_json::to_string(&Collection::InsuranceClaims).unwrap(),
            "\"insurance-claims\""
        );
    }
}
