//! In-memory document store
//!
//! Backs the engine in tests and when the API runs without a database. A
//! single write lock around all collections makes every commit atomic.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::sequence::{EntityType, NumberSequence};
use crate::store::{Collection, DocumentQuery, DocumentStore, StoredDocument, Write, WriteBatch};

// BTreeMap keyed by v7 ids keeps documents in creation order
type Documents = HashMap<Collection, BTreeMap<Uuid, StoredDocument>>;

/// Document store held entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<Documents>,
    sequences: Mutex<HashMap<EntityType, NumberSequence>>,
    fail_next_commit: AtomicBool,
    unavailable: AtomicBool,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next commit fail as unavailable without applying anything
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Simulates the store going down (or coming back)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: Collection) -> usize {
        self.documents
            .read()
            .await
            .get(&collection)
            .map_or(0, BTreeMap::len)
    }

    fn ensure_available(&self) -> Result<(), PortError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PortError::ServiceUnavailable {
                service: "in-memory document store".to_string(),
            });
        }
        Ok(())
    }
}

impl DomainPort for InMemoryDocumentStore {}

#[async_trait]
impl HealthCheckable for InMemoryDocumentStore {
    async fn health_check(&self) -> HealthCheckResult {
        let status = if self.unavailable.load(Ordering::SeqCst) {
            AdapterHealth::Unhealthy
        } else {
            AdapterHealth::Healthy
        };
        HealthCheckResult {
            adapter_id: "in-memory-document-store".to_string(),
            status,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, PortError> {
        self.ensure_available()?;
        Ok(self
            .documents
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.get(&id))
            .cloned())
    }

    async fn query(&self, query: &DocumentQuery) -> Result<Vec<StoredDocument>, PortError> {
        self.ensure_available()?;
        let documents = self.documents.read().await;
        let matching = documents
            .get(&query.collection)
            .map(|docs| {
                docs.values()
                    .filter(|doc| query.matches(&doc.body))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(query.arrange(matching))
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), PortError> {
        self.ensure_available()?;
        let mut documents = self.documents.write().await;

        if self.fail_next_commit.swap(false, Ordering::SeqCst) {
            return Err(PortError::ServiceUnavailable {
                service: "in-memory document store".to_string(),
            });
        }

        // Validate the whole batch before touching anything
        let mut pending: HashMap<(Collection, Uuid), u64> = HashMap::new();
        for write in &batch.writes {
            let key = (write.collection(), write.id());
            let current = pending.get(&key).copied().or_else(|| {
                documents
                    .get(&key.0)
                    .and_then(|docs| docs.get(&key.1))
                    .map(|doc| doc.version)
            });

            let next = match (write, current) {
                (Write::Insert { .. }, None) => 1,
                (Write::Insert { collection, id, .. }, Some(_)) => {
                    return Err(PortError::conflict(format!(
                        "{} document {} already exists",
                        collection, id
                    )));
                }
                (Write::Update { expected_version, .. }, Some(version))
                    if *expected_version == version =>
                {
                    version + 1
                }
                (Write::Update { collection, id, expected_version, .. }, Some(version)) => {
                    return Err(PortError::conflict(format!(
                        "{} document {} is at version {}, expected {}",
                        collection, id, version, expected_version
                    )));
                }
                (Write::Update { collection, id, .. }, None) => {
                    return Err(PortError::not_found(collection.as_str(), id));
                }
            };
            pending.insert(key, next);
        }

        let count = batch.writes.len();
        for write in batch.writes {
            let (collection, id, body) = match write {
                Write::Insert { collection, id, body }
                | Write::Update {
                    collection,
                    id,
                    body,
                    ..
                } => (collection, id, body),
            };
            let docs = documents.entry(collection).or_default();
            let version = docs.get(&id).map_or(1, |doc| doc.version + 1);
            docs.insert(id, StoredDocument { id, version, body });
        }

        debug!(writes = count, "Committed batch");
        Ok(())
    }

    async fn next_sequence_value(&self, entity: EntityType) -> Result<NumberSequence, PortError> {
        self.ensure_available()?;
        let mut sequences = self.sequences.lock().await;
        let now = Utc::now();
        let sequence = sequences
            .entry(entity)
            .or_insert_with(|| NumberSequence::start(entity, now));
        sequence.advance(now);
        Ok(sequence.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn insert(id: Uuid, body: serde_json::Value) -> Write {
        Write::Insert {
            collection: Collection::Invoices,
            id,
            body,
        }
    }

    #[tokio::test]
    async fn test_insert_then_update_bumps_version() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::now_v7();

        store
            .commit(WriteBatch { writes: vec![insert(id, json!({"n": 1}))] })
            .await
            .unwrap();
        store
            .commit(WriteBatch {
                writes: vec![Write::Update {
                    collection: Collection::Invoices,
                    id,
                    expected_version: 1,
                    body: json!({"n": 2}),
                }],
            })
            .await
            .unwrap();

        let doc = store.get(Collection::Invoices, id).await.unwrap().unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.body, json!({"n": 2}));
    }

    #[tokio::test]
    async fn test_stale_update_rejects_whole_batch() {
        let store = InMemoryDocumentStore::new();
        let existing = Uuid::now_v7();
        store
            .commit(WriteBatch { writes: vec![insert(existing, json!({}))] })
            .await
            .unwrap();

        let fresh = Uuid::now_v7();
        let result = store
            .commit(WriteBatch {
                writes: vec![
                    insert(fresh, json!({})),
                    Write::Update {
                        collection: Collection::Invoices,
                        id: existing,
                        expected_version: 7,
                        body: json!({}),
                    },
                ],
            })
            .await;

        assert!(result.unwrap_err().is_conflict());
        assert!(store.get(Collection::Invoices, fresh).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_conflicts() {
        let store = InMemoryDocumentStore::new();
        let id = Uuid::now_v7();
        store
            .commit(WriteBatch { writes: vec![insert(id, json!({}))] })
            .await
            .unwrap();
        let err = store
            .commit(WriteBatch { writes: vec![insert(id, json!({}))] })
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_commit();
        let err = store
            .commit(WriteBatch { writes: vec![insert(Uuid::now_v7(), json!({}))] })
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.count(Collection::Invoices).await, 0);

        store.set_unavailable(true);
        assert!(store.next_sequence_value(EntityType::Invoice).await.is_err());
        assert_eq!(
            store.health_check().await.status,
            AdapterHealth::Unhealthy
        );
    }

    #[tokio::test]
    async fn test_sequences_start_at_one_per_entity() {
        let store = InMemoryDocumentStore::new();
        let next = |entity| store.next_sequence_value(entity);
        assert_eq!(next(EntityType::Quotation).await.unwrap().current_number, 1);
        assert_eq!(next(EntityType::Quotation).await.unwrap().current_number, 2);
        assert_eq!(next(EntityType::Invoice).await.unwrap().current_number, 1);
    }
}
