//! PostgreSQL Document Store Adapter
//!
//! Implements the billing engine's `DocumentStore` port on two tables:
//!
//! - `documents (collection, id, version, body JSONB)` holds every aggregate
//! - `number_sequences (entity_type, prefix, current_number, last_updated)`
//!   holds one counter per numbered document type
//!
//! Equality filters are pushed down as JSONB containment (`body @> filter`).
//! Ordering and limits are applied by the shared [`DocumentQuery::arrange`]
//! so both store adapters order results the same way.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use infra_db::{create_pool, DatabaseConfig, PostgresDocumentStore};
//! use domain_billing::DocumentStore;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/clinic")).await?;
//! let store: Arc<dyn DocumentStore> = Arc::new(PostgresDocumentStore::new(pool));
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_billing::{
    Collection, DocumentQuery, DocumentStore, EntityType, NumberSequence, StoredDocument, Write,
    WriteBatch,
};

use crate::error::DatabaseError;

const ADAPTER_ID: &str = "postgres-document-store";

/// PostgreSQL-backed implementation of the `DocumentStore` port
///
/// # Concurrency
///
/// Updates are compare-and-swap on the `version` column, so a writer that
/// read a stale version loses with `PortError::Conflict` and the engine's
/// retry loop takes over. Sequence increments are a single upsert, which
/// PostgreSQL serializes on the counter row.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl DomainPort for PostgresDocumentStore {}

#[async_trait]
impl HealthCheckable for PostgresDocumentStore {
    /// Runs `SELECT 1` against the pool and reports the round-trip time
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => {
                warn!(error = %e, "Document store health check failed");
                HealthCheckResult {
                    adapter_id: ADAPTER_ID.to_string(),
                    status: AdapterHealth::Unhealthy,
                    latency_ms,
                    message: Some(format!("Database error: {}", e)),
                    checked_at: Utc::now(),
                }
            }
        }
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self), fields(collection = %collection, id = %id))]
    async fn get(
        &self,
        collection: Collection,
        id: Uuid,
    ) -> Result<Option<StoredDocument>, PortError> {
        let row = sqlx::query(
            "SELECT id, version, body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        row.map(|row| row_to_document(&row)).transpose()
    }

    #[instrument(
        skip(self, query),
        fields(collection = %query.collection, filters = query.filters.len())
    )]
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<StoredDocument>, PortError> {
        let rows = sqlx::query(
            "SELECT id, version, body FROM documents \
             WHERE collection = $1 AND body @> $2 \
             ORDER BY created_at, id",
        )
        .bind(query.collection.as_str())
        .bind(query.filter_object())
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let documents = rows
            .iter()
            .map(row_to_document)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(matched = documents.len(), "Document query complete");
        Ok(query.arrange(documents))
    }

    #[instrument(skip(self, batch), fields(writes = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<(), PortError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;

        // Returning early drops `tx`, which rolls the whole batch back
        for write in &batch.writes {
            match write {
                Write::Insert { collection, id, body } => {
                    let inserted = sqlx::query(
                        "INSERT INTO documents (collection, id, version, body) \
                         VALUES ($1, $2, 1, $3) \
                         ON CONFLICT (collection, id) DO NOTHING",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .bind(body)
                    .execute(&mut *tx)
                    .await
                    .map_err(DatabaseError::from)?
                    .rows_affected();

                    if inserted == 0 {
                        return Err(DatabaseError::duplicate(collection.as_str(), "id", id).into());
                    }
                }
                Write::Update { collection, id, expected_version, body } => {
                    let expected = to_db_version(*expected_version)?;
                    let updated = sqlx::query(
                        "UPDATE documents \
                         SET body = $4, version = version + 1, updated_at = now() \
                         WHERE collection = $1 AND id = $2 AND version = $3",
                    )
                    .bind(collection.as_str())
                    .bind(id)
                    .bind(expected)
                    .bind(body)
                    .execute(&mut *tx)
                    .await
                    .map_err(DatabaseError::from)?
                    .rows_affected();

                    if updated == 0 {
                        let current = sqlx::query_scalar::<_, i64>(
                            "SELECT version FROM documents WHERE collection = $1 AND id = $2",
                        )
                        .bind(collection.as_str())
                        .bind(id)
                        .fetch_optional(&mut *tx)
                        .await
                        .map_err(DatabaseError::from)?;

                        return Err(match current {
                            Some(version) => DatabaseError::VersionConflict(format!(
                                "{} document {} is at version {}, expected {}",
                                collection, id, version, expected_version
                            ))
                            .into(),
                            None => PortError::not_found(collection.as_str(), id),
                        });
                    }
                }
            }
        }

        tx.commit().await.map_err(DatabaseError::from)?;
        debug!("Committed batch");
        Ok(())
    }

    #[instrument(skip(self), fields(entity = %entity))]
    async fn next_sequence_value(&self, entity: EntityType) -> Result<NumberSequence, PortError> {
        let row = sqlx::query(
            "INSERT INTO number_sequences (entity_type, prefix, current_number, last_updated) \
             VALUES ($1, $2, 1, now()) \
             ON CONFLICT (entity_type) DO UPDATE \
             SET current_number = number_sequences.current_number + 1, last_updated = now() \
             RETURNING current_number, last_updated",
        )
        .bind(entity.as_str())
        .bind(entity.prefix())
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let current: i64 = row.try_get("current_number").map_err(DatabaseError::from)?;
        let last_updated: DateTime<Utc> = row.try_get("last_updated").map_err(DatabaseError::from)?;

        Ok(NumberSequence {
            entity_type: entity,
            prefix: entity.prefix().to_string(),
            current_number: from_db_version(current)?,
            last_updated,
        })
    }
}

fn row_to_document(row: &PgRow) -> Result<StoredDocument, PortError> {
    let id: Uuid = row.try_get("id").map_err(DatabaseError::from)?;
    let version: i64 = row.try_get("version").map_err(DatabaseError::from)?;
    let body: Value = row.try_get("body").map_err(DatabaseError::from)?;
    Ok(StoredDocument {
        id,
        version: from_db_version(version)?,
        body,
    })
}

/// BIGINT column values are never negative (enforced by CHECK constraints)
fn from_db_version(raw: i64) -> Result<u64, PortError> {
    u64::try_from(raw).map_err(|_| {
        DatabaseError::SerializationError(format!("negative counter {} in database", raw)).into()
    })
}

fn to_db_version(version: u64) -> Result<i64, PortError> {
    i64::try_from(version).map_err(|_| {
        DatabaseError::SerializationError(format!("version {} exceeds BIGINT", version)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conversion_rejects_out_of_range() {
        assert_eq!(from_db_version(7).unwrap(), 7);
        assert!(matches!(
            from_db_version(-1),
            Err(PortError::Transformation { .. })
        ));
        assert_eq!(to_db_version(3).unwrap(), 3);
        assert!(to_db_version(u64::MAX).is_err());
    }
}
