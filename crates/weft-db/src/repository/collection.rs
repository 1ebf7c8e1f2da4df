//! # Document Collections
//!
//! Generic CRUD over the `documents` table. A record's `Entity::STORE`
//! names its logical collection; the record itself is stored as a JSON body.
//!
//! ## Two Layers
//! ```text
//! Collection<T>            pool-backed, one statement per call
//!     │
//!     └── collection::insert / get / update / ... (&mut SqliteConnection)
//!             usable inside a transaction by the shipment and lot flows
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::marker::PhantomData;
use tracing::debug;

use weft_core::Entity;

use crate::error::{DbError, DbResult};

/// Typed handle on one store.
#[derive(Debug)]
pub struct Collection<T> {
    pool: SqlitePool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            pool: self.pool.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(pool: SqlitePool) -> Self {
        Collection {
            pool,
            _marker: PhantomData,
        }
    }

    /// Inserts a new record, stamping both timestamps.
    ///
    /// ## Errors
    /// `Duplicate` if the id already exists in this store.
    pub async fn insert(&self, record: &T) -> DbResult<T> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, record).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<T>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, id).await
    }

    /// Like `get`, but `NotFound` when absent.
    pub async fn get_required(&self, id: &str) -> DbResult<T> {
        let mut conn = self.pool.acquire().await?;
        get_required(&mut conn, id).await
    }

    /// All records in creation order.
    pub async fn list(&self) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        list(&mut conn).await
    }

    /// Replaces a record, keeping its original `created_at`.
    pub async fn update(&self, record: &T) -> DbResult<T> {
        let mut conn = self.pool.acquire().await?;
        update(&mut conn, record).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        delete::<T>(&mut conn, id).await
    }

    /// Records whose top-level JSON `field` equals `value`.
    pub async fn find_by(&self, field: &str, value: &str) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        find_by(&mut conn, field, value).await
    }

    /// Inserts or replaces many records in one transaction.
    pub async fn put_batch(&self, records: &[T]) -> DbResult<Vec<T>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(DbError::transaction)?;

        let mut stored = Vec::with_capacity(records.len());
        for record in records {
            stored.push(upsert(&mut tx, record).await?);
        }

        tx.commit()
            .await
            .map_err(DbError::transaction)?;

        debug!(store = T::STORE, count = stored.len(), "Batch stored");
        Ok(stored)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        count::<T>(&mut conn).await
    }
}

// =============================================================================
// Connection-level operations
// =============================================================================

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode<T: Entity>(body: &str) -> DbResult<T> {
    serde_json::from_str(body).map_err(|e| DbError::document(T::STORE, e))
}

/// `json_extract` path for a top-level field. Only `[a-z0-9_]` names are
/// accepted since the path is spliced into the SQL text.
fn json_path(field: &str) -> DbResult<String> {
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if !valid {
        return Err(DbError::InvalidField(field.to_string()));
    }
    Ok(format!("'$.{}'", field))
}

pub async fn insert<T: Entity>(conn: &mut SqliteConnection, record: &T) -> DbResult<T> {
    let now = Utc::now();
    let mut stored = record.clone();
    stored.set_timestamps(now, now);
    let body = serde_json::to_string(&stored).map_err(|e| DbError::document(T::STORE, e))?;

    debug!(store = T::STORE, id = %stored.id(), "Inserting document");

    let result = sqlx::query(
        "INSERT INTO documents (store, id, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
    )
    .bind(T::STORE)
    .bind(stored.id())
    .bind(&body)
    .bind(timestamp(now))
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => Ok(stored),
        Err(e) => match DbError::from(e) {
            err if err.is_duplicate() => Err(DbError::duplicate(T::NAME, stored.id())),
            other => Err(other),
        },
    }
}

pub async fn get<T: Entity>(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<T>> {
    let body: Option<String> =
        sqlx::query_scalar("SELECT body FROM documents WHERE store = ?1 AND id = ?2")
            .bind(T::STORE)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    body.as_deref().map(decode::<T>).transpose()
}

pub async fn get_required<T: Entity>(conn: &mut SqliteConnection, id: &str) -> DbResult<T> {
    get(conn, id)
        .await?
        .ok_or_else(|| DbError::not_found(T::NAME, id))
}

pub async fn exists<T: Entity>(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM documents WHERE store = ?1 AND id = ?2")
            .bind(T::STORE)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

/// `NotFound` unless a record with this id exists.
pub async fn ensure_exists<T: Entity>(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    if exists::<T>(conn, id).await? {
        Ok(())
    } else {
        Err(DbError::not_found(T::NAME, id))
    }
}

pub async fn list<T: Entity>(conn: &mut SqliteConnection) -> DbResult<Vec<T>> {
    let bodies: Vec<String> =
        sqlx::query_scalar("SELECT body FROM documents WHERE store = ?1 ORDER BY created_at, id")
            .bind(T::STORE)
            .fetch_all(&mut *conn)
            .await?;

    bodies.iter().map(|b| decode(b)).collect()
}

pub async fn update<T: Entity>(conn: &mut SqliteConnection, record: &T) -> DbResult<T> {
    let existing: T = get_required(conn, record.id()).await?;
    let now = Utc::now();
    let mut stored = record.clone();
    stored.set_timestamps(existing.created_at(), now);
    let body = serde_json::to_string(&stored).map_err(|e| DbError::document(T::STORE, e))?;

    debug!(store = T::STORE, id = %stored.id(), "Updating document");

    sqlx::query("UPDATE documents SET body = ?3, updated_at = ?4 WHERE store = ?1 AND id = ?2")
        .bind(T::STORE)
        .bind(stored.id())
        .bind(&body)
        .bind(timestamp(now))
        .execute(&mut *conn)
        .await?;

    Ok(stored)
}

/// Inserts the record, or replaces it keeping the stored `created_at`.
pub async fn upsert<T: Entity>(conn: &mut SqliteConnection, record: &T) -> DbResult<T> {
    if exists::<T>(conn, record.id()).await? {
        update(conn, record).await
    } else {
        insert(conn, record).await
    }
}

pub async fn delete<T: Entity>(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    debug!(store = T::STORE, id = %id, "Deleting document");

    let result = sqlx::query("DELETE FROM documents WHERE store = ?1 AND id = ?2")
        .bind(T::STORE)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found(T::NAME, id));
    }
    Ok(())
}

pub async fn find_by<T: Entity>(conn: &mut SqliteConnection, field: &str, value: &str) -> DbResult<Vec<T>> {
    let sql = format!(
        "SELECT body FROM documents WHERE store = ?1 AND json_extract(body, {}) = ?2 ORDER BY created_at, id",
        json_path(field)?
    );
    let bodies: Vec<String> = sqlx::query_scalar(&sql)
        .bind(T::STORE)
        .bind(value)
        .fetch_all(&mut *conn)
        .await?;

    bodies.iter().map(|b| decode(b)).collect()
}

/// Number of records whose top-level `field` equals `value`.
pub async fn count_by<T: Entity>(conn: &mut SqliteConnection, field: &str, value: &str) -> DbResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM documents WHERE store = ?1 AND json_extract(body, {}) = ?2",
        json_path(field)?
    );
    let n: i64 = sqlx::query_scalar(&sql)
        .bind(T::STORE)
        .bind(value)
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

pub async fn count<T: Entity>(conn: &mut SqliteConnection) -> DbResult<i64> {
    let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE store = ?1")
        .bind(T::STORE)
        .fetch_one(&mut *conn)
        .await?;
    Ok(n)
}

// =============================================================================
// Unit Tests
// =============================================================================
